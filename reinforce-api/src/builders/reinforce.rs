use anyhow::Result;
use candle_core::{Device, Tensor};
use derive_more::{Deref, DerefMut};
use reinforce_candle::{
    policies::{PolicyKind, gru::GruPolicy, mlp::MlpPolicy},
    selector::{EpsilonGreedy, Exploitation},
};
use reinforce_core::{
    config::ReinforceConfig,
    env::{Env, EnvironmentDescription},
    reinforce::Reinforce,
};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyType {
    Mlp { hidden_layers: Vec<usize>, dropout: f32 },
    Gru { hidden_size: usize },
}

impl Default for PolicyType {
    fn default() -> Self {
        Self::Mlp {
            hidden_layers: vec![64, 64],
            dropout: 0.,
        }
    }
}

impl PolicyType {
    pub fn build(&self, description: &EnvironmentDescription, device: &Device) -> Result<PolicyKind> {
        let EnvironmentDescription {
            observation_size,
            action_size,
        } = *description;
        match self {
            Self::Mlp {
                hidden_layers,
                dropout,
            } => Ok(PolicyKind::Mlp(MlpPolicy::build(
                observation_size,
                hidden_layers,
                action_size,
                *dropout,
                device,
            )?)),
            Self::Gru { hidden_size } => Ok(PolicyKind::Gru(GruPolicy::build(
                observation_size,
                *hidden_size,
                action_size,
                device,
            )?)),
        }
    }
}

pub type CandleReinforce<E, V = E> = Reinforce<PolicyKind, EpsilonGreedy, E, V>;

/// Wires a categorical candle policy and an epsilon greedy selector into `Reinforce`. Derefs
/// to the `ReinforceConfig`, so hyperparameters can be set directly on the builder.
#[derive(Deref, DerefMut, Debug, Clone)]
pub struct ReinforceBuilder {
    #[deref]
    #[deref_mut]
    pub config: ReinforceConfig,
    pub device: Device,
    pub policy_type: PolicyType,
    pub exploitation: Exploitation,
}

impl Default for ReinforceBuilder {
    fn default() -> Self {
        Self::from_config(ReinforceConfig::default())
    }
}

impl ReinforceBuilder {
    pub fn from_config(config: ReinforceConfig) -> Self {
        Self {
            config,
            device: Device::Cpu,
            policy_type: PolicyType::default(),
            exploitation: Exploitation::default(),
        }
    }

    pub fn set_policy_type(&mut self, policy_type: PolicyType) -> &mut Self {
        self.policy_type = policy_type;
        self
    }

    pub fn build<E: Env<State = Tensor, Action = usize>>(
        &self,
        env: E,
        description: &EnvironmentDescription,
    ) -> Result<CandleReinforce<E>> {
        if matches!(self.policy_type, PolicyType::Gru { .. }) && !self.config.recurrent {
            warn!("recurrent policy built with `recurrent` disabled, hidden state will be dropped");
        }
        let policy = self.policy_type.build(description, &self.device)?;
        let selector = EpsilonGreedy::new(self.exploitation);
        Reinforce::new(self.config.clone(), policy, selector, env)
    }

    pub fn build_with_validation<E, V>(
        &self,
        env: E,
        validation_env: V,
        description: &EnvironmentDescription,
    ) -> Result<CandleReinforce<E, V>>
    where
        E: Env<State = Tensor, Action = usize>,
        V: Env<State = Tensor, Action = usize>,
    {
        self.build(env, description)?
            .with_validation_env(validation_env)
    }
}
