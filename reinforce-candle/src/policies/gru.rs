use super::CategoricalPolicy;
use crate::{optimizer::AdamWOptimizer, tensors::Logp};
use anyhow::Result;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{
    Linear, VarBuilder, VarMap, linear,
    rnn::{GRU, GRUConfig, GRUState, RNN, gru},
};
use reinforce_core::policies::{OptimizerParams, Policy};

/// Single GRU cell followed by a linear head. The hidden state is threaded through the steps
/// of a rollout by the action selector.
pub struct GruPolicy {
    gru: GRU,
    head: Linear,
    varmap: VarMap,
    action_size: usize,
    training: bool,
}

impl GruPolicy {
    pub fn build(
        observation_size: usize,
        hidden_size: usize,
        action_size: usize,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let gru = gru(
            observation_size,
            hidden_size,
            GRUConfig::default(),
            vb.pp("gru"),
        )?;
        let head = linear(hidden_size, action_size, vb.pp("head"))?;
        Ok(Self {
            gru,
            head,
            varmap,
            action_size,
            training: true,
        })
    }
}

impl Policy for GruPolicy {
    type LogProb = Logp;
    type Optimizer = AdamWOptimizer;

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn build_optimizer(&self, params: &OptimizerParams) -> Result<AdamWOptimizer> {
        AdamWOptimizer::new(&self.varmap, params)
    }
}

impl CategoricalPolicy for GruPolicy {
    fn action_size(&self) -> usize {
        self.action_size
    }

    fn logits(&self, state: &Tensor, hidden: Option<&Tensor>) -> Result<(Tensor, Option<Tensor>)> {
        let input = state.to_dtype(DType::F32)?.flatten_all()?.unsqueeze(0)?;
        let hidden = match hidden {
            Some(h) => GRUState { h: h.clone() },
            None => self.gru.zero_state(1)?,
        };
        let next = self.gru.step(&input, &hidden)?;
        let logits = self.head.forward(&next.h)?.squeeze(0)?;
        Ok((logits, Some(next.h)))
    }

    fn varmap(&self) -> &VarMap {
        &self.varmap
    }
}
