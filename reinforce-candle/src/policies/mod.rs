pub mod gru;
pub mod mlp;

use crate::{optimizer::AdamWOptimizer, tensors::Logp};
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{Linear, VarBuilder, VarMap, linear};
use gru::GruPolicy;
use mlp::MlpPolicy;
use reinforce_core::policies::{OptimizerParams, Policy};

/// A policy over a discrete action space.
pub trait CategoricalPolicy: Policy<LogProb = Logp, Optimizer = AdamWOptimizer> {
    fn action_size(&self) -> usize;

    /// Unnormalized action scores for a single, flattened state. Recurrent policies also return
    /// their next hidden state.
    fn logits(&self, state: &Tensor, hidden: Option<&Tensor>) -> Result<(Tensor, Option<Tensor>)>;

    fn varmap(&self) -> &VarMap;
}

pub fn build_linears(
    input_dim: usize,
    layers: &[usize],
    vb: &VarBuilder,
    prefix: &str,
) -> Result<Vec<Linear>> {
    let mut last_dim = input_dim;
    let mut linears = Vec::with_capacity(layers.len());
    for (layer_idx, layer_size) in layers.iter().enumerate() {
        linears.push(linear(last_dim, *layer_size, vb.pp(format!("{prefix}{layer_idx}")))?);
        last_dim = *layer_size;
    }
    Ok(linears)
}

// NOTE: two variants, a hand written match is less noise than enum_dispatch here
pub enum PolicyKind {
    Mlp(MlpPolicy),
    Gru(GruPolicy),
}

impl Policy for PolicyKind {
    type LogProb = Logp;
    type Optimizer = AdamWOptimizer;

    fn set_training(&mut self, training: bool) {
        match self {
            Self::Mlp(policy) => policy.set_training(training),
            Self::Gru(policy) => policy.set_training(training),
        }
    }

    fn is_training(&self) -> bool {
        match self {
            Self::Mlp(policy) => policy.is_training(),
            Self::Gru(policy) => policy.is_training(),
        }
    }

    fn build_optimizer(&self, params: &OptimizerParams) -> Result<AdamWOptimizer> {
        match self {
            Self::Mlp(policy) => policy.build_optimizer(params),
            Self::Gru(policy) => policy.build_optimizer(params),
        }
    }
}

impl CategoricalPolicy for PolicyKind {
    fn action_size(&self) -> usize {
        match self {
            Self::Mlp(policy) => policy.action_size(),
            Self::Gru(policy) => policy.action_size(),
        }
    }

    fn logits(&self, state: &Tensor, hidden: Option<&Tensor>) -> Result<(Tensor, Option<Tensor>)> {
        match self {
            Self::Mlp(policy) => policy.logits(state, hidden),
            Self::Gru(policy) => policy.logits(state, hidden),
        }
    }

    fn varmap(&self) -> &VarMap {
        match self {
            Self::Mlp(policy) => policy.varmap(),
            Self::Gru(policy) => policy.varmap(),
        }
    }
}
