use super::{CategoricalPolicy, build_linears};
use crate::{optimizer::AdamWOptimizer, tensors::Logp};
use anyhow::{Result, ensure};
use candle_core::{DType, Device, Module, ModuleT, Tensor};
use candle_nn::{Dropout, Linear, VarBuilder, VarMap};
use reinforce_core::policies::{OptimizerParams, Policy};

/// Feed forward policy: relu hidden layers, optionally followed by dropout, and a linear
/// output layer with one logit per action.
pub struct MlpPolicy {
    layers: Vec<Linear>,
    dropout: Option<Dropout>,
    varmap: VarMap,
    action_size: usize,
    training: bool,
}

impl MlpPolicy {
    pub fn build(
        observation_size: usize,
        hidden_layers: &[usize],
        action_size: usize,
        dropout: f32,
        device: &Device,
    ) -> Result<Self> {
        ensure!(
            (0. ..1.).contains(&dropout),
            "dropout probability must be in [0, 1), got {dropout}"
        );
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let mut layer_sizes = hidden_layers.to_vec();
        layer_sizes.push(action_size);
        let layers = build_linears(observation_size, &layer_sizes, &vb, "policy")?;
        Ok(Self {
            layers,
            dropout: (dropout > 0.).then(|| Dropout::new(dropout)),
            varmap,
            action_size,
            training: true,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();
        let last_layer = self.layers.len() - 1;
        for (layer_idx, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if layer_idx == last_layer {
                break;
            }
            xs = xs.relu()?;
            if let Some(dropout) = &self.dropout {
                xs = dropout.forward_t(&xs, self.training)?;
            }
        }
        Ok(xs)
    }
}

impl Policy for MlpPolicy {
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

impl CategoricalPolicy for MlpPolicy {
    fn action_size(&self) -> usize {
        self.action_size
    }

    fn logits(&self, state: &Tensor, _hidden: Option<&Tensor>) -> Result<(Tensor, Option<Tensor>)> {
        let observation = state.to_dtype(DType::F32)?.flatten_all()?.unsqueeze(0)?;
        let logits = self.forward(&observation)?.squeeze(0)?;
        Ok((logits, None))
    }

    fn varmap(&self) -> &VarMap {
        &self.varmap
    }
}
