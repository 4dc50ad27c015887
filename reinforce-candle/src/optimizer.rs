use crate::tensors::PolicyLoss;
use anyhow::{Context, Result};
use candle_core::{Tensor, backprop::GradStore};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use reinforce_core::policies::{OptimizerParams, PolicyOptimizer};
use std::fmt::Debug;

/// Backpropagates `loss` and rescales the gradients so that their global norm stays at or
/// below `max_norm`.
pub fn clip_grad(loss: &Tensor, varmap: &VarMap, max_norm: f32) -> candle_core::Result<GradStore> {
    let mut grad_store = loss.backward()?;
    let all_vars = varmap.all_vars();
    let mut total_norm_squared = 0f32;
    for var in all_vars.iter() {
        if let Some(grad) = grad_store.get(var.as_tensor()) {
            total_norm_squared += grad.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    let total_norm = total_norm_squared.sqrt();
    if total_norm > max_norm {
        let clip_coef = max_norm as f64 / (total_norm as f64 + 1e-6);
        for var in all_vars.iter() {
            if let Some(grad) = grad_store.remove(var.as_tensor()) {
                grad_store.insert(var.as_tensor(), grad.affine(clip_coef, 0.)?);
            }
        }
    }
    Ok(grad_store)
}

pub struct AdamWOptimizer {
    pub optimizer: AdamW,
    pub max_grad_norm: Option<f32>,
    varmap: VarMap,
    grads: Option<GradStore>,
}

impl Debug for AdamWOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdamWOptimizer")
            .field("learning_rate", &self.optimizer.learning_rate())
            .field("max_grad_norm", &self.max_grad_norm)
            .finish()
    }
}

impl AdamWOptimizer {
    pub fn new(varmap: &VarMap, params: &OptimizerParams) -> Result<Self> {
        let optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: params.learning_rate,
                weight_decay: params.weight_decay,
                ..Default::default()
            },
        )?;
        Ok(Self {
            optimizer,
            max_grad_norm: params.max_grad_norm,
            varmap: varmap.clone(),
            grads: None,
        })
    }
}

impl PolicyOptimizer for AdamWOptimizer {
    type Loss = PolicyLoss;

    fn zero_grad(&mut self) -> Result<()> {
        self.grads = None;
        Ok(())
    }

    fn backward(&mut self, loss: &PolicyLoss) -> Result<()> {
        let grads = match self.max_grad_norm {
            Some(max_norm) => clip_grad(loss, &self.varmap, max_norm)?,
            None => loss.backward()?,
        };
        self.grads = Some(grads);
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        let grads = self
            .grads
            .take()
            .context("optimizer step requested before a backward pass")?;
        self.optimizer.step(&grads)?;
        Ok(())
    }
}
