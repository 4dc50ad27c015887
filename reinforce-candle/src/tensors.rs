use anyhow::Result;
use candle_core::Tensor;
use derive_more::{Deref, DerefMut, Display};
use reinforce_core::policies::LogProb;

/// Log probability of a single action, still attached to the graph of the policy.
#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct Logp(pub Tensor);

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct PolicyLoss(pub Tensor);

impl LogProb for Logp {
    type Loss = PolicyLoss;

    fn negative_weighted_sum(log_probs: &[Self], weights: &[f32]) -> Result<PolicyLoss> {
        let log_probs = log_probs
            .iter()
            .map(|logp| logp.flatten_all())
            .collect::<candle_core::Result<Vec<_>>>()?;
        let log_probs = Tensor::cat(&log_probs, 0)?;
        let weights = Tensor::from_slice(weights, weights.len(), log_probs.device())?
            .to_dtype(log_probs.dtype())?;
        let loss = log_probs.mul(&weights)?.neg()?.sum_all()?;
        Ok(PolicyLoss(loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use reinforce_core::utils::loss::policy_gradient_loss;

    #[test]
    fn matches_scalar_loss() -> Result<()> {
        let device = Device::Cpu;
        let rewards = [1., 0., 3., 2.];
        let raw = [-0.1f32, -1.2, -0.7, -2.];
        let log_probs = raw
            .iter()
            .map(|x| Ok(Logp(Tensor::new(*x, &device)?)))
            .collect::<Result<Vec<_>>>()?;
        let tensor_loss = policy_gradient_loss(&rewards, &log_probs)?;
        let scalar_loss = policy_gradient_loss(&rewards, &raw)?;
        assert!((tensor_loss.to_scalar::<f32>()? - scalar_loss).abs() < 1e-5);
        Ok(())
    }
}
