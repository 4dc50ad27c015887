use super::returns::normalize_returns;
use crate::policies::LogProb;
use anyhow::{Result, ensure};

/// REINFORCE loss of a single trajectory: `-sum_i(logp_i * normalized_reward_i)`.
///
/// The terms are summed, not averaged, so longer trajectories carry proportionally more
/// signal.
pub fn policy_gradient_loss<L: LogProb>(rewards: &[f32], log_probs: &[L]) -> Result<L::Loss> {
    ensure!(
        rewards.len() == log_probs.len(),
        "got {} rewards but {} log probabilities",
        rewards.len(),
        log_probs.len()
    );
    ensure!(!rewards.is_empty(), "cannot build a policy loss from an empty trajectory");
    let normalized = normalize_returns(rewards);
    L::negative_weighted_sum(log_probs, &normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negates_weighted_log_probs() -> Result<()> {
        // rewards [0, 2] normalize to roughly [-1/sqrt(2), 1/sqrt(2)]
        let loss = policy_gradient_loss(&[0., 2.], &[-1., -0.5f32])?;
        let w = 1. / 2f32.sqrt();
        let expected = -(-1. * -w + -0.5 * w);
        assert!((loss - expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn loss_grows_with_trajectory_length() -> Result<()> {
        let short = policy_gradient_loss(&[0., 1.], &[-1., 0.])?;
        let long = policy_gradient_loss(&[0., 1., 0., 1.], &[-1., 0., -1., 0.])?;
        assert!(long.abs() > short.abs());
        Ok(())
    }

    #[test]
    fn rejects_mismatched_or_empty_input() {
        assert!(policy_gradient_loss(&[1., 2.], &[0.5f32]).is_err());
        assert!(policy_gradient_loss::<f32>(&[], &[]).is_err());
    }
}
