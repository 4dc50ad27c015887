use crate::{policies::CategoricalPolicy, tensors::Logp};
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::ops::log_softmax;
use rand::{Rng, distr::Distribution, distr::weighted::WeightedIndex, rngs::StdRng};
use reinforce_core::policies::{ActionSelector, Selection};

/// How an action is picked when the selector does not explore.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Exploitation {
    /// Draw from the softmax of the logits
    #[default]
    Sample,
    /// Take the most likely action
    Greedy,
}

/// With probability `exploration_rate` a uniformly random action is played, otherwise the
/// policy decides according to `exploitation`. The log probability is always that of the
/// played action under the policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct EpsilonGreedy {
    pub exploitation: Exploitation,
}

impl EpsilonGreedy {
    pub fn new(exploitation: Exploitation) -> Self {
        Self { exploitation }
    }
}

impl<P: CategoricalPolicy> ActionSelector<P, Tensor> for EpsilonGreedy {
    type Action = usize;
    type Hidden = Tensor;

    fn select(
        &mut self,
        policy: &P,
        state: &Tensor,
        hidden: Option<Tensor>,
        recurrent: bool,
        exploration_rate: f32,
        rng: &mut StdRng,
    ) -> Result<Selection<usize, Logp, Tensor>> {
        let hidden = if recurrent { hidden } else { None };
        let (logits, next_hidden) = policy.logits(state, hidden.as_ref())?;
        let log_probs = log_softmax(&logits, 0)?;
        let action = if rng.random::<f32>() < exploration_rate {
            rng.random_range(0..policy.action_size())
        } else {
            match self.exploitation {
                Exploitation::Sample => {
                    let action_probs: Vec<f32> = log_probs.exp()?.to_vec1()?;
                    WeightedIndex::new(&action_probs)?.sample(rng)
                }
                Exploitation::Greedy => log_probs.argmax(0)?.to_scalar::<u32>()? as usize,
            }
        };
        Ok(Selection {
            action,
            log_prob: Logp(log_probs.get(action)?),
            hidden: next_hidden.filter(|_| recurrent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{gru::GruPolicy, mlp::MlpPolicy};
    use candle_core::Device;
    use reinforce_core::rng::seeded_rng;

    #[test]
    fn greedy_without_exploration_is_deterministic() -> Result<()> {
        let device = Device::Cpu;
        let policy = MlpPolicy::build(2, &[8], 5, 0., &device)?;
        let state = Tensor::new(&[0.3f32, 0.7], &device)?;
        let mut selector = EpsilonGreedy::new(Exploitation::Greedy);
        let mut rng = seeded_rng(1);
        let (logits, _) = policy.logits(&state, None)?;
        let best = logits.argmax(0)?.to_scalar::<u32>()? as usize;
        for _ in 0..10 {
            let selection = selector.select(&policy, &state, None, false, 0., &mut rng)?;
            assert_eq!(selection.action, best);
            assert!(selection.log_prob.to_scalar::<f32>()? <= 0.);
        }
        Ok(())
    }

    #[test]
    fn full_exploration_covers_the_action_space() -> Result<()> {
        let device = Device::Cpu;
        let policy = MlpPolicy::build(2, &[8], 3, 0., &device)?;
        let state = Tensor::new(&[0.3f32, 0.7], &device)?;
        let mut selector = EpsilonGreedy::new(Exploitation::Greedy);
        let mut rng = seeded_rng(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let selection = selector.select(&policy, &state, None, false, 1., &mut rng)?;
            seen[selection.action] = true;
        }
        assert!(seen.iter().all(|s| *s));
        Ok(())
    }

    #[test]
    fn same_seed_same_actions() -> Result<()> {
        let device = Device::Cpu;
        let policy = MlpPolicy::build(2, &[8], 4, 0., &device)?;
        let state = Tensor::new(&[0.3f32, 0.7], &device)?;
        let mut selector = EpsilonGreedy::default();
        let mut play = |seed| -> Result<Vec<usize>> {
            let mut rng = seeded_rng(seed);
            (0..20)
                .map(|_| Ok(selector.select(&policy, &state, None, false, 0.3, &mut rng)?.action))
                .collect()
        };
        assert_eq!(play(3)?, play(3)?);
        Ok(())
    }

    #[test]
    fn hidden_state_only_when_recurrent() -> Result<()> {
        let device = Device::Cpu;
        let policy = GruPolicy::build(2, 4, 2, &device)?;
        let state = Tensor::new(&[0.3f32, 0.7], &device)?;
        let mut selector = EpsilonGreedy::default();
        let mut rng = seeded_rng(0);
        let selection = selector.select(&policy, &state, None, true, 0., &mut rng)?;
        assert!(selection.hidden.is_some());
        let selection = selector.select(&policy, &state, selection.hidden, false, 0., &mut rng)?;
        assert!(selection.hidden.is_none());
        Ok(())
    }
}
