use crate::{
    env::{Env, SnapShot},
    exploration::ExplorationSchedule,
    policies::{ActionSelector, Policy, Selection},
};
use anyhow::Result;
use rand::rngs::StdRng;

/// The recorded steps of one rollout. The terminal transition is never part of it, so the
/// three vectors always have the same length.
#[derive(Debug)]
pub struct Trajectory<A, L> {
    pub actions: Vec<A>,
    pub rewards: Vec<f32>,
    pub log_probs: Vec<L>,
}

impl<A, L> Default for Trajectory<A, L> {
    fn default() -> Self {
        Self {
            actions: vec![],
            rewards: vec![],
            log_probs: vec![],
        }
    }
}

impl<A, L> Trajectory<A, L> {
    pub fn push_step(&mut self, action: A, reward: f32, log_prob: L) {
        self.actions.push(action);
        self.rewards.push(reward);
        self.log_probs.push(log_prob);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

pub struct RolloutState<S, H> {
    pub state: S,
    pub hidden: Option<H>,
}

pub struct RolloutOutcome<S, A, L, H> {
    pub trajectory: Trajectory<A, L>,
    pub state: S,
    pub hidden: Option<H>,
    /// `false` when the step budget ran out before the environment terminated
    pub done: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RolloutExecutor {
    pub max_episode_length: usize,
    pub recurrent: bool,
}

impl RolloutExecutor {
    pub fn new(max_episode_length: usize, recurrent: bool) -> Self {
        Self {
            max_episode_length,
            recurrent,
        }
    }

    /// Steps `env` until it terminates or `max_episode_length` steps were taken. Exploration
    /// decays once per recorded step.
    pub fn run<P, S, E>(
        &self,
        policy: &P,
        selector: &mut S,
        env: &mut E,
        schedule: &mut ExplorationSchedule,
        rng: &mut StdRng,
        start: RolloutState<E::State, S::Hidden>,
    ) -> Result<RolloutOutcome<E::State, E::Action, P::LogProb, S::Hidden>>
    where
        P: Policy,
        E: Env,
        S: ActionSelector<P, E::State, Action = E::Action>,
    {
        let RolloutState { mut state, mut hidden } = start;
        let mut trajectory = Trajectory::default();
        let mut done = false;
        for _ in 0..self.max_episode_length {
            let Selection {
                action,
                log_prob,
                hidden: next_hidden,
            } = selector.select(
                policy,
                &state,
                hidden.take(),
                self.recurrent,
                schedule.rate(),
                rng,
            )?;
            hidden = next_hidden;
            let SnapShot {
                state: next_state,
                reward,
                done: terminated,
            } = env.step(&action)?;
            state = next_state;
            if terminated {
                done = true;
                break;
            }
            trajectory.push_step(action, reward, log_prob);
            schedule.decay();
        }
        Ok(RolloutOutcome {
            trajectory,
            state,
            hidden,
            done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        policies::{OptimizerParams, PolicyOptimizer},
        rng::seeded_rng,
    };

    struct NoopOptimizer;

    impl PolicyOptimizer for NoopOptimizer {
        type Loss = f32;

        fn zero_grad(&mut self) -> Result<()> {
            Ok(())
        }

        fn backward(&mut self, _loss: &f32) -> Result<()> {
            Ok(())
        }

        fn step(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct NoopPolicy;

    impl Policy for NoopPolicy {
        type LogProb = f32;
        type Optimizer = NoopOptimizer;

        fn set_training(&mut self, _training: bool) {}

        fn is_training(&self) -> bool {
            true
        }

        fn build_optimizer(&self, _params: &OptimizerParams) -> Result<NoopOptimizer> {
            Ok(NoopOptimizer)
        }
    }

    /// Counts up the hidden state it is handed and remembers every value it saw.
    #[derive(Default)]
    struct CountingSelector {
        seen: Vec<Option<usize>>,
    }

    impl ActionSelector<NoopPolicy, usize> for CountingSelector {
        type Action = usize;
        type Hidden = usize;

        fn select(
            &mut self,
            _policy: &NoopPolicy,
            state: &usize,
            hidden: Option<usize>,
            _recurrent: bool,
            _exploration_rate: f32,
            _rng: &mut StdRng,
        ) -> Result<Selection<usize, f32, usize>> {
            self.seen.push(hidden);
            Ok(Selection {
                action: *state,
                log_prob: -1.,
                hidden: Some(hidden.unwrap_or(0) + 1),
            })
        }
    }

    /// Pays 1 per step and terminates on step `episode_length`.
    struct CountdownEnv {
        episode_length: usize,
        t: usize,
    }

    impl Env for CountdownEnv {
        type State = usize;
        type Action = usize;

        fn reset(&mut self) -> Result<usize> {
            self.t = 0;
            Ok(0)
        }

        fn step(&mut self, _action: &usize) -> Result<SnapShot<usize>> {
            self.t += 1;
            Ok(SnapShot {
                state: self.t,
                reward: 1.,
                done: self.t == self.episode_length,
            })
        }
    }

    fn run_rollout(
        max_episode_length: usize,
        episode_length: usize,
    ) -> Result<(
        RolloutOutcome<usize, usize, f32, usize>,
        CountingSelector,
        ExplorationSchedule,
    )> {
        let mut env = CountdownEnv {
            episode_length,
            t: 0,
        };
        let state = env.reset()?;
        let mut selector = CountingSelector::default();
        let mut schedule = ExplorationSchedule::new(1., 0.5, 0.)?;
        let outcome = RolloutExecutor::new(max_episode_length, true).run(
            &NoopPolicy,
            &mut selector,
            &mut env,
            &mut schedule,
            &mut seeded_rng(0),
            RolloutState {
                state,
                hidden: None,
            },
        )?;
        Ok((outcome, selector, schedule))
    }

    #[test]
    fn hidden_state_is_threaded_through_every_step() -> Result<()> {
        let (outcome, selector, schedule) = run_rollout(10, 4)?;
        assert_eq!(selector.seen, vec![None, Some(1), Some(2), Some(3)]);
        assert!(outcome.done);
        assert_eq!(outcome.state, 4);
        assert_eq!(outcome.trajectory.len(), 3);
        assert_eq!(outcome.trajectory.actions, vec![0, 1, 2]);
        assert_eq!(outcome.hidden, Some(4));
        assert_eq!(schedule.rate(), 0.125);
        Ok(())
    }

    #[test]
    fn truncated_rollout_keeps_hidden_state() -> Result<()> {
        let (outcome, selector, _) = run_rollout(3, 10)?;
        assert_eq!(selector.seen, vec![None, Some(1), Some(2)]);
        assert!(!outcome.done);
        assert_eq!(outcome.state, 3);
        assert_eq!(outcome.trajectory.len(), 3);
        assert_eq!(outcome.trajectory.rewards, vec![1., 1., 1.]);
        assert_eq!(outcome.hidden, Some(3));
        Ok(())
    }

    #[test]
    fn immediate_termination_records_nothing() -> Result<()> {
        let (outcome, selector, schedule) = run_rollout(5, 1)?;
        assert_eq!(selector.seen, vec![None]);
        assert!(outcome.done);
        assert!(outcome.trajectory.is_empty());
        assert_eq!(schedule.rate(), 1.);
        Ok(())
    }
}
