use crate::{
    Algorithm,
    config::ReinforceConfig,
    early_stopping::EarlyStopping,
    env::Env,
    exploration::ExplorationSchedule,
    history::{EpisodeState, TrainingHistory},
    hooks::{Progress, TracingHooks, TrainingHooks},
    policies::{ActionSelector, Policy, optimize},
    rng::seeded_rng,
    rollout::{RolloutExecutor, RolloutOutcome, RolloutState, Trajectory},
    utils::loss::policy_gradient_loss,
};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use tracing::{debug, trace};

// Validation episodes run until the environment terminates.
const VALIDATION_EPISODE_LENGTH: usize = i32::MAX as usize;

struct RunOptions {
    num_episodes: usize,
    max_episode_length: usize,
    print_frequency: Option<usize>,
}

struct EpisodeRunner<'a, P, S, H> {
    policy: &'a mut P,
    selector: &'a mut S,
    hooks: &'a mut H,
    rng: &'a mut StdRng,
    recurrent: bool,
}

impl<P: Policy, S, H> EpisodeRunner<'_, P, S, H> {
    /// Runs `num_episodes` rollouts against `env`. Parameters are only updated when an
    /// optimizer is handed in.
    fn run_episodes<E, V>(
        &mut self,
        env: &mut E,
        mut schedule: ExplorationSchedule,
        options: &RunOptions,
        mut optimizer: Option<&mut P::Optimizer>,
        mut early_stopping: Option<&mut EarlyStopping<V>>,
    ) -> Result<TrainingHistory<E::Action>>
    where
        E: Env,
        V: Env<State = E::State, Action = E::Action>,
        S: ActionSelector<P, E::State, Action = E::Action>,
        H: TrainingHooks<E::Action>,
    {
        let rollout = RolloutExecutor::new(options.max_episode_length, self.recurrent);
        let mut history = TrainingHistory::default();
        let mut episode = EpisodeState::default();
        let mut completed_episodes = 0;
        let mut state = env.reset()?;
        for _ in 0..options.num_episodes {
            let RolloutOutcome {
                trajectory,
                state: next_state,
                done,
                ..
            } = rollout.run(
                &*self.policy,
                &mut *self.selector,
                env,
                &mut schedule,
                &mut *self.rng,
                RolloutState {
                    state,
                    hidden: None,
                },
            )?;
            state = next_state;

            if let Some(optimizer) = optimizer.as_deref_mut() {
                if !trajectory.is_empty() {
                    let loss = policy_gradient_loss(&trajectory.rewards, &trajectory.log_probs)?;
                    optimize(optimizer, &loss)?;
                    trace!(steps = trajectory.len(), "policy gradient step");
                }
            }

            let Trajectory {
                actions, rewards, ..
            } = trajectory;
            let record = match std::mem::take(&mut episode).advance(&rewards, actions, done) {
                EpisodeState::Complete(record) => record,
                accumulating => {
                    episode = accumulating;
                    continue;
                }
            };
            history.push(record);
            state = env.reset()?;
            completed_episodes += 1;

            if options
                .print_frequency
                .is_some_and(|frequency| (completed_episodes - 1) % frequency == 0)
            {
                if let Some((total_reward, actions)) = history.last() {
                    self.hooks.report_progress(&Progress {
                        completed_episodes,
                        total_reward,
                        actions,
                        exploration_rate: schedule.rate(),
                    });
                }
            }

            if let Some(early_stopping) = early_stopping.as_deref_mut() {
                if early_stopping.is_due(completed_episodes) {
                    let validation_reward = self.validate(early_stopping.env_mut())?;
                    self.hooks
                        .validation_hook(completed_episodes, validation_reward);
                    if early_stopping.record(validation_reward) {
                        debug!(
                            completed_episodes,
                            validation_reward, "validation reward regressed, stopping early"
                        );
                        return Ok(history);
                    }
                }
            }
        }
        Ok(history)
    }

    /// One greedy inference episode on the validation environment.
    fn validate<V>(&mut self, env: &mut V) -> Result<f32>
    where
        V: Env,
        S: ActionSelector<P, V::State, Action = V::Action>,
        H: TrainingHooks<V::Action>,
    {
        let was_training = self.policy.is_training();
        self.policy.set_training(false);
        let options = RunOptions {
            num_episodes: 1,
            max_episode_length: VALIDATION_EPISODE_LENGTH,
            print_frequency: None,
        };
        let history = self.run_episodes::<V, V>(
            env,
            ExplorationSchedule::greedy(),
            &options,
            None,
            None,
        );
        self.policy.set_training(was_training);
        history?
            .last()
            .map(|(reward, _)| reward)
            .context("validation episode did not terminate")
    }
}

/// Monte Carlo policy gradient training.
///
/// Every rollout is turned into a single update: rewards of the trajectory are standardized
/// and weight the log probabilities of the actions taken. Rollouts are bounded by
/// `max_episode_length`, an episode that does not terminate within it is carried over to the
/// next rollout and only shows up in the history once it terminates.
pub struct Reinforce<P, S, E, V = E, H = TracingHooks> {
    pub policy: P,
    pub selector: S,
    pub env: E,
    pub hooks: H,
    early_stopping: Option<EarlyStopping<V>>,
    config: ReinforceConfig,
    rng: StdRng,
}

impl<P, S, E> Reinforce<P, S, E> {
    pub fn new(config: ReinforceConfig, policy: P, selector: S, env: E) -> Result<Self> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self {
            policy,
            selector,
            env,
            hooks: TracingHooks,
            early_stopping: None,
            config,
            rng,
        })
    }
}

impl<P, S, E, V, H> Reinforce<P, S, E, V, H> {
    /// Sets the environment early stopping validates on. It is only consulted when
    /// `early_stopping` is enabled in the config.
    pub fn with_validation_env<V2>(self, env: V2) -> Result<Reinforce<P, S, E, V2, H>> {
        let early_stopping = EarlyStopping::new(env, self.config.early_stopping_frequency)?;
        Ok(Reinforce {
            policy: self.policy,
            selector: self.selector,
            env: self.env,
            hooks: self.hooks,
            early_stopping: Some(early_stopping),
            config: self.config,
            rng: self.rng,
        })
    }

    pub fn with_hooks<H2>(self, hooks: H2) -> Reinforce<P, S, E, V, H2> {
        Reinforce {
            policy: self.policy,
            selector: self.selector,
            env: self.env,
            hooks,
            early_stopping: self.early_stopping,
            config: self.config,
            rng: self.rng,
        }
    }

    pub fn config(&self) -> &ReinforceConfig {
        &self.config
    }

    pub fn validation_rewards(&self) -> &[f32] {
        self.early_stopping
            .as_ref()
            .map(|early_stopping| early_stopping.validation_rewards())
            .unwrap_or_default()
    }
}

impl<P: Policy, S, E, V, H> Reinforce<P, S, E, V, H> {
    /// Runs `num_episodes` rollouts on `env` in inference mode at minimum exploration. The
    /// policy parameters are left untouched.
    pub fn evaluate<EE>(
        &mut self,
        env: &mut EE,
        num_episodes: usize,
    ) -> Result<TrainingHistory<EE::Action>>
    where
        EE: Env,
        S: ActionSelector<P, EE::State, Action = EE::Action>,
        H: TrainingHooks<EE::Action>,
    {
        let mut schedule = self.config.exploration_schedule()?;
        schedule.reset_for_evaluation();
        let options = RunOptions {
            num_episodes,
            max_episode_length: self.config.max_episode_length,
            print_frequency: None,
        };
        let was_training = self.policy.is_training();
        self.policy.set_training(false);
        let mut runner = EpisodeRunner {
            policy: &mut self.policy,
            selector: &mut self.selector,
            hooks: &mut self.hooks,
            rng: &mut self.rng,
            recurrent: self.config.recurrent,
        };
        let history = runner.run_episodes::<EE, EE>(env, schedule, &options, None, None);
        self.policy.set_training(was_training);
        history
    }
}

impl<P, S, E, V, H> Algorithm for Reinforce<P, S, E, V, H>
where
    P: Policy,
    E: Env,
    V: Env<State = E::State, Action = E::Action>,
    S: ActionSelector<P, E::State, Action = E::Action>,
    H: TrainingHooks<E::Action>,
{
    type Output = TrainingHistory<E::Action>;

    fn train(&mut self) -> Result<Self::Output> {
        let mut schedule = self.config.exploration_schedule()?;
        let mut optimizer = if self.config.train {
            self.policy.set_training(true);
            Some(self.policy.build_optimizer(&self.config.optimizer_params())?)
        } else {
            self.policy.set_training(false);
            schedule.reset_for_evaluation();
            None
        };
        let early_stopping = if self.config.early_stopping {
            Some(
                self.early_stopping
                    .as_mut()
                    .context("early stopping is enabled but no validation environment was set")?,
            )
        } else {
            None
        };
        let options = RunOptions {
            num_episodes: self.config.num_episodes,
            max_episode_length: self.config.max_episode_length,
            print_frequency: self
                .config
                .print_results
                .then_some(self.config.print_frequency),
        };
        let mut runner = EpisodeRunner {
            policy: &mut self.policy,
            selector: &mut self.selector,
            hooks: &mut self.hooks,
            rng: &mut self.rng,
            recurrent: self.config.recurrent,
        };
        runner.run_episodes(
            &mut self.env,
            schedule,
            &options,
            optimizer.as_mut(),
            early_stopping,
        )
    }
}
