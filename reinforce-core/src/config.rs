use crate::{exploration::ExplorationSchedule, policies::OptimizerParams};
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinforceConfig {
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub initial_exploration_rate: f32,
    pub exploration_decay_factor: f32,
    pub exploration_min: f32,
    /// Number of rollouts, an episode cut short by `max_episode_length` spans several
    pub num_episodes: usize,
    pub max_episode_length: usize,
    pub train: bool,
    pub print_results: bool,
    pub print_frequency: usize,
    pub recurrent: bool,
    pub early_stopping: bool,
    pub early_stopping_frequency: usize,
    pub seed: u64,
    pub max_grad_norm: Option<f32>,
}

impl Default for ReinforceConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            weight_decay: 1e-5,
            initial_exploration_rate: 1.,
            exploration_decay_factor: 1. - 1e-4,
            exploration_min: 0.,
            num_episodes: 1000,
            max_episode_length: i32::MAX as usize,
            train: true,
            print_results: true,
            print_frequency: 100,
            recurrent: false,
            early_stopping: false,
            early_stopping_frequency: 100,
            seed: 0,
            max_grad_norm: None,
        }
    }
}

impl ReinforceConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_episode_length > 0, "max_episode_length must be positive");
        ensure!(self.print_frequency > 0, "print_frequency must be positive");
        ensure!(
            self.early_stopping_frequency > 0,
            "early_stopping_frequency must be positive"
        );
        ensure!(
            self.learning_rate.is_finite() && self.learning_rate >= 0.,
            "learning_rate must be a finite non negative number"
        );
        ensure!(
            self.weight_decay.is_finite() && self.weight_decay >= 0.,
            "weight_decay must be a finite non negative number"
        );
        if let Some(max_grad_norm) = self.max_grad_norm {
            ensure!(max_grad_norm > 0., "max_grad_norm must be positive");
        }
        self.exploration_schedule().map(|_| ())
    }

    pub fn exploration_schedule(&self) -> Result<ExplorationSchedule> {
        ExplorationSchedule::new(
            self.initial_exploration_rate,
            self.exploration_decay_factor,
            self.exploration_min,
        )
    }

    pub fn optimizer_params(&self) -> OptimizerParams {
        OptimizerParams {
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
            max_grad_norm: self.max_grad_norm,
        }
    }
}
