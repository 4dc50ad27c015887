use anyhow::{Result, ensure};

/// Holds the validation environment and the rewards of past validation episodes.
///
/// A validation reward only gets compared with the one right before it, not with the best
/// seen so far. One unlucky validation episode can therefore stop training early, and a slow
/// decline that never drops between two consecutive checks is never caught.
pub struct EarlyStopping<V> {
    env: V,
    frequency: usize,
    validation_rewards: Vec<f32>,
}

impl<V> EarlyStopping<V> {
    pub fn new(env: V, frequency: usize) -> Result<Self> {
        ensure!(frequency > 0, "early stopping frequency must be positive");
        Ok(Self {
            env,
            frequency,
            validation_rewards: vec![],
        })
    }

    pub fn is_due(&self, completed_episodes: usize) -> bool {
        completed_episodes % self.frequency == 0
    }

    /// Appends `reward` and returns whether it regressed from the previous validation reward.
    pub fn record(&mut self, reward: f32) -> bool {
        let regressed = self
            .validation_rewards
            .last()
            .is_some_and(|previous| reward < *previous);
        self.validation_rewards.push(reward);
        regressed
    }

    pub fn validation_rewards(&self) -> &[f32] {
        &self.validation_rewards
    }

    pub fn env_mut(&mut self) -> &mut V {
        &mut self.env
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }
}
