use std::fmt::Debug;
use tracing::{debug, info};

pub struct Progress<'a, A> {
    pub completed_episodes: usize,
    pub total_reward: f32,
    pub actions: &'a [A],
    pub exploration_rate: f32,
}

pub trait TrainingHooks<A> {
    /// Called on the first completed episode and every `print_frequency`-th one after
    fn report_progress(&mut self, progress: &Progress<'_, A>);

    fn validation_hook(&mut self, _completed_episodes: usize, _validation_reward: f32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl<A: Debug> TrainingHooks<A> for TracingHooks {
    fn report_progress(&mut self, progress: &Progress<'_, A>) {
        info!(
            completed_episodes = progress.completed_episodes,
            total_reward = progress.total_reward,
            exploration_rate = progress.exploration_rate,
            actions = ?progress.actions,
            "completed episode"
        );
    }

    fn validation_hook(&mut self, completed_episodes: usize, validation_reward: f32) {
        debug!(completed_episodes, validation_reward, "validation episode");
    }
}
