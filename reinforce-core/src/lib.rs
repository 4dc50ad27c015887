pub mod config;
pub mod early_stopping;
pub mod env;
pub mod exploration;
pub mod history;
pub mod hooks;
pub mod policies;
pub mod reinforce;
pub mod rng;
pub mod rollout;
pub mod utils;

use anyhow::Result;

/// A learning algorithm. `Reinforce` is the only implementor, the output is whatever the
/// algorithm accumulates while training.
pub trait Algorithm {
    type Output;

    fn train(&mut self) -> Result<Self::Output>;
}
