use anyhow::Result;
use rand::rngs::StdRng;

/// A scalar log probability that a policy gradient loss can be built from.
pub trait LogProb: Sized {
    type Loss;

    /// Builds `-sum_i(log_probs[i] * weights[i])`. Callers guarantee equal lengths.
    fn negative_weighted_sum(log_probs: &[Self], weights: &[f32]) -> Result<Self::Loss>;
}

impl LogProb for f32 {
    type Loss = f32;

    fn negative_weighted_sum(log_probs: &[Self], weights: &[f32]) -> Result<Self::Loss> {
        Ok(-log_probs
            .iter()
            .zip(weights)
            .map(|(logp, weight)| logp * weight)
            .sum::<f32>())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerParams {
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub max_grad_norm: Option<f32>,
}

pub trait PolicyOptimizer {
    type Loss;

    fn zero_grad(&mut self) -> Result<()>;
    fn backward(&mut self, loss: &Self::Loss) -> Result<()>;
    fn step(&mut self) -> Result<()>;
}

pub trait Policy {
    type LogProb: LogProb<Loss = <Self::Optimizer as PolicyOptimizer>::Loss>;
    type Optimizer: PolicyOptimizer;

    /// Switches between training and inference mode
    fn set_training(&mut self, training: bool);

    fn is_training(&self) -> bool;

    /// Binds a fresh optimizer to the parameters of the policy
    fn build_optimizer(&self, params: &OptimizerParams) -> Result<Self::Optimizer>;
}

pub struct Selection<A, L, H> {
    pub action: A,
    pub log_prob: L,
    pub hidden: Option<H>,
}

/// Turns the policy output for a state into a concrete action and the log probability of
/// having taken it.
pub trait ActionSelector<P: Policy, S> {
    type Action: Clone;
    type Hidden;

    fn select(
        &mut self,
        policy: &P,
        state: &S,
        hidden: Option<Self::Hidden>,
        recurrent: bool,
        exploration_rate: f32,
        rng: &mut StdRng,
    ) -> Result<Selection<Self::Action, P::LogProb, Self::Hidden>>;
}

/// Clears the gradients, backpropagates `loss` and applies a single update.
pub fn optimize<O: PolicyOptimizer>(optimizer: &mut O, loss: &O::Loss) -> Result<()> {
    optimizer.zero_grad()?;
    optimizer.backward(loss)?;
    optimizer.step()
}
