use anyhow::{Result, anyhow};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use reinforce_core::env::{Env, EnvironmentDescription, SnapShot};

fn time_state(t: usize) -> Result<Tensor> {
    Ok(Tensor::new(&[t as f32], &Device::Cpu)?)
}

/// Terminates on step `rewards.len() + 1`. Every earlier step `i` pays `rewards[i]`,
/// regardless of the action.
pub struct FixedRewardEnv {
    rewards: Vec<f32>,
    t: usize,
    pub steps_taken: usize,
}

impl FixedRewardEnv {
    pub fn new(rewards: Vec<f32>) -> Self {
        Self {
            rewards,
            t: 0,
            steps_taken: 0,
        }
    }

    pub fn description() -> EnvironmentDescription {
        EnvironmentDescription::new(1, 2)
    }
}

impl Env for FixedRewardEnv {
    type State = Tensor;
    type Action = usize;

    fn reset(&mut self) -> Result<Tensor> {
        self.t = 0;
        time_state(0)
    }

    fn step(&mut self, _action: &usize) -> Result<SnapShot<Tensor>> {
        self.t += 1;
        self.steps_taken += 1;
        let reward = self.rewards.get(self.t - 1).copied();
        Ok(SnapShot {
            state: time_state(self.t)?,
            reward: reward.unwrap_or_default(),
            done: reward.is_none(),
        })
    }
}

/// Two step episodes, each one paying one less than the previous.
#[derive(Default)]
pub struct DecliningRewardEnv {
    completed: usize,
    t: usize,
}

impl Env for DecliningRewardEnv {
    type State = Tensor;
    type Action = usize;

    fn reset(&mut self) -> Result<Tensor> {
        self.t = 0;
        time_state(0)
    }

    fn step(&mut self, _action: &usize) -> Result<SnapShot<Tensor>> {
        self.t += 1;
        let reward = 100. - self.completed as f32;
        let done = self.t > 1;
        if done {
            self.completed += 1;
        }
        Ok(SnapShot {
            state: time_state(self.t)?,
            reward,
            done,
        })
    }
}

/// Pays 1 for playing `target` and 0 otherwise, terminates after `episode_length` paid steps.
pub struct TargetActionEnv {
    target: usize,
    action_size: usize,
    episode_length: usize,
    t: usize,
}

impl TargetActionEnv {
    pub fn new(target: usize, action_size: usize, episode_length: usize) -> Self {
        Self {
            target,
            action_size,
            episode_length,
            t: 0,
        }
    }

    pub fn description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(1, self.action_size)
    }
}

impl Env for TargetActionEnv {
    type State = Tensor;
    type Action = usize;

    fn reset(&mut self) -> Result<Tensor> {
        self.t = 0;
        time_state(0)
    }

    fn step(&mut self, action: &usize) -> Result<SnapShot<Tensor>> {
        self.t += 1;
        let reward = if *action == self.target { 1. } else { 0. };
        Ok(SnapShot {
            state: time_state(self.t)?,
            reward,
            done: self.t > self.episode_length,
        })
    }
}

/// Every parameter of `varmap` flattened, ordered by name.
pub fn snapshot_params(varmap: &VarMap) -> Result<Vec<(String, Vec<f32>)>> {
    let data = varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("varmap lock poisoned"))?;
    let mut params = data
        .iter()
        .map(|(name, var)| Ok((name.clone(), var.flatten_all()?.to_vec1::<f32>()?)))
        .collect::<Result<Vec<_>>>()?;
    params.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(params)
}
