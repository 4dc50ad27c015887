use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentDescription {
    pub observation_size: usize,
    pub action_size: usize,
}

impl EnvironmentDescription {
    pub fn new(observation_size: usize, action_size: usize) -> Self {
        Self {
            observation_size,
            action_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapShot<S> {
    pub state: S,
    pub reward: f32,
    pub done: bool,
}

pub trait Env {
    type State: Clone;
    type Action: Clone;

    fn reset(&mut self) -> Result<Self::State>;
    fn step(&mut self, action: &Self::Action) -> Result<SnapShot<Self::State>>;
}

impl<E: Env + ?Sized> Env for &mut E {
    type State = E::State;
    type Action = E::Action;

    fn reset(&mut self) -> Result<Self::State> {
        (**self).reset()
    }

    fn step(&mut self, action: &Self::Action) -> Result<SnapShot<Self::State>> {
        (**self).step(action)
    }
}
