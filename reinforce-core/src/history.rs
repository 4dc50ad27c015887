#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord<A> {
    pub total_reward: f32,
    pub actions: Vec<A>,
}

/// Rewards and actions of completed episodes. Both are only ever pushed together, so they
/// always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingHistory<A> {
    rewards: Vec<f32>,
    actions: Vec<Vec<A>>,
}

impl<A> Default for TrainingHistory<A> {
    fn default() -> Self {
        Self {
            rewards: vec![],
            actions: vec![],
        }
    }
}

impl<A> TrainingHistory<A> {
    pub fn push(&mut self, record: EpisodeRecord<A>) {
        self.rewards.push(record.total_reward);
        self.actions.push(record.actions);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    pub fn actions(&self) -> &[Vec<A>] {
        &self.actions
    }

    pub fn last(&self) -> Option<(f32, &[A])> {
        self.rewards
            .last()
            .zip(self.actions.last())
            .map(|(reward, actions)| (*reward, actions.as_slice()))
    }

    pub fn mean_reward(&self) -> Option<f32> {
        (!self.is_empty()).then(|| self.rewards.iter().sum::<f32>() / self.len() as f32)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f32, &[A])> {
        self.rewards
            .iter()
            .zip(&self.actions)
            .map(|(reward, actions)| (*reward, actions.as_slice()))
    }

    pub fn into_parts(self) -> (Vec<f32>, Vec<Vec<A>>) {
        (self.rewards, self.actions)
    }
}

/// Episode bookkeeping across rollout fragments. A rollout cut short by the step budget
/// leaves the episode `Accumulating`, the fragment that observes termination turns it
/// `Complete`.
#[derive(Debug, Clone, PartialEq)]
pub enum EpisodeState<A> {
    Accumulating { rewards: Vec<f32>, actions: Vec<A> },
    Complete(EpisodeRecord<A>),
}

impl<A> Default for EpisodeState<A> {
    fn default() -> Self {
        Self::Accumulating {
            rewards: vec![],
            actions: vec![],
        }
    }
}

impl<A> EpisodeState<A> {
    pub fn advance(self, fragment_rewards: &[f32], fragment_actions: Vec<A>, done: bool) -> Self {
        let (mut rewards, mut actions) = match self {
            Self::Accumulating { rewards, actions } => (rewards, actions),
            Self::Complete(_) => (vec![], vec![]),
        };
        rewards.extend_from_slice(fragment_rewards);
        actions.extend(fragment_actions);
        if done {
            Self::Complete(EpisodeRecord {
                total_reward: rewards.iter().sum(),
                actions,
            })
        } else {
            Self::Accumulating { rewards, actions }
        }
    }
}
