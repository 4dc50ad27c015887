use anyhow::{Result, ensure};

/// Multiplicative exploration decay with a floor. The rate never leaves
/// `[min, initial]` once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationSchedule {
    rate: f32,
    decay: f32,
    min: f32,
}

impl ExplorationSchedule {
    pub fn new(initial: f32, decay: f32, min: f32) -> Result<Self> {
        ensure!(
            decay > 0. && decay <= 1.,
            "exploration decay factor must be in (0, 1], got {decay}"
        );
        ensure!(min >= 0., "minimum exploration rate must be non negative, got {min}");
        ensure!(
            min <= initial,
            "minimum exploration rate {min} is above the initial rate {initial}"
        );
        Ok(Self {
            rate: initial,
            decay,
            min,
        })
    }

    /// Zero exploration that stays zero, used for validation episodes.
    pub fn greedy() -> Self {
        Self {
            rate: 0.,
            decay: 1.,
            min: 0.,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn decay(&mut self) {
        self.rate = (self.rate * self.decay).max(self.min);
    }

    pub fn reset_for_evaluation(&mut self) {
        self.rate = self.min;
    }
}
