//! Step-decay learning-rate schedule.
//!
//! The learning rate is a pure function of the epoch number: it starts at
//! the initial rate and is multiplied by the decay factor once per completed
//! step interval.

use serde::{Deserialize, Serialize};

/// Step decay: `lr(epoch) = initial_lr * decay_factor^(epoch / step_epochs)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDecaySchedule {
    pub initial_lr: f64,
    pub decay_factor: f64,
    pub step_epochs: usize,
}

impl StepDecaySchedule {
    pub fn new(initial_lr: f64, decay_factor: f64, step_epochs: usize) -> Self {
        Self {
            initial_lr,
            decay_factor,
            step_epochs,
        }
    }

    /// Learning rate for a zero-based epoch number.
    pub fn lr_for_epoch(&self, epoch: usize) -> f64 {
        let steps = (epoch / self.step_epochs.max(1)) as i32;
        self.initial_lr * self.decay_factor.powi(steps)
    }
}
