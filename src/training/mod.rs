//! Training orchestration: fixed hyperparameters, the learning-rate
//! schedule, single-epoch passes, and the multi-epoch session.

pub mod epoch;
pub mod schedule;
pub mod session;

pub use epoch::{train_one_epoch, validate_one_epoch, TrainingContext};
pub use schedule::StepDecaySchedule;
pub use session::{SessionReport, TrainingSession};

/// Initial Adam learning rate
pub const LEARNING_RATE: f64 = 1e-4;

/// Multiplier applied to the learning rate at each decay step
pub const LR_DECAY_FACTOR: f64 = 0.5;

/// Number of epochs between learning-rate decay steps
pub const LR_STEP_EPOCHS: usize = 5;

/// Samples per batch
pub const BATCH_SIZE: usize = 32;

/// Data-loader prefetch workers
pub const NUM_WORKERS: usize = 8;

/// File name of the single best-model checkpoint
pub const CHECKPOINT_FILE: &str = "best_model.mpk";

/// File name of the exported scalar log
pub const SCALARS_FILE: &str = "scalars.json";
