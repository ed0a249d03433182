//! # catdog
//!
//! A cat-vs-dog binary image classification pipeline built on the Burn
//! framework: filename-labeled samples are listed from disk, split into
//! train/validation sets, augmented, and fed to a small CNN with a single
//! sigmoid output unit. The best validation checkpoint is persisted and can
//! be reloaded for single-image prediction.
//!
//! ## Quick start
//!
//! ```no_run
//! use catdog::training::TrainingSession;
//!
//! # fn main() -> catdog::utils::Result<()> {
//! let report = TrainingSession::new("Data/train", "runs", 10).run()?;
//! println!("best accuracy: {:.2}%", report.best_val_accuracy);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

/// Side length every image is resized to before any other transform
pub const IMAGE_SIZE: usize = 224;

/// Side length of the random crop applied during training
pub const CROP_SIZE: usize = 204;

pub use backend::{DefaultBackend, TrainingBackend};
pub use inference::{Prediction, Predictor};
pub use training::{SessionReport, TrainingSession};
pub use utils::{Error, Result};
