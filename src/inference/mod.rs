//! Checkpoint loading and single-image prediction.

pub mod predictor;

pub use predictor::{Prediction, Predictor};
