//! Shared utilities: error taxonomy, logging setup, and metric logs.

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{Error, Result};
pub use metrics::{BestTracker, EpochMetrics, MetricsLog, ScalarLog};
