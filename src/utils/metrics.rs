//! Metrics Module
//!
//! Per-epoch metric logs, best-accuracy tracking, and the scalar export sink
//! written once at the end of a training session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// Results of a single epoch over one dataset split
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Mean per-batch loss
    pub loss: f64,
    /// Mean per-batch accuracy on the 0-100 scale
    pub accuracy: f64,
    /// Wall-clock duration of the epoch
    pub elapsed_seconds: f64,
}

/// Append-only log of epoch metrics, one entry per epoch.
///
/// Created at session start and handed back to the caller at session end;
/// there is no ambient global log state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsLog {
    entries: Vec<EpochMetrics>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch's metrics. Entries are never mutated afterwards.
    pub fn append(&mut self, metrics: EpochMetrics) {
        self.entries.push(metrics);
    }

    pub fn entries(&self) -> &[EpochMetrics] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.entries.last()
    }
}

/// Best validation accuracy seen so far within one training session.
///
/// Starts at 0 and only moves on a strictly higher observation, so the
/// tracked value is monotonically non-decreasing by construction. A
/// checkpoint write happens exactly when `observe` returns true.
#[derive(Debug, Clone, Copy)]
pub struct BestTracker {
    best: f64,
}

impl BestTracker {
    pub fn new() -> Self {
        Self { best: 0.0 }
    }

    /// Record a validation accuracy; returns true on strict improvement.
    pub fn observe(&mut self, accuracy: f64) -> bool {
        if accuracy > self.best {
            self.best = accuracy;
            true
        } else {
            false
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }
}

impl Default for BestTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A single exported scalar observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarEntry {
    pub tag: String,
    pub step: usize,
    pub value: f64,
}

/// Accumulates `(tag, step, value)` scalars during a run and flushes them
/// as JSON once at session end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalarLog {
    entries: Vec<ScalarEntry>,
}

impl ScalarLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scalar(&mut self, tag: &str, step: usize, value: f64) {
        self.entries.push(ScalarEntry {
            tag: tag.to_string(),
            step,
            value,
        });
    }

    pub fn entries(&self) -> &[ScalarEntry] {
        &self.entries
    }

    pub fn get(&self, tag: &str, step: usize) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.tag == tag && e.step == step)
            .map(|e| e.value)
    }

    /// Write all accumulated scalars to a JSON file, creating parent
    /// directories as needed.
    pub fn export(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously exported scalar log.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let log = serde_json::from_str(&json).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_log_append_only() {
        let mut log = MetricsLog::new();
        assert!(log.is_empty());

        log.append(EpochMetrics {
            loss: 0.5,
            accuracy: 80.0,
            elapsed_seconds: 1.2,
        });
        log.append(EpochMetrics {
            loss: 0.4,
            accuracy: 85.0,
            elapsed_seconds: 1.1,
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].accuracy, 80.0);
        assert_eq!(log.last().unwrap().accuracy, 85.0);
    }

    #[test]
    fn test_best_tracker_strict_improvement() {
        // Accuracy sequence 60, 55, 70, 70, 65 must trigger exactly two
        // improvements (epochs 1 and 3) and finish at 70.
        let sequence = [60.0, 55.0, 70.0, 70.0, 65.0];
        let mut tracker = BestTracker::new();

        let improved: Vec<bool> = sequence.iter().map(|&a| tracker.observe(a)).collect();

        assert_eq!(improved, vec![true, false, true, false, false]);
        assert_eq!(tracker.best(), 70.0);
    }

    #[test]
    fn test_best_tracker_monotonic() {
        let mut tracker = BestTracker::new();
        let mut previous = tracker.best();
        for &acc in &[10.0, 5.0, 50.0, 45.0, 50.0, 80.0] {
            tracker.observe(acc);
            assert!(tracker.best() >= previous);
            previous = tracker.best();
        }
    }

    #[test]
    fn test_scalar_log_lookup() {
        let mut log = ScalarLog::new();
        log.add_scalar("train/loss", 0, 0.7);
        log.add_scalar("train/loss", 1, 0.5);
        log.add_scalar("val/accuracy", 0, 62.5);

        assert_eq!(log.get("train/loss", 1), Some(0.5));
        assert_eq!(log.get("val/accuracy", 0), Some(62.5));
        assert_eq!(log.get("val/loss", 0), None);
    }

    #[test]
    fn test_scalar_log_export_round_trip() {
        let mut log = ScalarLog::new();
        log.add_scalar("train/accuracy", 3, 91.25);

        let path = std::env::temp_dir().join(format!(
            "catdog_scalars_{}.json",
            std::process::id()
        ));
        log.export(&path).unwrap();

        let loaded = ScalarLog::load(&path).unwrap();
        assert_eq!(loaded.entries().len(), 1);
        assert_eq!(loaded.get("train/accuracy", 3), Some(91.25));

        std::fs::remove_file(&path).ok();
    }
}
