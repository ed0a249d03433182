//! Training Session
//!
//! The N-epoch orchestration loop: list and split the data, build loaders,
//! then strictly alternate a training epoch with a validation epoch. Metric
//! logs and the best-accuracy tracker are explicit session-owned objects,
//! and the scalar log is exported as JSON exactly once, at session end.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::backend::{default_device, DefaultBackend, TrainingBackend};
use crate::dataset::{
    build_dataloader, list_train_samples, split, CatDogDataset, DatasetMode, DEFAULT_SPLIT_SEED,
    VAL_FRACTION,
};
use crate::training::epoch::{train_one_epoch, validate_one_epoch, TrainingContext};
use crate::training::{CHECKPOINT_FILE, SCALARS_FILE};
use crate::utils::error::Result;
use crate::utils::metrics::{BestTracker, MetricsLog, ScalarLog};

/// Outcome of a completed session: the per-phase metric logs and the best
/// validation accuracy reached.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub train_log: MetricsLog,
    pub val_log: MetricsLog,
    pub best_val_accuracy: f64,
}

/// A full training run over a labeled data directory.
pub struct TrainingSession {
    data_dir: PathBuf,
    output_dir: PathBuf,
    epochs: usize,
}

impl TrainingSession {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_dir: P, output_dir: Q, epochs: usize) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            epochs,
        }
    }

    /// Path of the single best-model checkpoint, overwritten in place.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join(CHECKPOINT_FILE)
    }

    /// Path of the exported scalar log.
    pub fn scalars_path(&self) -> PathBuf {
        self.output_dir.join(SCALARS_FILE)
    }

    /// Run the session. Any epoch failure is fatal and propagates; there are
    /// no retries.
    pub fn run(&self) -> Result<SessionReport> {
        std::fs::create_dir_all(&self.output_dir)?;

        let samples = list_train_samples(&self.data_dir)?;
        let (train_samples, val_samples) = split(samples, VAL_FRACTION, DEFAULT_SPLIT_SEED);
        info!(
            "Split: {} training samples, {} validation samples",
            train_samples.len(),
            val_samples.len()
        );

        let device = default_device();
        let train_loader = build_dataloader::<TrainingBackend>(
            CatDogDataset::new(train_samples, DatasetMode::Train),
            &device,
            Some(DEFAULT_SPLIT_SEED),
        );
        let val_loader = build_dataloader::<DefaultBackend>(
            CatDogDataset::new(val_samples, DatasetMode::Validate),
            &device,
            None,
        );

        let mut ctx = TrainingContext::<TrainingBackend>::new(&device);
        let mut tracker = BestTracker::new();
        let mut train_log = MetricsLog::new();
        let mut val_log = MetricsLog::new();
        let mut scalars = ScalarLog::new();
        let checkpoint = self.checkpoint_path();

        for epoch in 0..self.epochs {
            let train_metrics = train_one_epoch(&mut ctx, train_loader.as_ref(), epoch)?;
            scalars.add_scalar("train/loss", epoch, train_metrics.loss);
            scalars.add_scalar("train/accuracy", epoch, train_metrics.accuracy);
            train_log.append(train_metrics);

            let val_metrics =
                validate_one_epoch(&ctx, val_loader.as_ref(), &mut tracker, &checkpoint, epoch)?;
            scalars.add_scalar("val/loss", epoch, val_metrics.loss);
            scalars.add_scalar("val/accuracy", epoch, val_metrics.accuracy);
            val_log.append(val_metrics);
        }

        scalars.export(&self.scalars_path())?;
        info!(
            "Session finished: {} epochs, best validation accuracy {:.2}%",
            self.epochs,
            tracker.best()
        );

        Ok(SessionReport {
            train_log,
            val_log,
            best_val_accuracy: tracker.best(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::Error;

    #[test]
    fn test_paths_derive_from_output_dir() {
        let session = TrainingSession::new("Data/train", "runs", 10);
        assert_eq!(session.checkpoint_path(), PathBuf::from("runs/best_model.mpk"));
        assert_eq!(session.scalars_path(), PathBuf::from("runs/scalars.json"));
    }

    #[test]
    fn test_missing_data_dir_fails_before_training() {
        let missing = std::env::temp_dir().join("catdog_session_missing_data");
        let out = std::env::temp_dir().join(format!("catdog_session_out_{}", std::process::id()));
        let session = TrainingSession::new(&missing, &out, 1);

        let err = session.run().unwrap_err();
        assert!(matches!(err, Error::DataNotFound(_)));
        // No checkpoint and no scalar export on failure
        assert!(!session.checkpoint_path().exists());
        assert!(!session.scalars_path().exists());

        std::fs::remove_dir_all(&out).ok();
    }
}
