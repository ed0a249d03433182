//! Epoch Runner
//!
//! One training pass and one validation pass over a data loader. All model
//! state lives in an explicit [`TrainingContext`] that the caller owns and
//! threads through; the loader's worker pool only produces batches.

use std::path::Path;
use std::time::Instant;

use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion, Int, Tensor},
};
use tracing::{debug, info};

use crate::dataset::CatDogBatch;
use crate::model::{accuracy, binary_cross_entropy, CatDogClassifier, CatDogClassifierConfig};
use crate::training::schedule::StepDecaySchedule;
use crate::training::{LEARNING_RATE, LR_DECAY_FACTOR, LR_STEP_EPOCHS};
use crate::utils::error::{Error, Result};
use crate::utils::metrics::{BestTracker, EpochMetrics};

/// Everything a training step needs, owned by the control thread.
pub struct TrainingContext<B: AutodiffBackend> {
    pub model: CatDogClassifier<B>,
    optimizer: OptimizerAdaptor<Adam<B::InnerBackend>, CatDogClassifier<B>, B>,
    pub schedule: StepDecaySchedule,
    pub device: B::Device,
}

impl<B: AutodiffBackend> TrainingContext<B> {
    /// Fresh model, Adam optimizer, and the fixed step-decay schedule.
    pub fn new(device: &B::Device) -> Self {
        let model = CatDogClassifier::new(&CatDogClassifierConfig::new(), device);
        let optimizer = AdamConfig::new().init();
        let schedule = StepDecaySchedule::new(LEARNING_RATE, LR_DECAY_FACTOR, LR_STEP_EPOCHS);

        Self {
            model,
            optimizer,
            schedule,
            device: device.clone(),
        }
    }
}

/// Validate a batch and split it into its image and target tensors.
///
/// Training and validation both require well-formed labeled batches; a
/// malformed one aborts the epoch with [`Error::BatchProcessing`].
fn batch_views<B: Backend>(batch: &CatDogBatch<B>) -> Result<(Tensor<B, 4>, Tensor<B, 1, Int>)> {
    let dims = batch.images.dims();
    if dims[0] == 0 {
        return Err(Error::BatchProcessing("empty batch".to_string()));
    }
    if dims[1] != 3 {
        return Err(Error::BatchProcessing(format!(
            "expected 3 image channels, got {}",
            dims[1]
        )));
    }
    let targets = batch
        .targets
        .clone()
        .ok_or_else(|| Error::BatchProcessing("batch without targets".to_string()))?;
    if targets.dims()[0] != dims[0] {
        return Err(Error::BatchProcessing(format!(
            "{} targets for {} images",
            targets.dims()[0],
            dims[0]
        )));
    }

    Ok((batch.images.clone(), targets))
}

/// Run one training epoch: forward, loss, backward, optimizer step per
/// batch. Returns mean loss and mean accuracy over the epoch's batches.
pub fn train_one_epoch<B: AutodiffBackend>(
    ctx: &mut TrainingContext<B>,
    loader: &dyn DataLoader<CatDogBatch<B>>,
    epoch: usize,
) -> Result<EpochMetrics> {
    let start = Instant::now();
    let lr = ctx.schedule.lr_for_epoch(epoch);

    let mut loss_sum = 0.0;
    let mut accuracy_sum = 0.0;
    let mut batches = 0usize;

    for batch in loader.iter() {
        let (images, targets) = batch_views(&batch)?;

        let probs = ctx.model.forward(images);
        let loss = binary_cross_entropy(probs.clone(), targets.clone());

        let batch_loss: f64 = loss.clone().into_scalar().elem();
        let batch_accuracy = accuracy(probs, targets);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &ctx.model);
        ctx.model = ctx.optimizer.step(lr, ctx.model.clone(), grads);

        loss_sum += batch_loss;
        accuracy_sum += batch_accuracy;
        batches += 1;

        debug!(
            "Epoch {} batch {}: loss {:.4}, accuracy {:.2}%",
            epoch, batches, batch_loss, batch_accuracy
        );
    }

    if batches == 0 {
        return Err(Error::BatchProcessing(
            "training loader produced no batches".to_string(),
        ));
    }

    let metrics = EpochMetrics {
        loss: loss_sum / batches as f64,
        accuracy: accuracy_sum / batches as f64,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };
    info!(
        "Epoch {} train: loss {:.4}, accuracy {:.2}%, lr {:.2e}, {:.1}s",
        epoch, metrics.loss, metrics.accuracy, lr, metrics.elapsed_seconds
    );

    Ok(metrics)
}

/// Run one validation epoch on the non-autodiff copy of the model, then
/// persist the checkpoint iff the mean accuracy strictly beats the best
/// seen so far. Never updates model parameters.
pub fn validate_one_epoch<B: AutodiffBackend>(
    ctx: &TrainingContext<B>,
    loader: &dyn DataLoader<CatDogBatch<B::InnerBackend>>,
    tracker: &mut BestTracker,
    checkpoint: &Path,
    epoch: usize,
) -> Result<EpochMetrics> {
    let start = Instant::now();
    let model = ctx.model.valid();

    let mut loss_sum = 0.0;
    let mut accuracy_sum = 0.0;
    let mut batches = 0usize;

    for batch in loader.iter() {
        let (images, targets) = batch_views(&batch)?;

        let probs = model.forward(images);
        let loss = binary_cross_entropy(probs.clone(), targets.clone());

        loss_sum += loss.into_scalar().elem::<f64>();
        accuracy_sum += accuracy(probs, targets);
        batches += 1;
    }

    if batches == 0 {
        return Err(Error::BatchProcessing(
            "validation loader produced no batches".to_string(),
        ));
    }

    let metrics = EpochMetrics {
        loss: loss_sum / batches as f64,
        accuracy: accuracy_sum / batches as f64,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };
    info!(
        "Epoch {} validation: loss {:.4}, accuracy {:.2}%, {:.1}s",
        epoch, metrics.loss, metrics.accuracy, metrics.elapsed_seconds
    );

    if tracker.observe(metrics.accuracy) {
        model.save(checkpoint)?;
        info!(
            "New best validation accuracy {:.2}%, checkpoint saved to {:?}",
            tracker.best(),
            checkpoint
        );
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, TrainingBackend};
    use crate::dataset::{CatDogBatcher, CatDogItem};
    use burn::data::dataloader::DataLoaderBuilder;
    use burn::data::dataset::InMemDataset;

    const SIDE: usize = 16;

    fn synthetic_items(n: usize, labeled: bool) -> Vec<CatDogItem> {
        (0..n)
            .map(|i| CatDogItem {
                image: vec![(i as f32 % 7.0) / 7.0; 3 * SIDE * SIDE],
                size: SIDE,
                label: labeled.then_some((i % 2) as i64),
                path: format!("synthetic/{}.png", i),
            })
            .collect()
    }

    fn loader<B: burn::tensor::backend::Backend>(
        items: Vec<CatDogItem>,
        device: &B::Device,
    ) -> std::sync::Arc<dyn DataLoader<CatDogBatch<B>>> {
        let batcher = CatDogBatcher::<B>::new(device.clone(), SIDE);
        DataLoaderBuilder::new(batcher)
            .batch_size(4)
            .build(InMemDataset::new(items))
    }

    #[test]
    fn test_train_epoch_reports_finite_metrics() {
        let device = default_device();
        let mut ctx = TrainingContext::<TrainingBackend>::new(&device);
        let loader = loader::<TrainingBackend>(synthetic_items(8, true), &device);

        let metrics = train_one_epoch(&mut ctx, loader.as_ref(), 0).unwrap();

        assert!(metrics.loss.is_finite());
        assert!((0.0..=100.0).contains(&metrics.accuracy));
        assert!(metrics.elapsed_seconds >= 0.0);
    }

    #[test]
    fn test_unlabeled_batch_aborts_epoch() {
        let device = default_device();
        let mut ctx = TrainingContext::<TrainingBackend>::new(&device);
        let loader = loader::<TrainingBackend>(synthetic_items(4, false), &device);

        let err = train_one_epoch(&mut ctx, loader.as_ref(), 0).unwrap_err();
        assert!(matches!(err, Error::BatchProcessing(_)));
    }

    #[test]
    fn test_validation_writes_checkpoint_only_on_improvement() {
        let device = default_device();
        let ctx = TrainingContext::<TrainingBackend>::new(&device);
        let loader = loader(synthetic_items(8, true), &device);

        let dir = std::env::temp_dir().join(format!("catdog_val_ckpt_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let checkpoint = dir.join("best_model.mpk");

        let mut tracker = BestTracker::new();
        let first = validate_one_epoch(&ctx, loader.as_ref(), &mut tracker, &checkpoint, 0);

        if first.unwrap().accuracy > 0.0 {
            assert!(checkpoint.is_file());
        }

        // Same model, same data: no strict improvement, so no further write.
        let best_before = tracker.best();
        validate_one_epoch(&ctx, loader.as_ref(), &mut tracker, &checkpoint, 1).unwrap();
        assert_eq!(tracker.best(), best_before);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_batch_views_rejects_missing_targets() {
        let device = default_device();
        let batcher = CatDogBatcher::<crate::backend::DefaultBackend>::new(device, SIDE);
        let batch =
            burn::data::dataloader::batcher::Batcher::batch(&batcher, synthetic_items(2, false));

        let err = batch_views(&batch).unwrap_err();
        assert!(matches!(err, Error::BatchProcessing(_)));
    }
}
