//! Batch Source
//!
//! Burn Dataset + Batcher integration. Samples are decoded and augmented
//! fresh on every access (training augmentation is stochastic, so items are
//! never cached), then stacked into `[N, 3, H, W]` tensors. Batching,
//! per-epoch shuffling, and parallel prefetch come from Burn's DataLoader;
//! prefetch workers only produce batches and never touch model state.

use std::sync::Arc;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::ImageReader;
use rand::thread_rng;
use tracing::warn;

use crate::dataset::augmentation::Augmenter;
use crate::dataset::index::Sample;
use crate::training::{BATCH_SIZE, NUM_WORKERS};

/// Which role a dataset plays, resolved once at construction.
///
/// Train selects the stochastic augmentation policy; Validate and Test use
/// the deterministic evaluation policy, and Test produces no labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetMode {
    Train,
    Validate,
    Test,
}

/// A single decoded, augmented item ready for batching
#[derive(Debug, Clone)]
pub struct CatDogItem {
    /// Flattened CHW float image, `[3 * size * size]`
    pub image: Vec<f32>,
    /// Spatial side length of the image tensor
    pub size: usize,
    /// Class index (0 dog, 1 cat); absent in test mode
    pub label: Option<i64>,
    /// Source path, for diagnostics
    pub path: String,
}

/// Lazily-loading dataset over listed samples
#[derive(Debug, Clone)]
pub struct CatDogDataset {
    samples: Vec<Sample>,
    mode: DatasetMode,
    augmenter: Augmenter,
}

impl CatDogDataset {
    pub fn new(samples: Vec<Sample>, mode: DatasetMode) -> Self {
        let augmenter = match mode {
            DatasetMode::Train => Augmenter::train(),
            DatasetMode::Validate | DatasetMode::Test => Augmenter::eval(),
        };
        Self {
            samples,
            mode,
            augmenter,
        }
    }

    pub fn mode(&self) -> DatasetMode {
        self.mode
    }

    /// Side length of the tensors this dataset produces
    pub fn image_size(&self) -> usize {
        self.augmenter.output_size()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl Dataset<CatDogItem> for CatDogDataset {
    fn get(&self, index: usize) -> Option<CatDogItem> {
        let sample = self.samples.get(index)?;

        let img = match ImageReader::open(&sample.path).and_then(|r| {
            r.decode()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        }) {
            Ok(img) => img,
            Err(e) => {
                warn!("Failed to decode image {:?}: {}", sample.path, e);
                return None;
            }
        };

        let image = self.augmenter.apply(&img, &mut thread_rng());

        let label = match self.mode {
            DatasetMode::Train | DatasetMode::Validate => sample.label.map(|l| l.index()),
            DatasetMode::Test => None,
        };

        Some(CatDogItem {
            image,
            size: self.augmenter.output_size(),
            label,
            path: sample.path.to_string_lossy().to_string(),
        })
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of images, with targets when labels are available
#[derive(Debug, Clone)]
pub struct CatDogBatch<B: Backend> {
    /// Shape `[batch_size, 3, height, width]`
    pub images: Tensor<B, 4>,
    /// Shape `[batch_size]`; absent for test batches
    pub targets: Option<Tensor<B, 1, Int>>,
}

/// Stacks items into batch tensors on a target device
#[derive(Debug, Clone)]
pub struct CatDogBatcher<B: Backend> {
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> CatDogBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<CatDogItem, CatDogBatch<B>> for CatDogBatcher<B> {
    fn batch(&self, items: Vec<CatDogItem>) -> CatDogBatch<B> {
        let batch_size = items.len();
        let size = self.image_size;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, size, size]),
            &self.device,
        );

        let targets = if items.iter().all(|item| item.label.is_some()) && batch_size > 0 {
            let targets_data: Vec<i64> = items.iter().filter_map(|item| item.label).collect();
            Some(Tensor::<B, 1, Int>::from_data(
                TensorData::new(targets_data, [batch_size]),
                &self.device,
            ))
        } else {
            None
        };

        CatDogBatch { images, targets }
    }
}

/// Build a data loader over the dataset: fixed batch size, optional
/// per-traversal shuffling, and a bounded pool of prefetch workers.
pub fn build_dataloader<B: Backend>(
    dataset: CatDogDataset,
    device: &B::Device,
    shuffle_seed: Option<u64>,
) -> Arc<dyn DataLoader<CatDogBatch<B>>> {
    let batcher = CatDogBatcher::<B>::new(device.clone(), dataset.image_size());

    let mut builder = DataLoaderBuilder::new(batcher)
        .batch_size(BATCH_SIZE)
        .num_workers(NUM_WORKERS);
    if let Some(seed) = shuffle_seed {
        builder = builder.shuffle(seed);
    }

    builder.build(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};
    use crate::dataset::index::{list_train_samples, Label};
    use crate::IMAGE_SIZE;
    use image::{ImageBuffer, Rgb};

    /// Write four tiny labeled images into a fresh temp directory.
    fn fixture_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("catdog_fixture_{}_{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["dog.1.png", "dog.2.png", "cat.1.png", "cat.2.png"] {
            let buf: ImageBuffer<Rgb<u8>, Vec<u8>> =
                ImageBuffer::from_pixel(8, 8, Rgb([120, 60, 30]));
            buf.save(dir.join(name)).unwrap();
        }
        dir
    }

    #[test]
    fn test_two_batches_of_two() {
        // 4 samples, batch size 2, no shuffle -> exactly 2 full batches.
        let dir = fixture_dir("two_batches");
        let samples = list_train_samples(&dir).unwrap();
        assert_eq!(samples.len(), 4);

        let dataset = CatDogDataset::new(samples, DatasetMode::Validate);
        let device = default_device();
        let batcher = CatDogBatcher::<DefaultBackend>::new(device, dataset.image_size());

        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(2)
            .build(dataset);

        let mut batch_sizes = Vec::new();
        for batch in loader.iter() {
            let dims = batch.images.dims();
            assert_eq!(dims[1], 3);
            assert_eq!(dims[2], IMAGE_SIZE);
            assert_eq!(dims[3], IMAGE_SIZE);
            batch_sizes.push(dims[0]);

            let targets = batch.targets.expect("labeled batch must carry targets");
            assert_eq!(targets.dims()[0], dims[0]);
        }

        assert_eq!(batch_sizes, vec![2, 2]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_test_mode_has_no_targets() {
        let dir = fixture_dir("no_targets");
        let samples = list_train_samples(&dir).unwrap();
        let dataset = CatDogDataset::new(samples, DatasetMode::Test);

        let item = dataset.get(0).unwrap();
        assert!(item.label.is_none());
        assert_eq!(item.image.len(), 3 * IMAGE_SIZE * IMAGE_SIZE);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_train_mode_produces_crop_sized_items() {
        let dir = fixture_dir("crop_items");
        let samples = list_train_samples(&dir).unwrap();
        let dataset = CatDogDataset::new(samples, DatasetMode::Train);

        let item = dataset.get(0).unwrap();
        assert_eq!(item.size, crate::CROP_SIZE);
        assert_eq!(item.image.len(), 3 * crate::CROP_SIZE * crate::CROP_SIZE);
        assert_eq!(item.label, Some(Label::Cat.index()));

        std::fs::remove_dir_all(&dir).ok();
    }
}
