//! Inference Helper
//!
//! Loads the best checkpoint and classifies single images using the
//! deterministic evaluation transform. Classification is a sigmoid
//! threshold on the single output unit: probability >= 0.5 means cat.

use std::path::{Path, PathBuf};

use burn::tensor::{ElementConversion, Tensor, TensorData};
use image::{imageops::FilterType, ImageReader};
use rand::thread_rng;
use tracing::info;

use crate::backend::{default_device, DefaultBackend};
use crate::dataset::{list_test_samples, Augmenter, Label};
use crate::model::{CatDogClassifier, CatDogClassifierConfig};
use crate::utils::error::{Error, Result};
use crate::IMAGE_SIZE;

/// A single classification verdict
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,
    /// Probability of the positive class (cat), in [0, 1]
    pub probability: f64,
}

/// Checkpoint-backed single-image classifier
#[derive(Debug)]
pub struct Predictor {
    model: CatDogClassifier<DefaultBackend>,
    augmenter: Augmenter,
    device: <DefaultBackend as burn::tensor::backend::Backend>::Device,
}

impl Predictor {
    /// Load the model from a checkpoint file.
    ///
    /// A missing file fails with [`Error::CheckpointNotFound`]; a file the
    /// recorder cannot decode into this architecture fails with
    /// [`Error::CheckpointFormat`].
    pub fn from_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::CheckpointNotFound(path.to_path_buf()));
        }

        let device = default_device();
        let model = CatDogClassifier::new(&CatDogClassifierConfig::new(), &device)
            .load(path, &device)?;
        info!("Loaded checkpoint from {:?}", path);

        Ok(Self {
            model,
            augmenter: Augmenter::eval(),
            device,
        })
    }

    /// Classify the image at `path`.
    pub fn predict_image<P: AsRef<Path>>(&self, path: P) -> Result<Prediction> {
        let path = path.as_ref();
        let img = ImageReader::open(path)
            .map_err(|e| Error::Image(path.to_path_buf(), e.to_string()))?
            .decode()
            .map_err(|e| Error::Image(path.to_path_buf(), e.to_string()))?;

        // The evaluation policy draws nothing from the RNG.
        let pixels = self.augmenter.apply(&img, &mut thread_rng());
        let size = self.augmenter.output_size();
        let input = Tensor::<DefaultBackend, 4>::from_floats(
            TensorData::new(pixels, [1, 3, size, size]),
            &self.device,
        );

        let probability: f64 = self.model.forward(input).into_scalar().elem();
        let label = if probability >= 0.5 {
            Label::Cat
        } else {
            Label::Dog
        };

        Ok(Prediction { label, probability })
    }

    /// Classify the `index`-th image of the sorted test listing under
    /// `test_dir`. Out-of-range indices are clamped to the last sample.
    ///
    /// When `preview` is given, the resized input image is also written
    /// there as a PNG.
    pub fn predict_index<P: AsRef<Path>>(
        &self,
        test_dir: P,
        index: usize,
        preview: Option<&Path>,
    ) -> Result<(PathBuf, Prediction)> {
        let samples = list_test_samples(test_dir)?;
        let index = index.min(samples.len() - 1);
        let path = samples[index].path.clone();

        if let Some(preview_path) = preview {
            let img = ImageReader::open(&path)
                .map_err(|e| Error::Image(path.clone(), e.to_string()))?
                .decode()
                .map_err(|e| Error::Image(path.clone(), e.to_string()))?;
            let resized = img.resize_exact(
                IMAGE_SIZE as u32,
                IMAGE_SIZE as u32,
                FilterType::Triangle,
            );
            if let Some(parent) = preview_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            resized
                .save(preview_path)
                .map_err(|e| Error::Image(preview_path.to_path_buf(), e.to_string()))?;
        }

        let prediction = self.predict_image(&path)?;
        Ok((path, prediction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("catdog_pred_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_checkpoint_is_not_found() {
        let err = Predictor::from_checkpoint(temp_path("no_such.mpk")).unwrap_err();
        assert!(matches!(err, Error::CheckpointNotFound(_)));
    }

    #[test]
    fn test_garbage_checkpoint_is_format_error() {
        let path = temp_path("garbage.mpk");
        std::fs::write(&path, b"definitely not a model record").unwrap();

        let err = Predictor::from_checkpoint(&path).unwrap_err();
        assert!(matches!(err, Error::CheckpointFormat(_)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_predict_from_saved_model() {
        let device = default_device();
        let model = CatDogClassifier::<DefaultBackend>::new(&CatDogClassifierConfig::new(), &device);

        let checkpoint = temp_path("trained.mpk");
        model.save(&checkpoint).unwrap();

        let image_path = temp_path("sample.png");
        let buf: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(32, 32, Rgb([90, 140, 200]));
        buf.save(&image_path).unwrap();

        let predictor = Predictor::from_checkpoint(&checkpoint).unwrap();
        let prediction = predictor.predict_image(&image_path).unwrap();

        assert!((0.0..=1.0).contains(&prediction.probability));
        let expected = if prediction.probability >= 0.5 {
            Label::Cat
        } else {
            Label::Dog
        };
        assert_eq!(prediction.label, expected);

        std::fs::remove_file(&checkpoint).ok();
        std::fs::remove_file(&image_path).ok();
    }

    #[test]
    fn test_predict_index_clamps_and_writes_preview() {
        let device = default_device();
        let model = CatDogClassifier::<DefaultBackend>::new(&CatDogClassifierConfig::new(), &device);
        let checkpoint = temp_path("index.mpk");
        model.save(&checkpoint).unwrap();

        let dir = temp_path("test_dir");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["1.png", "2.png"] {
            let buf: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(16, 16, Rgb([5, 5, 5]));
            buf.save(dir.join(name)).unwrap();
        }

        let predictor = Predictor::from_checkpoint(&checkpoint).unwrap();
        let preview = temp_path("preview.png");

        // Index far past the end resolves to the last sample.
        let (path, _) = predictor.predict_index(&dir, 99, Some(&preview)).unwrap();
        assert_eq!(path, dir.join("2.png"));
        assert!(preview.is_file());

        std::fs::remove_file(&checkpoint).ok();
        std::fs::remove_file(&preview).ok();
        std::fs::remove_dir_all(&dir).ok();
    }
}
