//! Sample Index
//!
//! Enumerates raw image files on disk, derives labels from filename
//! prefixes, and splits labeled samples into train/validation sets.
//!
//! The expected layout follows the `label.id.ext` naming convention:
//!
//! ```text
//! Data/train/dog.1.jpg
//! Data/train/cat.12.jpg
//! Data/test/301.jpg
//! ```

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{Error, Result};

/// File extensions accepted as image samples
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Fraction of labeled samples held out for validation
pub const VAL_FRACTION: f64 = 0.25;

/// Fixed seed for the train/validation split, for reproducible runs
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Binary class label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Dog,
    Cat,
}

impl Label {
    /// Numeric class index used by the model (dog = 0, cat = 1)
    pub fn index(self) -> i64 {
        match self {
            Label::Dog => 0,
            Label::Cat => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::Dog => "dog",
            Label::Cat => "cat",
        }
    }

    /// Parse a label from the filename substring before the first `.`
    pub fn from_filename(filename: &str) -> Option<Self> {
        match filename.split('.').next() {
            Some("dog") => Some(Label::Dog),
            Some("cat") => Some(Label::Cat),
            _ => None,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single data item, immutable once listed.
///
/// `label` is absent for test samples.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Path to the image file
    pub path: PathBuf,
    /// File name, used as the sample identifier
    pub id: String,
    /// Class label, derived from the filename prefix
    pub label: Option<Label>,
}

fn list_dir(dir: &Path, require_label: bool) -> Result<Vec<Sample>> {
    if !dir.is_dir() {
        return Err(Error::DataNotFound(dir.to_path_buf()));
    }

    let mut samples = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path().to_path_buf();
        let Some(ext) = path.extension() else {
            continue;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let id = entry.file_name().to_string_lossy().to_string();
        let label = Label::from_filename(&id);
        if require_label && label.is_none() {
            debug!("Skipping file without a recognized label prefix: {:?}", path);
            continue;
        }

        samples.push(Sample {
            path,
            id,
            label: if require_label { label } else { None },
        });
    }

    if samples.is_empty() {
        return Err(Error::DataNotFound(dir.to_path_buf()));
    }

    // Deterministic base order before any seeded shuffle
    samples.sort_by(|a, b| a.id.cmp(&b.id));

    info!("Listed {} samples from {:?}", samples.len(), dir);
    Ok(samples)
}

/// Enumerate labeled training images under `dir`.
///
/// Fails with [`Error::DataNotFound`] when the directory is missing or no
/// labeled image files are present.
pub fn list_train_samples<P: AsRef<Path>>(dir: P) -> Result<Vec<Sample>> {
    list_dir(dir.as_ref(), true)
}

/// Enumerate unlabeled test images under `dir`.
pub fn list_test_samples<P: AsRef<Path>>(dir: P) -> Result<Vec<Sample>> {
    list_dir(dir.as_ref(), false)
}

/// Randomly partition `samples` into (train, validation) sets.
///
/// The shuffle is driven by a ChaCha8 RNG seeded with `seed`, so the split
/// is reproducible. The two sets are disjoint and together cover the input.
pub fn split(mut samples: Vec<Sample>, val_fraction: f64, seed: u64) -> (Vec<Sample>, Vec<Sample>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let n = samples.len();
    let n_val = ((n as f64) * val_fraction).round() as usize;
    let n_val = n_val.min(n);

    let val = samples.split_off(n - n_val);
    (samples, val)
}
