//! Dataset handling: on-disk sample listing, train/validation splitting,
//! image augmentation, and Burn DataLoader integration.

pub mod augmentation;
pub mod batcher;
pub mod index;

pub use augmentation::{Augmenter, Policy};
pub use batcher::{
    build_dataloader, CatDogBatch, CatDogBatcher, CatDogDataset, CatDogItem, DatasetMode,
};
pub use index::{
    list_test_samples, list_train_samples, split, Label, Sample, DEFAULT_SPLIT_SEED, VAL_FRACTION,
};
