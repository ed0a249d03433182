//! Model architecture and the loss/metric functions that go with it.

pub mod classifier;

pub use classifier::{accuracy, binary_cross_entropy, CatDogClassifier, CatDogClassifierConfig};
