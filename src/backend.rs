//! Backend selection for training and inference.
//!
//! The pipeline runs on the NdArray (CPU) backend; training wraps it in
//! Autodiff for gradient computation.

use burn::backend::{Autodiff, NdArray};

/// Inference backend (no gradient tracking)
pub type DefaultBackend = NdArray;

/// The autodiff backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device for the active backend
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    <DefaultBackend as burn::tensor::backend::Backend>::Device::default()
}
