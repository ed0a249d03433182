//! Error Handling Module
//!
//! Defines custom error types for the cat/dog training pipeline.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Data directory missing or contains no usable samples
    #[error("No image data found at '{0}'")]
    DataNotFound(PathBuf),

    /// A batch could not be moved through the model
    #[error("Batch processing failed: {0}")]
    BatchProcessing(String),

    /// Stored checkpoint does not match the current model
    #[error("Checkpoint format mismatch: {0}")]
    CheckpointFormat(String),

    /// Inference requested before any checkpoint exists
    #[error("No checkpoint found at '{0}'")]
    CheckpointNotFound(PathBuf),

    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    Image(PathBuf, String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::BatchProcessing("shape mismatch".to_string());
        assert_eq!(format!("{}", err), "Batch processing failed: shape mismatch");
    }

    #[test]
    fn test_checkpoint_not_found_display() {
        let err = Error::CheckpointNotFound(PathBuf::from("output/best_model.mpk"));
        assert!(format!("{}", err).contains("best_model.mpk"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
