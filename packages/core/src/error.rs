//! Error types for classifier operations

use thiserror::Error;

/// Result type for classifier operations
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Errors that can occur while loading or running the classifier.
///
/// `Load` is only produced at startup and is deployment-blocking; the other
/// variants are per-request and recoverable.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Failed to read or parse the model or its labels
    #[error("Failed to load model: {0}")]
    Load(String),

    /// Request payload could not be decoded into an RGB image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Model execution failed
    #[error("Inference failed: {0}")]
    Inference(String),
}
