//! Error types for the head scroll library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The landmark sampler cannot produce another frame (device gone, etc.)
    #[error("Landmark sampler unavailable: {0}")]
    SampleUnavailable(String),

    /// An observation that contradicts itself (position without a face, or
    /// a face without a finite position)
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// The action dispatcher failed to perform a side effect
    #[error("Action dispatcher failed: {0}")]
    Dispatch(String),

    /// Model loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Model output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Model data shape or format error
    #[error("Model data format error: {0}")]
    ModelDataFormatError(String),

    /// Filter initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
