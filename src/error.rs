//! Error types for per-request inference
//!
//! Artifact loading and service plumbing report through `anyhow`; a single
//! request can only fail in the ways listed here.

use thiserror::Error;

/// Failure of a single prediction request.
///
/// Reconstruction and scaling never fail for unknown categories, so these are
/// the only errors a caller of `assess`/`predict` has to handle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// The underlying model call raised; carries the original cause message
    #[error("Prediction error: {0}")]
    Inference(String),

    /// The requested model name is not part of the loaded bundle set
    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

impl PredictionError {
    /// Wrap any model-side failure into the uniform inference error.
    pub fn inference(cause: impl std::fmt::Display) -> Self {
        PredictionError::Inference(cause.to_string())
    }
}

/// Convenience Result type for prediction calls
pub type PredictionOutcome<T> = std::result::Result<T, PredictionError>;
