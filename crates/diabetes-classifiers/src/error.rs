use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the training / inference pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Dataset missing, unreadable, or not matching the expected schema.
    #[error("Failed to load dataset {path}: {reason}")]
    DataLoad { path: PathBuf, reason: String },

    /// A transform or prediction was attempted before the component was fit.
    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    /// One of the persisted artifacts is absent; the caller should retrain.
    #[error("Model artifact not found: {path}")]
    ModelNotFound { path: PathBuf },

    /// A persisted artifact exists but cannot be used with this build.
    #[error("Incompatible model artifact {path}: {reason}")]
    IncompatibleArtifact { path: PathBuf, reason: String },

    /// Bad caller input: wrong feature count, non-numeric or out of range.
    #[error("Invalid features: {0}")]
    InvalidFeature(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Training input that no model can be fit on (empty partition, shape mismatch).
    #[error("Training failed: {0}")]
    Training(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// Whether the error can be resolved by training a fresh model.
    pub fn is_recoverable_by_training(&self) -> bool {
        matches!(
            self,
            PipelineError::ModelNotFound { .. } | PipelineError::IncompatibleArtifact { .. }
        )
    }

    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::DataLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
