//! Error types for the batch pipeline.

use equirisk_model::{ModelError, StoreError};

/// Errors that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A compute step could not finish.
    #[error("compute step failed: {0}")]
    Compute(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The logging subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// Factor model error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Collaborator storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Returns whether retrying may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_recoverable(),
            Self::Model(err) => err.is_recoverable(),
            _ => false,
        }
    }
}
