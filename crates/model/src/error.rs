//! Error types for factor model estimation.

use equirisk_math::MathError;
use equirisk_styles::StyleError;

use crate::StoreError;

/// Errors that can occur during factor model estimation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Exposure computation error.
    #[error("style error: {0}")]
    Style(#[from] StyleError),

    /// Collaborator storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Missing required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dimension mismatch.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl ModelError {
    /// Returns whether this error is recoverable.
    ///
    /// A singular regression or a transient storage failure may succeed on the next
    /// run; configuration and shape errors will not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Math(MathError::LinearAlgebra(_)) => true,
            Self::Store(err) => err.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::MissingColumn("market".to_string());
        assert!(err.to_string().contains("market"));
    }

    #[test]
    fn error_is_recoverable() {
        let err = ModelError::Math(MathError::LinearAlgebra("singular".to_string()));
        assert!(err.is_recoverable());

        let err = ModelError::Store(StoreError::Unavailable("connection reset".to_string()));
        assert!(err.is_recoverable());

        let err = ModelError::InvalidConfig("test".to_string());
        assert!(!err.is_recoverable());
    }
}
