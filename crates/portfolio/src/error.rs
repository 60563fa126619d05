//! Error types for portfolio analytics.

use equirisk_math::MathError;
use equirisk_model::{ModelError, StoreError};

/// Errors that can occur while analysing a portfolio.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    /// Too few aligned observations for the requested computation.
    #[error("insufficient data: {actual}/{required} observations")]
    InsufficientData {
        /// Observations required.
        required: usize,
        /// Observations available.
        actual: usize,
    },

    /// Vector and matrix shapes disagree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Factor model error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Collaborator storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PortfolioError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_display() {
        let err = PortfolioError::InsufficientData { required: 30, actual: 12 };
        assert_eq!(err.to_string(), "insufficient data: 12/30 observations");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn transient_store_failure_is_recoverable() {
        let err: PortfolioError = StoreError::Unavailable("pool exhausted".to_string()).into();
        assert!(err.is_recoverable());
    }
}
