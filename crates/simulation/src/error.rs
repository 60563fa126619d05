//! Error types for portfolio simulation.

use equirisk_math::MathError;
use equirisk_model::StoreError;

/// Errors that can occur while simulating a portfolio.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The portfolio holds nothing to simulate.
    #[error("portfolio has no holdings")]
    NoHoldings,

    /// Too few common trading days, even after dropping short histories.
    #[error("insufficient common trading days: {actual}/{required}")]
    InsufficientData {
        /// Return observations required.
        required: usize,
        /// Return observations available.
        actual: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Collaborator storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SimulationError {
    /// Returns whether retrying may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_recoverable(),
            _ => false,
        }
    }

    /// Whether the request itself cannot be served, as opposed to a backend failure.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::NoHoldings | Self::InsufficientData { .. } | Self::InvalidConfig(_))
    }
}
