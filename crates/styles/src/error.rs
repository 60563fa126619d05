//! Error types for style factors.

use equirisk_primitives::StockId;

/// Errors that can occur during style factor computation.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// Math operation error.
    #[error("math error: {0}")]
    Math(#[from] equirisk_math::MathError),

    /// The same stock appears twice in one cross-section.
    #[error("duplicate stock in cross-section: {0}")]
    DuplicateStock(StockId),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StyleError::InvalidConfig("bad parameter".to_string());
        assert!(err.to_string().contains("bad parameter"));

        let err = StyleError::DuplicateStock(StockId::new(42));
        assert!(err.to_string().contains("42"));
    }
}
