//! Portfolio analysis configuration.

use serde::{Deserialize, Serialize};

use crate::PortfolioError;

/// Windows and thresholds of a portfolio analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Closes loaded per holding.
    pub lookback: usize,
    /// Common trading days required for hypothetical returns.
    pub min_data_points: usize,
    /// Common trading days required for the return covariance and the chart.
    pub min_matrix_days: usize,
    /// Return observations required for a risk score, and benchmark closes required
    /// for benchmark volatility.
    pub min_score_observations: usize,
    /// Trading days per year.
    pub trading_days: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback: 252,
            min_data_points: 60,
            min_matrix_days: 30,
            min_score_observations: 20,
            trading_days: 252.0,
        }
    }
}

impl AnalysisConfig {
    /// Check the configuration for values the analysis cannot work with.
    ///
    /// # Errors
    /// Returns `PortfolioError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        if self.lookback < 2 {
            return Err(PortfolioError::InvalidConfig("lookback must be at least 2".to_string()));
        }
        if self.min_data_points < 2 || self.min_score_observations < 2 {
            return Err(PortfolioError::InvalidConfig("minimum observation counts must be at least 2".to_string()));
        }
        if self.min_matrix_days < 3 {
            return Err(PortfolioError::InvalidConfig("min_matrix_days must be at least 3".to_string()));
        }
        if self.trading_days <= 0.0 {
            return Err(PortfolioError::InvalidConfig("trading_days must be positive".to_string()));
        }
        Ok(())
    }

    /// Closes of the benchmark to load: one more than the lookback.
    #[must_use]
    pub const fn benchmark_limit(&self) -> usize {
        self.lookback + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.benchmark_limit(), 253);
    }

    #[test]
    fn zero_lookback_rejected() {
        let config = AnalysisConfig { lookback: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PortfolioError::InvalidConfig(_))));
    }
}
