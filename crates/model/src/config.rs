//! Factor model run configuration.

use equirisk_styles::{ExposureConfig, PriceFeatureConfig};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Thresholds and windows of the daily factor model run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorModelConfig {
    /// Eligible stocks required before a market is regressed.
    pub min_eligible_stocks: usize,
    /// Complete design-matrix rows with a return required for the regression.
    pub min_valid_rows: usize,
    /// Distinct factor-return dates required before covariance is estimated.
    pub min_covariance_days: usize,
    /// Half-life of the factor covariance, in trading days.
    pub factor_half_life: f64,
    /// Half-life of specific variance, in trading days.
    pub specific_half_life: f64,
    /// Closes loaded per stock.
    pub price_limit: usize,
    /// Most recent factor-return dates fed to the covariance estimator.
    pub covariance_history: usize,
    /// Annual risk-free rate in percent used when the market's country has none.
    pub default_risk_free_rate: f64,
    /// Trading days per year.
    pub trading_days: f64,
    /// Price feature windows.
    pub prices: PriceFeatureConfig,
    /// Exposure standardisation.
    pub exposures: ExposureConfig,
}

impl Default for FactorModelConfig {
    fn default() -> Self {
        Self {
            min_eligible_stocks: 30,
            min_valid_rows: 30,
            min_covariance_days: 90,
            factor_half_life: 90.0,
            specific_half_life: 42.0,
            price_limit: 300,
            covariance_history: 252,
            default_risk_free_rate: 3.0,
            trading_days: 252.0,
            prices: PriceFeatureConfig::default(),
            exposures: ExposureConfig::default(),
        }
    }
}

impl FactorModelConfig {
    /// Check the configuration for values the run cannot work with.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.factor_half_life <= 0.0 || self.specific_half_life <= 0.0 {
            return Err(ModelError::InvalidConfig("half-lives must be positive".to_string()));
        }
        if self.trading_days <= 0.0 {
            return Err(ModelError::InvalidConfig("trading_days must be positive".to_string()));
        }
        if self.covariance_history < 2 {
            return Err(ModelError::InvalidConfig("covariance_history must be at least 2".to_string()));
        }
        if self.price_limit < 2 {
            return Err(ModelError::InvalidConfig("price_limit must be at least 2".to_string()));
        }
        Ok(())
    }

    /// Daily risk-free rate from an annual rate in percent.
    #[must_use]
    pub fn daily_risk_free(&self, annual_pct: Option<f64>) -> f64 {
        annual_pct.unwrap_or(self.default_risk_free_rate) / 100.0 / self.trading_days
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn defaults_validate() {
        let config = FactorModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_covariance_days, 90);
        assert_relative_eq!(config.prices.volatility_half_life, 42.0);
    }

    #[test]
    fn daily_rate_falls_back_to_default() {
        let config = FactorModelConfig::default();
        assert_relative_eq!(config.daily_risk_free(None), 3.0 / 100.0 / 252.0);
        assert_relative_eq!(config.daily_risk_free(Some(5.04)), 0.0002, epsilon = 1e-15);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: FactorModelConfig = serde_json::from_str(r#"{"min_eligible_stocks": 50}"#).unwrap();
        assert_eq!(config.min_eligible_stocks, 50);
        assert_eq!(config.min_valid_rows, 30);
    }

    #[test]
    fn invalid_half_life_rejected() {
        let config = FactorModelConfig { factor_half_life: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));
    }
}
