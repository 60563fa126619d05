//! Simulation request configuration.

use equirisk_primitives::SimulationMethod;
use serde::{Deserialize, Serialize};

use crate::SimulationError;

/// Parameters of one simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Trading days simulated forward.
    pub days: usize,
    /// Number of simulated paths.
    pub num_simulations: usize,
    /// Confidence level of VaR and CVaR, in (0, 1).
    pub confidence: f64,
    /// Closes loaded per holding.
    pub lookback: usize,
    /// Path generator.
    pub method: SimulationMethod,
    /// Return observations required over the common trading days.
    pub min_data_points: usize,
    /// Seed for reproducible paths; drawn from the OS when unset.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 60,
            num_simulations: 10_000,
            confidence: 0.95,
            lookback: 252,
            method: SimulationMethod::default(),
            min_data_points: 60,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check the request for values no simulation can run with.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.days == 0 {
            return Err(SimulationError::InvalidConfig("days must be positive".to_string()));
        }
        if self.num_simulations == 0 {
            return Err(SimulationError::InvalidConfig("num_simulations must be positive".to_string()));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.min_data_points < 2 {
            return Err(SimulationError::InvalidConfig("min_data_points must be at least 2".to_string()));
        }
        if self.lookback <= self.min_data_points {
            return Err(SimulationError::InvalidConfig(format!(
                "lookback {} leaves fewer than {} returns",
                self.lookback, self.min_data_points
            )));
        }
        Ok(())
    }

    /// Set the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the path generator.
    #[must_use]
    pub const fn with_method(mut self, method: SimulationMethod) -> Self {
        self.method = method;
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_validate() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.method, SimulationMethod::Bootstrap);
        assert_eq!(config.seed, None);
    }

    #[rstest]
    #[case(SimulationConfig { days: 0, ..Default::default() })]
    #[case(SimulationConfig { num_simulations: 0, ..Default::default() })]
    #[case(SimulationConfig { confidence: 1.0, ..Default::default() })]
    #[case(SimulationConfig { confidence: f64::NAN, ..Default::default() })]
    #[case(SimulationConfig { lookback: 60, ..Default::default() })]
    fn rejects_unusable_requests(#[case] config: SimulationConfig) {
        assert!(matches!(config.validate(), Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SimulationConfig = serde_json::from_str(r#"{"days": 20, "method": "gbm"}"#).unwrap();
        assert_eq!(config.days, 20);
        assert_eq!(config.method, SimulationMethod::Gbm);
        assert_eq!(config.num_simulations, 10_000);
    }
}
