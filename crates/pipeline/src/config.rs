//! Pipeline thresholds.

use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Thresholds of the safety gate and the integrity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Active share of the region's stocks that must be exceeded before anything is
    /// computed.
    pub min_active_ratio: f64,
    /// Share of active stocks without a usable sector above which the integrity check
    /// warns.
    pub max_unclassified_ratio: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { min_active_ratio: 0.10, max_unclassified_ratio: 0.20 }
    }
}

impl PipelineConfig {
    /// Check that both ratios are proper fractions.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` naming the offending ratio.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..1.0).contains(&self.min_active_ratio) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_active_ratio must be in [0, 1), got {}",
                self.min_active_ratio
            )));
        }
        if !(self.max_unclassified_ratio > 0.0 && self.max_unclassified_ratio <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_unclassified_ratio must be in (0, 1], got {}",
                self.max_unclassified_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[rstest]
    #[case(1.0, 0.2)]
    #[case(-0.1, 0.2)]
    #[case(0.1, 0.0)]
    #[case(0.1, f64::NAN)]
    fn rejects_out_of_range_ratios(#[case] min_active_ratio: f64, #[case] max_unclassified_ratio: f64) {
        let config = PipelineConfig { min_active_ratio, max_unclassified_ratio };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
    }
}
