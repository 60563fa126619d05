//! Price-derived inputs of the style factors.

use equirisk_math::ewm_std;
use serde::{Deserialize, Serialize};

/// Windows used to derive [`PriceFeatures`] from a close history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFeatureConfig {
    /// Closes required before the long momentum reference is defined.
    pub long_window: usize,
    /// Offset from the end of the history of the short momentum reference.
    pub short_window: usize,
    /// Half-life of the return volatility, in trading days.
    pub volatility_half_life: f64,
    /// Returns required before the volatility is defined.
    pub min_volatility_returns: usize,
}

impl Default for PriceFeatureConfig {
    fn default() -> Self {
        Self { long_window: 252, short_window: 21, volatility_half_life: 42.0, min_volatility_returns: 42 }
    }
}

/// Per-stock values taken from its trailing close history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceFeatures {
    /// Latest close.
    pub close: Option<f64>,
    /// Latest daily simple return.
    pub return_today: Option<f64>,
    /// Long momentum reference price.
    pub reference_long: Option<f64>,
    /// Short momentum reference price.
    pub reference_short: Option<f64>,
    /// EWM volatility of daily returns at the latest date.
    pub ewm_volatility: Option<f64>,
}

impl PriceFeatures {
    /// Derive features from closes in ascending date order.
    ///
    /// Fewer than two closes yield no features at all. The long reference is the latest
    /// close once the history covers `long_window` closes; the short reference is the
    /// close `short_window` observations from the end.
    #[must_use]
    pub fn from_closes(closes: &[f64], config: &PriceFeatureConfig) -> Self {
        let n = closes.len();
        if n < 2 {
            return Self::default();
        }

        let returns: Vec<f64> =
            closes.windows(2).map(|w| w[1] / w[0] - 1.0).filter(|r| r.is_finite()).collect();

        let volatility = if returns.len() >= config.min_volatility_returns {
            ewm_std(&returns, config.volatility_half_life)
        } else {
            None
        };

        let return_today = Some(closes[n - 1] / closes[n - 2] - 1.0).filter(|r| r.is_finite());

        Self {
            close: closes.last().copied(),
            return_today,
            reference_long: (n >= config.long_window).then_some(closes[n - 1]),
            reference_short: (config.short_window > 0 && n >= config.short_window)
                .then(|| closes[n - config.short_window]),
            ewm_volatility: volatility,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn short_history_has_no_features() {
        let features = PriceFeatures::from_closes(&[100.0], &PriceFeatureConfig::default());
        assert_eq!(features, PriceFeatures::default());
    }

    #[test]
    fn references_need_enough_closes() {
        let closes: Vec<f64> = (1..=30).map(f64::from).collect();
        let features = PriceFeatures::from_closes(&closes, &PriceFeatureConfig::default());

        assert_eq!(features.close, Some(30.0));
        assert_relative_eq!(features.return_today.unwrap(), 30.0 / 29.0 - 1.0);
        assert_eq!(features.reference_long, None);
        assert_eq!(features.reference_short, Some(10.0));
        assert_eq!(features.ewm_volatility, None);
    }

    #[test]
    fn undefined_latest_return_is_not_replaced() {
        let features = PriceFeatures::from_closes(&[100.0, 101.0, 0.0, 50.0], &PriceFeatureConfig::default());
        assert_eq!(features.return_today, None);
        assert_eq!(features.close, Some(50.0));
    }

    #[test]
    fn full_history() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + (f64::from(i) * 0.3).sin()).collect();
        let features = PriceFeatures::from_closes(&closes, &PriceFeatureConfig::default());

        assert_eq!(features.reference_long, Some(closes[299]));
        assert_eq!(features.reference_short, Some(closes[279]));
        assert!(features.ewm_volatility.unwrap() > 0.0);
    }
}
