//! Portfolio risk score relative to the benchmark.

use std::fmt;

use equirisk_math::stats::{self, round_to};
use equirisk_primitives::{PriceBar, RiskTier};
use serde::Serialize;

use crate::AnalysisConfig;

/// Why a portfolio could not be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnknownReason {
    /// Too few return observations.
    #[serde(rename = "Insufficient data")]
    InsufficientData,
    /// Benchmark volatility missing or zero.
    #[serde(rename = "Benchmark data unavailable")]
    BenchmarkUnavailable,
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InsufficientData => "Insufficient data",
            Self::BenchmarkUnavailable => "Benchmark data unavailable",
        })
    }
}

/// Portfolio volatility scaled against the benchmark: 50 means equal volatility.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "RiskScoreRepr")]
pub enum RiskScore {
    /// A score could be computed.
    Scored {
        /// Score on the 0..=100 scale.
        score: f64,
        /// Tier of the score.
        tier: RiskTier,
        /// Annualised portfolio volatility.
        portfolio_vol: f64,
        /// Annualised benchmark volatility.
        benchmark_vol: f64,
        /// Return observations behind the portfolio volatility.
        effective_lookback: usize,
    },
    /// Not enough data; the tier is [`RiskTier::Unknown`].
    Unknown {
        /// Missing input.
        reason: UnknownReason,
        /// Common history that was available, when known.
        effective_lookback: Option<usize>,
    },
}

impl RiskScore {
    /// Tier of the score.
    #[must_use]
    pub const fn tier(&self) -> RiskTier {
        match self {
            Self::Scored { tier, .. } => *tier,
            Self::Unknown { .. } => RiskTier::Unknown,
        }
    }

    /// Score, if one was computed.
    #[must_use]
    pub const fn score(&self) -> Option<f64> {
        match self {
            Self::Scored { score, .. } => Some(*score),
            Self::Unknown { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct RiskScoreRepr {
    score: Option<f64>,
    tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    portfolio_vol: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    benchmark_vol: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    effective_lookback: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<UnknownReason>,
}

impl From<RiskScore> for RiskScoreRepr {
    fn from(score: RiskScore) -> Self {
        match score {
            RiskScore::Scored { score, tier, portfolio_vol, benchmark_vol, effective_lookback } => Self {
                score: Some(score),
                tier,
                portfolio_vol: Some(portfolio_vol),
                benchmark_vol: Some(benchmark_vol),
                effective_lookback: Some(effective_lookback),
                reason: None,
            },
            RiskScore::Unknown { reason, effective_lookback } => Self {
                score: None,
                tier: RiskTier::Unknown,
                portfolio_vol: None,
                benchmark_vol: None,
                effective_lookback,
                reason: Some(reason),
            },
        }
    }
}

/// Annualised sample volatility of daily returns.
#[must_use]
pub fn annualized_volatility(returns: &[f64], trading_days: f64) -> Option<f64> {
    stats::sample_std(returns).map(|std| std * trading_days.sqrt())
}

/// Annualised volatility of the benchmark over its last `lookback` returns.
///
/// `None` with fewer than `config.min_score_observations` closes.
#[must_use]
pub fn benchmark_volatility(bars: &[PriceBar], lookback: usize, config: &AnalysisConfig) -> Option<f64> {
    if bars.len() < config.min_score_observations {
        return None;
    }
    let recent = &bars[bars.len().saturating_sub(lookback + 1)..];
    let returns: Vec<f64> = recent.windows(2).map(|w| w[1].close_f64() / w[0].close_f64() - 1.0).collect();
    annualized_volatility(&returns, config.trading_days)
}

/// Score daily portfolio returns against a benchmark volatility.
///
/// `score = min(50 * portfolio_vol / benchmark_vol, 100)`, rounded to 2 decimals;
/// volatilities are reported to 6.
#[must_use]
pub fn compute_risk_score(
    returns: &[f64],
    effective_lookback: usize,
    benchmark_vol: Option<f64>,
    config: &AnalysisConfig,
) -> RiskScore {
    let portfolio_vol = (returns.len() >= config.min_score_observations)
        .then(|| annualized_volatility(returns, config.trading_days))
        .flatten();
    let Some(portfolio_vol) = portfolio_vol else {
        return RiskScore::Unknown { reason: UnknownReason::InsufficientData, effective_lookback: None };
    };
    let Some(benchmark_vol) = benchmark_vol.filter(|v| *v != 0.0 && v.is_finite()) else {
        return RiskScore::Unknown { reason: UnknownReason::BenchmarkUnavailable, effective_lookback: None };
    };

    let score = (portfolio_vol / benchmark_vol * 50.0).min(100.0);
    RiskScore::Scored {
        score: round_to(score, 2),
        tier: RiskTier::from_score(score),
        portfolio_vol: round_to(portfolio_vol, 6),
        benchmark_vol: round_to(benchmark_vol, 6),
        effective_lookback,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use equirisk_primitives::Date;
    use rust_decimal::Decimal;

    use super::*;

    fn alternating(n: usize, amplitude: f64) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { amplitude } else { -amplitude }).collect()
    }

    #[test]
    fn double_volatility_hits_warning() {
        let config = AnalysisConfig::default();
        let returns = alternating(40, 0.02);
        let bench = annualized_volatility(&alternating(40, 0.01), 252.0);

        let score = compute_risk_score(&returns, 40, bench, &config);
        assert_relative_eq!(score.score().unwrap(), 100.0);
        assert_eq!(score.tier(), RiskTier::Warning);
    }

    #[test]
    fn score_is_capped() {
        let config = AnalysisConfig::default();
        let score = compute_risk_score(&alternating(40, 0.05), 40, Some(0.01), &config);
        assert_eq!(score.score(), Some(100.0));
    }

    #[test]
    fn too_few_returns_are_unknown() {
        let config = AnalysisConfig::default();
        let score = compute_risk_score(&alternating(19, 0.01), 19, Some(0.2), &config);
        assert_eq!(score, RiskScore::Unknown { reason: UnknownReason::InsufficientData, effective_lookback: None });
    }

    #[test]
    fn zero_benchmark_vol_is_unavailable() {
        let config = AnalysisConfig::default();
        let score = compute_risk_score(&alternating(30, 0.01), 30, Some(0.0), &config);
        assert_eq!(score.tier(), RiskTier::Unknown);
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["reason"], "Benchmark data unavailable");
        assert!(json["score"].is_null());
        assert_eq!(json["tier"], "UNKNOWN");
    }

    #[test]
    fn benchmark_needs_twenty_closes() {
        let config = AnalysisConfig::default();
        let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<PriceBar> = (0..19u64)
            .map(|d| PriceBar::new(start + chrono::Days::new(d), Decimal::from(100 + d % 3)))
            .collect();
        assert!(benchmark_volatility(&bars, 252, &config).is_none());
    }

    #[test]
    fn benchmark_uses_latest_window() {
        let config = AnalysisConfig::default();
        let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
        // Flat for 30 days, then alternating; a 10-return window sees only the swings.
        let closes = (0..30).map(|_| 100.0).chain((0..11).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }));
        let bars: Vec<PriceBar> = closes
            .enumerate()
            .map(|(d, c)| PriceBar::new(start + chrono::Days::new(d as u64), Decimal::from_f64_retain(c).unwrap()))
            .collect();

        let recent = benchmark_volatility(&bars, 10, &config).unwrap();
        let full = benchmark_volatility(&bars, 252, &config).unwrap();
        assert!(recent > full);
    }

    #[test]
    fn scored_json_fields() {
        let config = AnalysisConfig::default();
        let score = compute_risk_score(&alternating(30, 0.01), 30, Some(0.1), &config);
        let json = serde_json::to_value(&score).unwrap();
        for field in ["score", "tier", "portfolio_vol", "benchmark_vol", "effective_lookback"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert!(json.get("reason").is_none());
    }
}
