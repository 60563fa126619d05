//! Per-stock risk indicators that consume the factor model.

use equirisk_math::stats;
use equirisk_primitives::{Date, LabeledSeries};
use serde::{Deserialize, Serialize};

use crate::ols_beta;

/// Trading days per year used to annualise daily statistics.
pub const TRADING_DAYS: f64 = 252.0;

/// Where a stock's beta came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetaSource {
    /// Barra beta from the stored factor covariance.
    Factor,
    /// Regression of stock on benchmark returns.
    Ols,
}

/// Beta, Jensen's alpha and Sharpe ratio of one stock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskIndicators {
    /// Beta against the benchmark.
    pub beta: f64,
    /// Origin of [`beta`](Self::beta).
    pub beta_source: BetaSource,
    /// Annualised Jensen's alpha.
    pub alpha: f64,
    /// Annualised Sharpe ratio.
    pub sharpe: f64,
}

fn daily_rate(annual_pct: f64) -> f64 {
    annual_pct / 100.0 / TRADING_DAYS
}

/// Annualised Jensen's alpha over the dates both series cover.
///
/// Returns 0.0 with fewer than two aligned points.
#[must_use]
pub fn jensen_alpha(
    stock_returns: &LabeledSeries<Date>,
    market_returns: &LabeledSeries<Date>,
    risk_free_pct: f64,
    beta: f64,
) -> f64 {
    let (s, m): (Vec<f64>, Vec<f64>) =
        stock_returns.finite().inner_join(&market_returns.finite()).into_iter().map(|(_, a, b)| (a, b)).unzip();
    if s.len() < 2 {
        return 0.0;
    }
    let (Some(stock_mean), Some(market_mean)) = (stats::mean(&s), stats::mean(&m)) else {
        return 0.0;
    };
    let rf = daily_rate(risk_free_pct);
    (stock_mean - (rf + beta * (market_mean - rf))) * TRADING_DAYS
}

/// Annualised Sharpe ratio of daily returns.
///
/// Returns 0.0 with fewer than two finite returns or zero volatility.
#[must_use]
pub fn sharpe_ratio(returns: &LabeledSeries<Date>, risk_free_pct: f64) -> f64 {
    let values = returns.finite().to_vec();
    let (Some(mean), Some(std)) = (stats::mean(&values), stats::sample_std(&values)) else {
        return 0.0;
    };
    if std == 0.0 {
        return 0.0;
    }
    (mean - daily_rate(risk_free_pct)) / std * TRADING_DAYS.sqrt()
}

/// Indicators of one stock, preferring a factor-model beta when one is available.
///
/// Without a benchmark the OLS beta and the alpha are zero.
#[must_use]
pub fn compute_risk_indicators(
    stock_returns: &LabeledSeries<Date>,
    benchmark_returns: Option<&LabeledSeries<Date>>,
    risk_free_pct: f64,
    factor_beta: Option<f64>,
) -> RiskIndicators {
    let (beta, beta_source) = match factor_beta {
        Some(b) => (b, BetaSource::Factor),
        None => (benchmark_returns.map_or(0.0, |m| ols_beta(stock_returns, m)), BetaSource::Ols),
    };
    let alpha = benchmark_returns.map_or(0.0, |m| jensen_alpha(stock_returns, m, risk_free_pct, beta));
    RiskIndicators { beta, beta_source, alpha, sharpe: sharpe_ratio(stock_returns, risk_free_pct) }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn series(values: &[f64]) -> LabeledSeries<Date> {
        let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
        values.iter().enumerate().map(|(i, v)| (start + chrono::Days::new(i as u64), *v)).collect()
    }

    #[test]
    fn factor_beta_preferred() {
        let stock = series(&[0.01, -0.02, 0.015, 0.0]);
        let market = series(&[0.005, -0.01, 0.0075, 0.0]);

        let with_factor = compute_risk_indicators(&stock, Some(&market), 3.0, Some(1.3));
        assert_eq!(with_factor.beta_source, BetaSource::Factor);
        assert_relative_eq!(with_factor.beta, 1.3);

        let fallback = compute_risk_indicators(&stock, Some(&market), 3.0, None);
        assert_eq!(fallback.beta_source, BetaSource::Ols);
        assert_relative_eq!(fallback.beta, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn alpha_of_scaled_market_with_zero_rate() {
        let market = series(&[0.01, -0.02, 0.03]);
        let stock = series(&[0.02, -0.04, 0.06]);
        // stock = 2 * market exactly, so alpha vanishes with beta 2 and no risk-free rate.
        assert_relative_eq!(jensen_alpha(&stock, &market, 0.0, 2.0), 0.0, epsilon = 1e-12);
        // beta 1 leaves the mean excess: mean(stock) - mean(market) = 0.02 / 3 daily.
        assert_relative_eq!(jensen_alpha(&stock, &market, 0.0, 1.0), 0.02 / 3.0 * 252.0, epsilon = 1e-12);
    }

    #[test]
    fn sharpe_degenerate_cases() {
        assert_eq!(sharpe_ratio(&series(&[0.01]), 3.0), 0.0);
        assert_eq!(sharpe_ratio(&series(&[0.01, 0.01, 0.01]), 3.0), 0.0);
    }

    #[test]
    fn sharpe_annualised() {
        let returns = series(&[0.01, -0.01, 0.02, 0.0]);
        let mean = 0.005;
        let std = stats::sample_std(&[0.01, -0.01, 0.02, 0.0]).unwrap();
        assert_relative_eq!(sharpe_ratio(&returns, 0.0), mean / std * 252f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn no_benchmark_means_zero_alpha() {
        let stock = series(&[0.01, -0.02, 0.015]);
        let result = compute_risk_indicators(&stock, None, 3.0, None);
        assert_eq!(result.beta, 0.0);
        assert_eq!(result.alpha, 0.0);
    }
}
