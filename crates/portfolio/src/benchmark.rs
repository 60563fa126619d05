//! Cumulative performance against the benchmark index.

use std::collections::BTreeMap;

use equirisk_math::stats::round_to;
use equirisk_primitives::{Date, PriceBar, StockId};
use ndarray::Array1;
use serde::Serialize;

use crate::{AnalysisConfig, PriceHistory, Unavailable, simple_returns};

/// Cumulative portfolio and benchmark returns over the same number of days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkComparison {
    /// Portfolio return in percent.
    pub portfolio_return: f64,
    /// Benchmark return in percent.
    pub benchmark_return: f64,
    /// Portfolio minus benchmark, in percentage points.
    pub excess_return: f64,
    /// Display name of the index.
    pub benchmark_name: String,
    /// Daily returns compounded on each side.
    pub lookback_days: usize,
}

/// One point of a cumulative growth series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Trading date.
    pub date: Date,
    /// Growth of 100 invested on the first common date.
    pub value: f64,
}

/// Growth of the portfolio and the benchmark on the holdings' common dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkChart {
    /// Display name of the index.
    pub benchmark_name: String,
    /// Portfolio growth.
    pub portfolio_series: Vec<ChartPoint>,
    /// Benchmark growth.
    pub benchmark_series: Vec<ChartPoint>,
}

fn growth(dates: &[Date], returns: impl Iterator<Item = f64>) -> Vec<ChartPoint> {
    let mut level = 1.0;
    dates
        .iter()
        .zip(returns)
        .map(|(date, r)| {
            level *= 1.0 + r;
            ChartPoint { date: *date, value: round_to(level * 100.0, 2) }
        })
        .collect()
}

fn compound(returns: &[f64]) -> f64 {
    returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0
}

/// Compare compounded portfolio returns with the benchmark over the last `n` days both
/// cover.
///
/// # Errors
/// Returns [`Unavailable::BenchmarkUnavailable`] with fewer than
/// `config.min_score_observations` benchmark closes.
pub fn compare_with_benchmark(
    portfolio_returns: &[f64],
    benchmark: &[PriceBar],
    benchmark_name: &str,
    config: &AnalysisConfig,
) -> Result<BenchmarkComparison, Unavailable> {
    if benchmark.len() < config.min_score_observations {
        return Err(Unavailable::BenchmarkUnavailable);
    }
    let bench_returns: Vec<f64> = benchmark.windows(2).map(|w| w[1].close_f64() / w[0].close_f64() - 1.0).collect();
    let n = portfolio_returns.len().min(bench_returns.len());

    let port = compound(&portfolio_returns[portfolio_returns.len() - n..]);
    let bench = compound(&bench_returns[bench_returns.len() - n..]);
    Ok(BenchmarkComparison {
        portfolio_return: round_to(port * 100.0, 2),
        benchmark_return: round_to(bench * 100.0, 2),
        excess_return: round_to((port - bench) * 100.0, 2),
        benchmark_name: benchmark_name.to_string(),
        lookback_days: n,
    })
}

/// Cumulative growth of the weighted holdings and of the benchmark.
///
/// Benchmark closes are matched on the holdings' common dates; a date without a close
/// contributes a zero return and the next available close is compared with the last
/// one seen.
///
/// # Errors
/// Returns [`Unavailable::InsufficientData`] with fewer than `config.min_matrix_days`
/// common dates, and [`Unavailable::BenchmarkOverlap`] when fewer than
/// `config.min_score_observations` of those dates have a benchmark close.
pub fn benchmark_chart(
    history: &PriceHistory,
    stock_ids: &[StockId],
    weights: &Array1<f64>,
    benchmark: &[PriceBar],
    benchmark_name: &str,
    config: &AnalysisConfig,
) -> Result<BenchmarkChart, Unavailable> {
    let dates = history.common_dates(stock_ids).unwrap_or_default();
    if dates.len() < config.min_matrix_days.max(2) || weights.len() != stock_ids.len() {
        return Err(Unavailable::InsufficientData);
    }
    let portfolio_returns = simple_returns(&history.price_matrix(stock_ids, &dates)).dot(weights);

    let closes: BTreeMap<Date, f64> = benchmark.iter().map(|b| (b.date, b.close_f64())).collect();
    let overlap = dates[1..].iter().filter(|d| closes.contains_key(d)).count();
    if overlap < config.min_score_observations {
        return Err(Unavailable::BenchmarkOverlap);
    }

    let mut prev = closes.get(&dates[0]).copied();
    let bench_returns = dates[1..].iter().map(|d| {
        let close = closes.get(d).copied();
        let r = match (close, prev) {
            (Some(c), Some(p)) if p > 0.0 => c / p - 1.0,
            _ => 0.0,
        };
        if close.is_some() {
            prev = close;
        }
        r
    });

    Ok(BenchmarkChart {
        benchmark_name: benchmark_name.to_string(),
        portfolio_series: growth(&dates[1..], portfolio_returns.iter().copied()),
        benchmark_series: growth(&dates[1..], bench_returns),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use equirisk_primitives::LabeledSeries;
    use ndarray::array;
    use rust_decimal::Decimal;

    use super::*;

    fn start() -> Date {
        Date::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(d, c)| PriceBar::new(start() + chrono::Days::new(d as u64), Decimal::from_f64_retain(*c).unwrap()))
            .collect()
    }

    fn growing(n: u64, daily: f64) -> LabeledSeries<Date> {
        (0..n).map(|d| (start() + chrono::Days::new(d), 100.0 * (1.0 + daily).powi(d as i32))).collect()
    }

    #[test]
    fn comparison_uses_shorter_history() {
        let config = AnalysisConfig::default();
        let bench = bars(&[100.0; 25]);
        let portfolio = vec![0.01; 10];

        let result = compare_with_benchmark(&portfolio, &bench, "KOSPI", &config).unwrap();
        assert_eq!(result.lookback_days, 10);
        assert_relative_eq!(result.benchmark_return, 0.0);
        assert_relative_eq!(result.portfolio_return, 10.46);
        assert_relative_eq!(result.excess_return, 10.46);
    }

    #[test]
    fn comparison_needs_benchmark() {
        let config = AnalysisConfig::default();
        let err = compare_with_benchmark(&[0.01; 30], &bars(&[100.0; 5]), "S&P 500", &config).unwrap_err();
        assert_eq!(err, Unavailable::BenchmarkUnavailable);
    }

    #[test]
    fn chart_compounds_both_series() {
        let config = AnalysisConfig::default();
        let mut history = PriceHistory::new();
        history.insert(StockId::new(1), growing(40, 0.01));
        let bench: Vec<PriceBar> = bars(&[50.0; 40]);

        let chart =
            benchmark_chart(&history, &[StockId::new(1)], &array![1.0], &bench, "KOSPI", &config).unwrap();
        assert_eq!(chart.portfolio_series.len(), 39);
        assert_relative_eq!(chart.portfolio_series[0].value, 101.0);
        assert_relative_eq!(chart.portfolio_series[38].value, round_to(100.0 * 1.01f64.powi(39), 2));
        assert!(chart.benchmark_series.iter().all(|p| p.value == 100.0));
        assert_eq!(chart.benchmark_series[0].date, start() + chrono::Days::new(1));
    }

    #[test]
    fn chart_needs_benchmark_overlap() {
        let config = AnalysisConfig::default();
        let mut history = PriceHistory::new();
        history.insert(StockId::new(1), growing(40, 0.01));
        let bench = bars(&[50.0; 10]);

        let err = benchmark_chart(&history, &[StockId::new(1)], &array![1.0], &bench, "KOSPI", &config).unwrap_err();
        assert_eq!(err, Unavailable::BenchmarkOverlap);
    }

    #[test]
    fn chart_needs_thirty_common_dates() {
        let config = AnalysisConfig::default();
        let mut history = PriceHistory::new();
        history.insert(StockId::new(1), growing(20, 0.01));

        let err = benchmark_chart(&history, &[StockId::new(1)], &array![1.0], &[], "KOSPI", &config).unwrap_err();
        assert_eq!(err, Unavailable::InsufficientData);
    }
}
