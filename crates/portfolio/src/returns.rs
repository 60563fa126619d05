//! Hypothetical historical returns of today's weights.

use equirisk_primitives::{DataCoverage, StockId};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{PortfolioError, PriceHistory, simple_returns};

/// Daily returns the current weights would have earned over the common history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypotheticalReturns {
    /// Daily portfolio returns, oldest first. Empty when coverage is insufficient.
    pub returns: Vec<f64>,
    /// Return observations, or the common date count when insufficient.
    pub effective_lookback: usize,
    /// How much of the requested lookback was available.
    pub coverage: DataCoverage,
}

impl HypotheticalReturns {
    const fn insufficient(effective_lookback: usize) -> Self {
        Self { returns: Vec::new(), effective_lookback, coverage: DataCoverage::Insufficient }
    }

    /// Whether there is enough history to analyse.
    #[must_use]
    pub fn is_sufficient(&self) -> bool {
        self.coverage != DataCoverage::Insufficient
    }
}

/// Weighted daily returns over the dates every holding has a close on.
///
/// A holding without any close, or fewer than `min_data_points` common dates, gives
/// [`DataCoverage::Insufficient`]. Coverage is full when the common dates span the
/// whole `lookback`.
///
/// # Errors
/// Returns `PortfolioError::DimensionMismatch` if `weights` and `stock_ids` differ in length.
pub fn build_hypothetical_returns(
    history: &PriceHistory,
    stock_ids: &[StockId],
    weights: &Array1<f64>,
    lookback: usize,
    min_data_points: usize,
) -> Result<HypotheticalReturns, PortfolioError> {
    if weights.len() != stock_ids.len() {
        return Err(PortfolioError::DimensionMismatch(format!(
            "{} weights for {} holdings",
            weights.len(),
            stock_ids.len()
        )));
    }
    let Some(dates) = history.common_dates(stock_ids) else {
        return Ok(HypotheticalReturns::insufficient(0));
    };
    if dates.len() < min_data_points.max(2) {
        return Ok(HypotheticalReturns::insufficient(dates.len()));
    }

    let stock_returns = simple_returns(&history.price_matrix(stock_ids, &dates));
    let returns = stock_returns.dot(weights).to_vec();
    let coverage = if dates.len() >= lookback { DataCoverage::Full } else { DataCoverage::Partial };
    Ok(HypotheticalReturns { returns, effective_lookback: dates.len() - 1, coverage })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use equirisk_primitives::{Date, LabeledSeries};
    use ndarray::array;

    use super::*;

    fn closes(n: u64, start: f64, step: f64) -> LabeledSeries<Date> {
        let first = Date::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|d| (first + chrono::Days::new(d), start + step * d as f64)).collect()
    }

    fn ids() -> [StockId; 2] {
        [StockId::new(1), StockId::new(2)]
    }

    #[test]
    fn full_coverage_over_lookback() {
        let mut history = PriceHistory::new();
        history.insert(StockId::new(1), closes(100, 100.0, 1.0));
        history.insert(StockId::new(2), closes(100, 50.0, 0.0));

        let hyp = build_hypothetical_returns(&history, &ids(), &array![0.5, 0.5], 100, 60).unwrap();
        assert_eq!(hyp.coverage, DataCoverage::Full);
        assert_eq!(hyp.effective_lookback, 99);
        assert_eq!(hyp.returns.len(), 99);
        assert_relative_eq!(hyp.returns[0], 0.5 * 0.01, epsilon = 1e-12);
    }

    #[test]
    fn partial_when_history_is_shorter_than_lookback() {
        let mut history = PriceHistory::new();
        history.insert(StockId::new(1), closes(80, 100.0, 1.0));
        history.insert(StockId::new(2), closes(120, 50.0, 0.5));

        let hyp = build_hypothetical_returns(&history, &ids(), &array![0.3, 0.7], 252, 60).unwrap();
        assert_eq!(hyp.coverage, DataCoverage::Partial);
        assert_eq!(hyp.effective_lookback, 79);
        assert!(hyp.is_sufficient());
    }

    #[test]
    fn holding_without_prices_is_insufficient() {
        let mut history = PriceHistory::new();
        history.insert(StockId::new(1), closes(100, 100.0, 1.0));

        let hyp = build_hypothetical_returns(&history, &ids(), &array![0.5, 0.5], 252, 60).unwrap();
        assert_eq!(hyp.coverage, DataCoverage::Insufficient);
        assert_eq!(hyp.effective_lookback, 0);
        assert!(hyp.returns.is_empty());
    }

    #[test]
    fn weight_count_must_match() {
        let history = PriceHistory::new();
        let err = build_hypothetical_returns(&history, &ids(), &array![1.0], 252, 60).unwrap_err();
        assert!(matches!(err, PortfolioError::DimensionMismatch(_)));
    }
}
