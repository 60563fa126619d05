//! Close histories of a set of holdings, aligned on common trading dates.

use std::collections::BTreeMap;

use equirisk_model::StoreError;
use equirisk_primitives::{Date, Holding, LabeledSeries, StockId, close_series};
use ndarray::{Array1, Array2, s};

use crate::{PortfolioError, PortfolioSource};

/// Weights proportional to holding book value.
///
/// Falls back to equal weights when the total book value is not positive.
#[must_use]
pub fn holding_weights(holdings: &[Holding]) -> Array1<f64> {
    let values: Array1<f64> = holdings.iter().map(Holding::market_value).collect();
    let total = values.sum();
    if total > 0.0 {
        values / total
    } else {
        Array1::from_elem(holdings.len(), 1.0 / holdings.len().max(1) as f64)
    }
}

/// Daily simple returns down the rows of a `T x N` price matrix.
#[must_use]
pub fn simple_returns(prices: &Array2<f64>) -> Array2<f64> {
    if prices.nrows() < 2 {
        return Array2::zeros((0, prices.ncols()));
    }
    let prev = prices.slice(s![..-1, ..]);
    let next = prices.slice(s![1.., ..]);
    (&next - &prev) / &prev
}

/// Closes of several stocks keyed by date.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    series: BTreeMap<StockId, LabeledSeries<Date>>,
}

impl PriceHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load up to `limit` recent closes of every stock.
    ///
    /// # Errors
    /// Returns error if the source cannot be read.
    pub fn load<S>(source: &S, stock_ids: &[StockId], limit: usize) -> Result<Self, StoreError>
    where
        S: PortfolioSource + ?Sized,
    {
        let mut history = Self::new();
        for id in stock_ids {
            history.insert(*id, close_series(&source.stock_prices(*id, limit)?));
        }
        Ok(history)
    }

    /// Set the closes of a stock.
    pub fn insert(&mut self, stock_id: StockId, closes: LabeledSeries<Date>) {
        self.series.insert(stock_id, closes);
    }

    /// Closes of a stock.
    #[must_use]
    pub fn get(&self, stock_id: StockId) -> Option<&LabeledSeries<Date>> {
        self.series.get(&stock_id)
    }

    /// Dates on which every listed stock has a close, ascending.
    ///
    /// `None` when the list is empty or any stock has no closes at all.
    #[must_use]
    pub fn common_dates(&self, stock_ids: &[StockId]) -> Option<Vec<Date>> {
        let series: Option<Vec<&LabeledSeries<Date>>> =
            stock_ids.iter().map(|id| self.get(*id).filter(|s| !s.is_empty())).collect();
        series.filter(|s| !s.is_empty()).map(|s| LabeledSeries::intersect_keys(&s))
    }

    /// `T x N` closes over `dates`, one column per stock in `stock_ids` order.
    ///
    /// Cells without a close are NaN.
    #[must_use]
    pub fn price_matrix(&self, stock_ids: &[StockId], dates: &[Date]) -> Array2<f64> {
        Array2::from_shape_fn((dates.len(), stock_ids.len()), |(t, j)| {
            self.get(stock_ids[j]).and_then(|s| s.get(&dates[t]).copied()).unwrap_or(f64::NAN)
        })
    }

    /// Daily simple returns over the common dates of `stock_ids`.
    ///
    /// # Errors
    /// Returns `PortfolioError::InsufficientData` with fewer than `min_days` common dates.
    pub fn returns_matrix(&self, stock_ids: &[StockId], min_days: usize) -> Result<Array2<f64>, PortfolioError> {
        let dates = self.common_dates(stock_ids).unwrap_or_default();
        if dates.len() < min_days.max(2) {
            return Err(PortfolioError::InsufficientData { required: min_days, actual: dates.len() });
        }
        Ok(simple_returns(&self.price_matrix(stock_ids, &dates)))
    }
}
