//! Collaborator-supplied records carrying monetary values.
//!
//! Prices, share counts and statement ratios keep their fixed-point representation
//! here and are converted with [`decimal_to_f64`] when they enter the numeric engine.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{Date, LabeledSeries, StockId};

/// Convert a fixed-point value to `f64`. Values outside the `f64` range map to NaN.
#[must_use]
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// A single end-of-day close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date.
    pub date: Date,
    /// Closing price.
    pub close: Decimal,
}

impl PriceBar {
    /// Create a new price bar.
    #[must_use]
    pub const fn new(date: Date, close: Decimal) -> Self {
        Self { date, close }
    }

    /// Closing price as a float.
    #[must_use]
    pub fn close_f64(&self) -> f64 {
        decimal_to_f64(self.close)
    }
}

/// Closes keyed by date. Later bars win on duplicate dates.
#[must_use]
pub fn close_series(bars: &[PriceBar]) -> LabeledSeries<Date> {
    bars.iter().map(|b| (b.date, b.close_f64())).collect()
}

/// Latest fundamental snapshot of a stock, as computed by the fundamentals stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    /// Stock the snapshot belongs to.
    pub stock_id: StockId,
    /// Shares outstanding.
    pub shares_outstanding: Option<Decimal>,
    /// Price-to-book ratio.
    pub price_to_book: Option<Decimal>,
    /// Return on equity.
    pub return_on_equity: Option<Decimal>,
    /// Operating margin.
    pub operating_margin: Option<Decimal>,
    /// Debt ratio.
    pub debt_ratio: Option<Decimal>,
}

impl FundamentalSnapshot {
    /// Create an empty snapshot for a stock.
    #[must_use]
    pub fn empty(stock_id: StockId) -> Self {
        Self { stock_id, ..Default::default() }
    }
}

/// A portfolio position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Held stock.
    pub stock_id: StockId,
    /// Number of shares.
    pub shares: Decimal,
    /// Average acquisition price.
    pub avg_price: Decimal,
    /// Currency of the average price.
    pub currency: String,
    /// Date the position was opened.
    pub acquired_on: Date,
}

impl Holding {
    /// Create a new holding.
    #[must_use]
    pub fn new(
        stock_id: StockId,
        shares: Decimal,
        avg_price: Decimal,
        currency: impl Into<String>,
        acquired_on: Date,
    ) -> Self {
        Self { stock_id, shares, avg_price, currency: currency.into(), acquired_on }
    }

    /// Book value of the position (`shares * avg_price`) as a float.
    #[must_use]
    pub fn market_value(&self) -> f64 {
        decimal_to_f64(self.shares * self.avg_price)
    }

    /// Share count as a float.
    #[must_use]
    pub fn shares_f64(&self) -> f64 {
        decimal_to_f64(self.shares)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn market_value_is_shares_times_price() {
        let date = Date::from_ymd_opt(2023, 6, 1).unwrap();
        let holding = Holding::new(StockId::new(7), Decimal::new(15, 0), Decimal::new(12_345, 2), "USD", date);
        assert_relative_eq!(holding.market_value(), 1851.75, epsilon = 1e-9);
        assert_relative_eq!(holding.shares_f64(), 15.0);
    }

    #[test]
    fn close_series_keyed_by_date() {
        let d1 = Date::from_ymd_opt(2023, 6, 1).unwrap();
        let d2 = Date::from_ymd_opt(2023, 6, 2).unwrap();
        let bars = [PriceBar::new(d2, Decimal::new(11, 0)), PriceBar::new(d1, Decimal::new(10, 0))];
        let series = close_series(&bars);
        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![d1, d2]);
        assert_relative_eq!(*series.get(&d2).unwrap(), 11.0);
    }

    #[test]
    fn price_bar_converts_close() {
        let bar = PriceBar::new(Date::from_ymd_opt(2023, 6, 1).unwrap(), Decimal::new(7_150_000, 2));
        assert_relative_eq!(bar.close_f64(), 71_500.0);
    }
}
