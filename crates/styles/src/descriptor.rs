//! Raw style descriptor trait and the per-stock inputs it reads.

use equirisk_primitives::{StockId, StyleFactor, sector_is_assigned};
use ndarray::Array1;

use crate::PriceFeatures;

/// Everything the exposure builder knows about one stock on the computation date.
///
/// Monetary values are already converted to floating point; `None` marks a value the
/// collaborators could not supply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockInputs {
    /// Stock identifier.
    pub stock_id: StockId,
    /// Sector label, if classified.
    pub sector: Option<String>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,
    /// Price-to-book ratio.
    pub price_to_book: Option<f64>,
    /// Return on equity.
    pub return_on_equity: Option<f64>,
    /// Operating margin.
    pub operating_margin: Option<f64>,
    /// Debt ratio.
    pub debt_ratio: Option<f64>,
    /// Features of the close history.
    pub prices: PriceFeatures,
}

impl StockInputs {
    /// Create inputs with only an identifier and sector.
    #[must_use]
    pub fn new(stock_id: StockId, sector: Option<&str>) -> Self {
        Self { stock_id, sector: sector.map(str::to_string), ..Default::default() }
    }

    /// Market capitalisation `shares * close`, NaN when either is missing.
    #[must_use]
    pub fn market_cap(&self) -> f64 {
        match (self.shares_outstanding, self.prices.close) {
            (Some(shares), Some(close)) => shares * close,
            _ => f64::NAN,
        }
    }

    /// Sector label when it names a real industry.
    #[must_use]
    pub fn industry(&self) -> Option<&str> {
        let sector = self.sector.as_deref();
        if sector_is_assigned(sector) { sector } else { None }
    }
}

/// A style factor's raw (pre-standardisation) descriptor.
pub trait StyleDescriptor: std::fmt::Debug {
    /// The style factor this descriptor feeds.
    fn factor(&self) -> StyleFactor;

    /// Column name of the factor.
    fn name(&self) -> &'static str {
        self.factor().name()
    }

    /// Raw descriptor per stock, NaN where undefined.
    fn raw_scores(&self, inputs: &[StockInputs]) -> Array1<f64>;

    /// Input fields the descriptor reads.
    fn required_inputs(&self) -> &[&str];
}

/// `Option<f64>` to a float with NaN for missing.
pub(crate) fn or_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_cap_needs_shares_and_close() {
        let mut inputs = StockInputs::new(StockId::new(1), Some("Energy"));
        assert!(inputs.market_cap().is_nan());

        inputs.shares_outstanding = Some(1_000.0);
        inputs.prices.close = Some(12.5);
        assert_eq!(inputs.market_cap(), 12_500.0);
    }

    #[test]
    fn sentinel_sector_is_no_industry() {
        assert_eq!(StockInputs::new(StockId::new(1), Some("Energy")).industry(), Some("Energy"));
        assert_eq!(StockInputs::new(StockId::new(2), Some("N/A")).industry(), None);
        assert_eq!(StockInputs::new(StockId::new(3), None).industry(), None);
    }
}
