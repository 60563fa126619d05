//! Portfolios and the data they are analysed against.

use std::collections::HashMap;

use equirisk_model::{InMemoryStore, StoreError};
use equirisk_primitives::{Holding, MarketGroup, PriceBar, Stock, StockId};
use serde::{Deserialize, Serialize};

/// A user portfolio as supplied by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Portfolio identifier.
    pub id: u64,
    /// Region the portfolio is tagged with, if any.
    pub market_group: Option<MarketGroup>,
    /// Positions, in display order.
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    /// Create a new portfolio.
    #[must_use]
    pub const fn new(id: u64, market_group: Option<MarketGroup>, holdings: Vec<Holding>) -> Self {
        Self { id, market_group, holdings }
    }

    /// Stock ids of the holdings, in holding order.
    #[must_use]
    pub fn stock_ids(&self) -> Vec<StockId> {
        self.holdings.iter().map(|h| h.stock_id).collect()
    }

    /// Stable identifier of the market group, "UNKNOWN" when untagged.
    #[must_use]
    pub fn market_group_label(&self) -> &'static str {
        self.market_group.as_ref().map_or("UNKNOWN", MarketGroup::as_str)
    }
}

/// Per-stock reads used by portfolio analytics.
pub trait PortfolioSource {
    /// Up to `limit` most recent closes of a stock, ascending by date.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn stock_prices(&self, stock_id: StockId, limit: usize) -> Result<Vec<PriceBar>, StoreError>;

    /// Stock records of the requested ids that exist.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn stocks(&self, stock_ids: &[StockId]) -> Result<HashMap<StockId, Stock>, StoreError>;
}

impl PortfolioSource for InMemoryStore {
    fn stock_prices(&self, stock_id: StockId, limit: usize) -> Result<Vec<PriceBar>, StoreError> {
        let bars = self.prices_of(stock_id);
        Ok(bars[bars.len().saturating_sub(limit)..].to_vec())
    }

    fn stocks(&self, stock_ids: &[StockId]) -> Result<HashMap<StockId, Stock>, StoreError> {
        Ok(stock_ids.iter().filter_map(|id| self.stock(*id).map(|s| (*id, s.clone()))).collect())
    }
}

#[cfg(test)]
mod tests {
    use equirisk_primitives::{Date, Market};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn in_memory_prices_keep_latest() {
        let mut store = InMemoryStore::new();
        let id = StockId::new(3);
        let start = Date::from_ymd_opt(2024, 3, 1).unwrap();
        store.add_prices(id, (0..5).map(|d| PriceBar::new(start + chrono::Days::new(d), Decimal::from(10 + d))));

        let bars = store.stock_prices(id, 2).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, Decimal::from(14));
        assert!(store.stock_prices(StockId::new(4), 10).unwrap().is_empty());
    }

    #[test]
    fn unknown_stocks_are_omitted() {
        let mut store = InMemoryStore::new();
        store.add_stock(Stock::new(StockId::new(1), "005930", Market::KrKospi, Some("Tech")));
        let found = store.stocks(&[StockId::new(1), StockId::new(2)]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&StockId::new(1)].symbol.as_str(), "005930");
    }

    #[test]
    fn untagged_group_label() {
        assert_eq!(Portfolio::new(1, None, Vec::new()).market_group_label(), "UNKNOWN");
        assert_eq!(Portfolio::new(1, Some(MarketGroup::Us), Vec::new()).market_group_label(), "US");
    }
}
