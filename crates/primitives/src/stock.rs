//! Stock identity definitions.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::Market;

/// Sector label the data vendors use when a company has no classification.
pub const NOT_APPLICABLE_SECTOR: &str = "N/A";

/// Returns whether a sector label identifies a real industry.
///
/// Missing labels and the vendor's "N/A" sentinel are both unassigned.
#[must_use]
pub fn sector_is_assigned(sector: Option<&str>) -> bool {
    matches!(sector, Some(s) if s != NOT_APPLICABLE_SECTOR)
}

/// Unique identifier for a stock, as assigned by the persistence layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct StockId(pub u64);

impl StockId {
    /// Create a new stock ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Stock ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A listed stock as seen by the engine. Owned by the persistence layer; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Unique identifier.
    pub id: StockId,
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Listing market.
    pub market: Market,
    /// Sector classification, if known.
    pub sector: Option<String>,
    /// Whether the stock is currently active in the universe.
    pub is_active: bool,
}

impl Stock {
    /// Create a new active stock.
    #[must_use]
    pub fn new(id: StockId, symbol: impl Into<Symbol>, market: Market, sector: Option<&str>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            market,
            sector: sector.map(str::to_string),
            is_active: true,
        }
    }

    /// Whether the stock may enter the factor model cross-section.
    #[must_use]
    pub fn is_factor_eligible(&self) -> bool {
        self.is_active && sector_is_assigned(self.sector.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_from_str() {
        let sym: Symbol = "AAPL".into();
        assert_eq!(sym.as_str(), "AAPL");
    }

    #[test]
    fn sentinel_sector_is_unassigned() {
        assert!(sector_is_assigned(Some("Technology")));
        assert!(!sector_is_assigned(Some("N/A")));
        assert!(!sector_is_assigned(None));
    }

    #[test]
    fn eligibility_needs_sector_and_activity() {
        let mut stock = Stock::new(StockId::new(1), "005930", Market::KrKospi, Some("Technology"));
        assert!(stock.is_factor_eligible());

        stock.is_active = false;
        assert!(!stock.is_factor_eligible());

        let stock = Stock::new(StockId::new(2), "AAPL", Market::UsNasdaq, Some("N/A"));
        assert!(!stock.is_factor_eligible());
    }
}
