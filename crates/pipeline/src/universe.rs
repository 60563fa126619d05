//! Universe maintenance and health counts.

use equirisk_model::{InMemoryStore, StoreError};
use equirisk_primitives::{Market, NOT_APPLICABLE_SECTOR, sector_is_assigned};
use serde::{Deserialize, Serialize};

/// Active and total stocks of a universe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseCounts {
    /// Stocks still active.
    pub active: usize,
    /// All listed stocks, active or not.
    pub total: usize,
}

impl UniverseCounts {
    /// Active share, zero for an empty universe.
    #[must_use]
    pub fn active_ratio(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.active as f64 / self.total as f64 }
    }
}

impl std::ops::Add for UniverseCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { active: self.active + rhs.active, total: self.total + rhs.total }
    }
}

/// Data health of the active stocks of one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Market checked.
    pub market: Market,
    /// Active stocks.
    pub active_total: usize,
    /// Active stocks with a usable sector, the ones the factor model can use.
    pub has_sector: usize,
    /// Active stocks without a sector.
    pub sector_null: usize,
    /// Active stocks whose sector is "N/A".
    pub sector_na: usize,
    /// Active stocks without usable fundamentals.
    pub no_fs: usize,
    /// Active stocks without any close.
    pub no_price: usize,
}

impl IntegrityReport {
    /// Share of active stocks left out of the factor model for lack of a sector.
    #[must_use]
    pub fn unclassified_ratio(&self) -> Option<f64> {
        (self.active_total > 0).then(|| (self.sector_null + self.sector_na) as f64 / self.active_total as f64)
    }
}

/// Writes and counts over the stock universe used by the pipeline.
pub trait UniverseStore {
    /// Stage deactivation of every active stock of `market` that has no close at all.
    /// Returns the number staged.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn deactivate_no_price_stocks(&mut self, market: Market) -> Result<usize, StoreError>;

    /// Active and total stocks of `market`, as seen by the current unit of work.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn universe_counts(&self, market: Market) -> Result<UniverseCounts, StoreError>;

    /// Integrity counts of `market`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn integrity_stats(&self, market: Market) -> Result<IntegrityReport, StoreError>;
}

impl UniverseStore for InMemoryStore {
    fn deactivate_no_price_stocks(&mut self, market: Market) -> Result<usize, StoreError> {
        let stale: Vec<_> = self
            .stocks_in(market)
            .filter(|s| s.is_active && self.prices_of(s.id).is_empty())
            .map(|s| s.id)
            .collect();
        Ok(stale.into_iter().filter(|id| self.deactivate(*id)).count())
    }

    fn universe_counts(&self, market: Market) -> Result<UniverseCounts, StoreError> {
        Ok(self.stocks_in(market).fold(UniverseCounts::default(), |acc, s| UniverseCounts {
            active: acc.active + usize::from(s.is_active),
            total: acc.total + 1,
        }))
    }

    fn integrity_stats(&self, market: Market) -> Result<IntegrityReport, StoreError> {
        let mut report = IntegrityReport {
            market,
            active_total: 0,
            has_sector: 0,
            sector_null: 0,
            sector_na: 0,
            no_fs: 0,
            no_price: 0,
        };
        for stock in self.stocks_in(market).filter(|s| s.is_active) {
            report.active_total += 1;
            match stock.sector.as_deref() {
                sector if sector_is_assigned(sector) => report.has_sector += 1,
                Some(NOT_APPLICABLE_SECTOR) => report.sector_na += 1,
                _ => report.sector_null += 1,
            }
            let usable_fundamentals = self.fundamentals_of(stock.id).is_some_and(|f| {
                f.price_to_book.is_some()
                    || f.return_on_equity.is_some()
                    || f.operating_margin.is_some()
                    || f.debt_ratio.is_some()
            });
            report.no_fs += usize::from(!usable_fundamentals);
            report.no_price += usize::from(self.prices_of(stock.id).is_empty());
        }
        Ok(report)
    }
}
