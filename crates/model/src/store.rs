//! Collaborator interfaces of the factor model.
//!
//! The engine never owns a connection. Each call receives a unit of work that
//! implements the read and write traits it needs and commits its own stages.

use std::collections::HashMap;

use equirisk_primitives::{
    Benchmark, Country, FactorCovariance, FactorExposure, FactorReturn, FundamentalSnapshot,
    Market, PriceBar, Stock, StockId,
};

/// Errors raised by storage collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend temporarily unavailable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// Stored data could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns whether retrying the call may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Read access to market and fundamental data.
pub trait MarketDataSource {
    /// Active stocks of `market` with an assigned sector.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn eligible_stocks(&self, market: Market) -> Result<Vec<Stock>, StoreError>;

    /// Up to `limit_per_stock` most recent closes per stock of `market`, ascending by date.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn price_history(
        &self,
        market: Market,
        limit_per_stock: usize,
    ) -> Result<HashMap<StockId, Vec<PriceBar>>, StoreError>;

    /// Latest fundamental snapshot of each requested stock that has one.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn fundamentals(&self, stock_ids: &[StockId]) -> Result<Vec<FundamentalSnapshot>, StoreError>;

    /// Annual risk-free rate in percent for a country, if known.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn risk_free_rate(&self, country: Country) -> Result<Option<f64>, StoreError>;

    /// Up to `limit` most recent closes of a benchmark index, ascending by date.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn benchmark_history(&self, benchmark: Benchmark, limit: usize) -> Result<Vec<PriceBar>, StoreError>;

    /// Sector label of every active stock listed on `market`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn sectors(&self, market: Market) -> Result<HashMap<StockId, Option<String>>, StoreError>;
}

/// Persistence of factor model outputs. All writes are insert-or-update on the natural key.
pub trait FactorStore {
    /// Upsert exposure rows keyed by `(stock, date)`.
    ///
    /// # Errors
    /// Returns error if the write is rejected.
    fn upsert_exposures(&mut self, rows: &[FactorExposure]) -> Result<usize, StoreError>;

    /// Upsert factor returns keyed by `(market, date, factor)`.
    ///
    /// # Errors
    /// Returns error if the write is rejected.
    fn upsert_factor_returns(&mut self, rows: &[FactorReturn]) -> Result<usize, StoreError>;

    /// Number of distinct dates with stored factor returns for `market`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn count_factor_return_dates(&self, market: Market) -> Result<usize, StoreError>;

    /// Factor returns of the `limit_dates` most recent dates for `market`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn factor_return_history(
        &self,
        market: Market,
        limit_dates: usize,
    ) -> Result<Vec<FactorReturn>, StoreError>;

    /// Upsert the covariance keyed by `(market, date)`.
    ///
    /// # Errors
    /// Returns error if the write is rejected.
    fn upsert_covariance(&mut self, covariance: &FactorCovariance) -> Result<(), StoreError>;

    /// Most recent covariance of `market`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read or the record cannot be decoded.
    fn latest_covariance(&self, market: Market) -> Result<Option<FactorCovariance>, StoreError>;

    /// Exposure rows of the most recent exposure date among stocks of `market`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn latest_exposures(&self, market: Market) -> Result<Vec<FactorExposure>, StoreError>;
}

/// Transaction boundary of one scoped connection.
pub trait UnitOfWork {
    /// Make all writes since the last commit durable.
    ///
    /// # Errors
    /// Returns error if the commit fails; the pending writes are then discarded.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard all writes since the last commit.
    ///
    /// # Errors
    /// Returns error if the backend cannot roll back.
    fn rollback(&mut self) -> Result<(), StoreError>;
}
