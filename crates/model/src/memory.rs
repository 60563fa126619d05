//! In-memory implementation of the collaborator traits.
//!
//! Writes go to a working copy of the tables; [`UnitOfWork::commit`] publishes the
//! working copy and [`UnitOfWork::rollback`] resets it to the last committed state.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use equirisk_primitives::{
    Benchmark, Country, Date, FactorCovariance, FactorExposure, FactorReturn, FundamentalSnapshot,
    Market, PriceBar, Stock, StockId, StyleExposures,
};

use crate::{FactorStore, MarketDataSource, StoreError, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct Tables {
    stocks: BTreeMap<StockId, Stock>,
    exposures: BTreeMap<(StockId, Date), StyleExposures>,
    factor_returns: BTreeMap<(Market, Date, String), f64>,
    covariances: BTreeMap<(Market, Date), FactorCovariance>,
}

/// Store backed by ordered maps, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    committed: Tables,
    working: Tables,
    prices: HashMap<StockId, Vec<PriceBar>>,
    fundamentals: HashMap<StockId, FundamentalSnapshot>,
    risk_free: HashMap<Country, f64>,
    benchmarks: HashMap<Benchmark, Vec<PriceBar>>,
    commits: usize,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stock. Seeding is not part of any unit of work.
    pub fn add_stock(&mut self, stock: Stock) {
        self.committed.stocks.insert(stock.id, stock.clone());
        self.working.stocks.insert(stock.id, stock);
    }

    /// Seed closes of a stock; kept sorted ascending by date, later bars win on duplicate dates.
    pub fn add_prices(&mut self, stock_id: StockId, bars: impl IntoIterator<Item = PriceBar>) {
        let entry = self.prices.entry(stock_id).or_default();
        merge_bars(entry, bars);
    }

    /// Seed the fundamental snapshot of a stock.
    pub fn set_fundamentals(&mut self, snapshot: FundamentalSnapshot) {
        self.fundamentals.insert(snapshot.stock_id, snapshot);
    }

    /// Seed the annual risk-free rate in percent of a country.
    pub fn set_risk_free_rate(&mut self, country: Country, annual_pct: f64) {
        self.risk_free.insert(country, annual_pct);
    }

    /// Seed closes of a benchmark index.
    pub fn set_benchmark_prices(&mut self, benchmark: Benchmark, bars: impl IntoIterator<Item = PriceBar>) {
        let entry = self.benchmarks.entry(benchmark).or_default();
        merge_bars(entry, bars);
    }

    /// Stock by id, as seen by the current unit of work.
    #[must_use]
    pub fn stock(&self, stock_id: StockId) -> Option<&Stock> {
        self.working.stocks.get(&stock_id)
    }

    /// All stocks of a market, active or not.
    pub fn stocks_in(&self, market: Market) -> impl Iterator<Item = &Stock> {
        self.working.stocks.values().filter(move |s| s.market == market)
    }

    /// Stage deactivation of a stock. Returns whether it was active.
    pub fn deactivate(&mut self, stock_id: StockId) -> bool {
        self.working.stocks.get_mut(&stock_id).is_some_and(|s| std::mem::replace(&mut s.is_active, false))
    }

    /// Closes of a stock, ascending.
    #[must_use]
    pub fn prices_of(&self, stock_id: StockId) -> &[PriceBar] {
        self.prices.get(&stock_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Closes of a benchmark, ascending.
    #[must_use]
    pub fn benchmark_prices_of(&self, benchmark: Benchmark) -> &[PriceBar] {
        self.benchmarks.get(&benchmark).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fundamental snapshot of a stock.
    #[must_use]
    pub fn fundamentals_of(&self, stock_id: StockId) -> Option<&FundamentalSnapshot> {
        self.fundamentals.get(&stock_id)
    }

    /// Number of successful commits.
    #[must_use]
    pub const fn commit_count(&self) -> usize {
        self.commits
    }

    /// Whether the working copy differs from the committed state.
    #[must_use]
    pub fn has_pending_writes(&self) -> bool {
        self.working.stocks != self.committed.stocks
            || self.working.exposures != self.committed.exposures
            || self.working.factor_returns != self.committed.factor_returns
            || self.working.covariances != self.committed.covariances
    }

    /// Committed factor returns of a market on a date, by factor name.
    #[must_use]
    pub fn committed_factor_returns(&self, market: Market, date: Date) -> BTreeMap<String, f64> {
        self.committed
            .factor_returns
            .iter()
            .filter(|((m, d, _), _)| *m == market && *d == date)
            .map(|((_, _, name), value)| (name.clone(), *value))
            .collect()
    }

    /// Number of committed covariance snapshots of a market.
    #[must_use]
    pub fn committed_covariance_count(&self, market: Market) -> usize {
        self.committed.covariances.keys().filter(|(m, _)| *m == market).count()
    }

    /// Committed exposure of a stock on a date.
    #[must_use]
    pub fn committed_exposure(&self, stock_id: StockId, date: Date) -> Option<&StyleExposures> {
        self.committed.exposures.get(&(stock_id, date))
    }

    fn last_bars(bars: &[PriceBar], limit: usize) -> Vec<PriceBar> {
        bars[bars.len().saturating_sub(limit)..].to_vec()
    }
}

fn merge_bars(entry: &mut Vec<PriceBar>, bars: impl IntoIterator<Item = PriceBar>) {
    let mut by_date: BTreeMap<Date, PriceBar> = entry.drain(..).map(|b| (b.date, b)).collect();
    by_date.extend(bars.into_iter().map(|b| (b.date, b)));
    entry.extend(by_date.into_values());
}

impl MarketDataSource for InMemoryStore {
    fn eligible_stocks(&self, market: Market) -> Result<Vec<Stock>, StoreError> {
        Ok(self.stocks_in(market).filter(|s| s.is_factor_eligible()).cloned().collect())
    }

    fn price_history(
        &self,
        market: Market,
        limit_per_stock: usize,
    ) -> Result<HashMap<StockId, Vec<PriceBar>>, StoreError> {
        Ok(self
            .stocks_in(market)
            .filter(|s| s.is_active)
            .filter_map(|s| {
                self.prices.get(&s.id).map(|bars| (s.id, Self::last_bars(bars, limit_per_stock)))
            })
            .collect())
    }

    fn fundamentals(&self, stock_ids: &[StockId]) -> Result<Vec<FundamentalSnapshot>, StoreError> {
        Ok(stock_ids.iter().filter_map(|id| self.fundamentals.get(id).cloned()).collect())
    }

    fn risk_free_rate(&self, country: Country) -> Result<Option<f64>, StoreError> {
        Ok(self.risk_free.get(&country).copied())
    }

    fn benchmark_history(&self, benchmark: Benchmark, limit: usize) -> Result<Vec<PriceBar>, StoreError> {
        Ok(Self::last_bars(self.benchmark_prices_of(benchmark), limit))
    }

    fn sectors(&self, market: Market) -> Result<HashMap<StockId, Option<String>>, StoreError> {
        Ok(self.stocks_in(market).filter(|s| s.is_active).map(|s| (s.id, s.sector.clone())).collect())
    }
}

impl FactorStore for InMemoryStore {
    fn upsert_exposures(&mut self, rows: &[FactorExposure]) -> Result<usize, StoreError> {
        for row in rows {
            self.working.exposures.insert((row.stock_id, row.date), row.styles);
        }
        Ok(rows.len())
    }

    fn upsert_factor_returns(&mut self, rows: &[FactorReturn]) -> Result<usize, StoreError> {
        for row in rows {
            if !row.value.is_finite() {
                return Err(StoreError::Rejected(format!("non-finite return for factor {}", row.factor)));
            }
            self.working.factor_returns.insert((row.market, row.date, row.factor.clone()), row.value);
        }
        Ok(rows.len())
    }

    fn count_factor_return_dates(&self, market: Market) -> Result<usize, StoreError> {
        let dates: BTreeSet<Date> =
            self.working.factor_returns.keys().filter(|(m, _, _)| *m == market).map(|(_, d, _)| *d).collect();
        Ok(dates.len())
    }

    fn factor_return_history(
        &self,
        market: Market,
        limit_dates: usize,
    ) -> Result<Vec<FactorReturn>, StoreError> {
        let dates: BTreeSet<Date> =
            self.working.factor_returns.keys().filter(|(m, _, _)| *m == market).map(|(_, d, _)| *d).collect();
        let Some(&start) = dates.iter().rev().take(limit_dates).last() else {
            return Ok(Vec::new());
        };
        Ok(self
            .working
            .factor_returns
            .iter()
            .filter(|((m, d, _), _)| *m == market && *d >= start)
            .map(|((m, d, name), value)| FactorReturn::new(*m, *d, name.clone(), *value))
            .collect())
    }

    fn upsert_covariance(&mut self, covariance: &FactorCovariance) -> Result<(), StoreError> {
        if !covariance.matches(covariance.dim()) {
            return Err(StoreError::Rejected("covariance matrix is not square".to_string()));
        }
        self.working.covariances.insert((covariance.market, covariance.date), covariance.clone());
        Ok(())
    }

    fn latest_covariance(&self, market: Market) -> Result<Option<FactorCovariance>, StoreError> {
        Ok(self
            .working
            .covariances
            .range((market, Date::MIN)..=(market, Date::MAX))
            .next_back()
            .map(|(_, cov)| cov.clone()))
    }

    fn latest_exposures(&self, market: Market) -> Result<Vec<FactorExposure>, StoreError> {
        let in_market = |id: &StockId| self.working.stocks.get(id).is_some_and(|s| s.market == market);
        let Some(latest) =
            self.working.exposures.keys().filter(|(id, _)| in_market(id)).map(|(_, d)| *d).max()
        else {
            return Ok(Vec::new());
        };
        Ok(self
            .working
            .exposures
            .iter()
            .filter(|((id, d), _)| {
                *d == latest && self.working.stocks.get(id).is_some_and(|s| s.market == market && s.is_active)
            })
            .map(|(&(stock_id, date), styles)| FactorExposure { stock_id, date, styles: *styles })
            .collect())
    }
}

impl UnitOfWork for InMemoryStore {
    fn commit(&mut self) -> Result<(), StoreError> {
        self.committed = self.working.clone();
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.working = self.committed.clone();
        Ok(())
    }
}
