//! Daily factor model driver per market.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use equirisk_math::ewm_factor_covariance;
use equirisk_primitives::{
    Date, FactorCovariance, FactorExposure, Market, Stock, StockId, close_series, decimal_to_f64,
};
use equirisk_styles::{ExposureBuilder, ExposureSet, PriceFeatures, StockInputs};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    DesignMatrix, FactorModelConfig, FactorStore, MarketDataSource, ModelError, RiskIndicators,
    StoreError, UnitOfWork, build_exposure_vector, compute_risk_indicators, factor_beta,
    fit_cross_section, market_exposure,
};

/// Decimal places kept on stored exposures.
const EXPOSURE_DECIMALS: i32 = 4;

/// Why a market was not regressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Too few active, sector-assigned stocks.
    InsufficientStocks {
        /// Eligible stocks found.
        found: usize,
        /// Stocks required.
        required: usize,
    },
    /// Too few complete design rows with a return for the day.
    InsufficientValid {
        /// Valid rows found.
        found: usize,
        /// Rows required.
        required: usize,
    },
}

/// Counts of what a completed run wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Stocks that entered the regression.
    pub regression_rows: usize,
    /// Exposure rows written.
    pub exposures: usize,
    /// Factor return rows written.
    pub factor_returns: usize,
    /// Distinct factor-return dates stored for the market after this run.
    pub history_days: usize,
    /// Whether a covariance snapshot was written.
    pub covariance_updated: bool,
}

/// Outcome of one market run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every stage ran.
    Completed(RunSummary),
    /// The market was skipped at a gate; nothing was written.
    Skipped(SkipReason),
}

/// Report of one market run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Market the run covered.
    pub market: Market,
    /// Computation date.
    pub date: Date,
    /// Outcome.
    pub status: RunStatus,
}

impl RunReport {
    /// Whether the market was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.status, RunStatus::Skipped(_))
    }
}

/// Factor names of the latest stored factor-return date, sorted.
///
/// # Errors
/// Returns error if the store cannot be read.
pub fn latest_factor_names<S>(store: &S, market: Market) -> Result<Vec<String>, StoreError>
where
    S: FactorStore + ?Sized,
{
    let names: BTreeSet<String> =
        store.factor_return_history(market, 1)?.into_iter().map(|r| r.factor).collect();
    Ok(names.into_iter().collect())
}

/// Estimates and stores exposures, factor returns and factor covariance, and serves
/// factor betas from the stored model.
#[derive(Debug, Clone, Default)]
pub struct FactorModelService {
    config: FactorModelConfig,
}

impl FactorModelService {
    /// Create a service with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service with a custom configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the configuration does not validate.
    pub fn with_config(config: FactorModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &FactorModelConfig {
        &self.config
    }

    /// Run the daily model for `market` as of `date`.
    ///
    /// Exposures, factor returns and covariance are each committed as their own stage,
    /// so an error in a later stage leaves the earlier writes in place. Gates that stop
    /// the run are reported as [`RunStatus::Skipped`].
    ///
    /// # Errors
    /// Returns error if a collaborator call fails or the regression cannot be solved.
    pub fn run<U>(&self, uow: &mut U, market: Market, date: Date) -> Result<RunReport, ModelError>
    where
        U: MarketDataSource + FactorStore + UnitOfWork,
    {
        let report = |status| RunReport { market, date, status };
        let rf_daily = self.config.daily_risk_free(uow.risk_free_rate(market.country())?);

        let stocks = uow.eligible_stocks(market)?;
        if stocks.len() < self.config.min_eligible_stocks {
            warn!(market = %market, found = stocks.len(), "too few eligible stocks, skipping");
            return Ok(report(RunStatus::Skipped(SkipReason::InsufficientStocks {
                found: stocks.len(),
                required: self.config.min_eligible_stocks,
            })));
        }

        let inputs = self.stock_inputs(&*uow, market, &stocks)?;
        let exposures = ExposureBuilder::with_config(self.config.exposures.clone()).build(&inputs)?;

        let design = DesignMatrix::build(&exposures)?;
        let returns: HashMap<StockId, f64> = inputs
            .iter()
            .filter_map(|s| s.prices.return_today.map(|r| (s.stock_id, r - rf_daily)))
            .filter(|(_, r)| r.is_finite())
            .collect();
        let keep: Vec<bool> = design.stock_ids()?.iter().map(|id| returns.contains_key(id)).collect();
        let design = design.retain_rows(&keep)?;

        if design.height() < self.config.min_valid_rows {
            warn!(market = %market, found = design.height(), "too few valid regression rows, skipping");
            return Ok(report(RunStatus::Skipped(SkipReason::InsufficientValid {
                found: design.height(),
                required: self.config.min_valid_rows,
            })));
        }

        let ids = design.stock_ids()?;
        let caps = market_caps_by_id(&exposures);
        let y: Array1<f64> = ids.iter().map(|id| returns.get(id).copied().unwrap_or(f64::NAN)).collect();
        let mcap: Array1<f64> = ids.iter().map(|id| caps.get(id).copied().unwrap_or(f64::NAN)).collect();
        let fit = fit_cross_section(&design, &y, &mcap)?;
        debug!(market = %market, neutrality = fit.industry_neutrality(), "cross-section solved");

        let exposure_rows: Vec<FactorExposure> = exposures
            .rows()
            .filter(|(_, styles)| !styles.is_empty())
            .map(|(stock_id, styles)| FactorExposure { stock_id, date, styles: styles.rounded(EXPOSURE_DECIMALS) })
            .collect();
        let n_exposures = uow.upsert_exposures(&exposure_rows)?;
        uow.commit()?;

        let n_returns = uow.upsert_factor_returns(&fit.to_rows(market, date))?;
        uow.commit()?;

        let history_days = uow.count_factor_return_dates(market)?;
        let covariance_updated = if history_days >= self.config.min_covariance_days {
            let updated = self.update_covariance(uow, market, date)?;
            uow.commit()?;
            updated
        } else {
            debug!(market = %market, history_days, "not enough factor history for covariance");
            false
        };

        info!(
            market = %market,
            exposures = n_exposures,
            factor_returns = n_returns,
            history_days,
            covariance_updated,
            "factor model run complete"
        );

        Ok(report(RunStatus::Completed(RunSummary {
            regression_rows: ids.len(),
            exposures: n_exposures,
            factor_returns: n_returns,
            history_days,
            covariance_updated,
        })))
    }

    /// Factor beta of every stock with complete stored exposures.
    ///
    /// Empty when no covariance is stored or its dimension disagrees with the latest
    /// factor names; callers then fall back to OLS beta.
    ///
    /// # Errors
    /// Returns error if a collaborator call fails.
    pub fn get_betas<S>(&self, store: &S, market: Market) -> Result<BTreeMap<StockId, f64>, ModelError>
    where
        S: MarketDataSource + FactorStore + ?Sized,
    {
        let Some(covariance) = store.latest_covariance(market)? else {
            return Ok(BTreeMap::new());
        };
        let exposures = store.latest_exposures(market)?;
        if exposures.is_empty() {
            return Ok(BTreeMap::new());
        }
        let names = latest_factor_names(store, market)?;
        if names.is_empty() || !covariance.matches(names.len()) {
            debug!(market = %market, dim = covariance.dim(), factors = names.len(), "stale covariance");
            return Ok(BTreeMap::new());
        }

        let sectors = store.sectors(market)?;
        let x_m = market_exposure(&names);
        let mut betas = BTreeMap::new();
        for row in exposures {
            let Some(styles) = row.styles.complete() else {
                continue;
            };
            let sector = sectors.get(&row.stock_id).and_then(Option::as_deref);
            let x_i = build_exposure_vector(&styles, sector, &names);
            betas.insert(row.stock_id, factor_beta(&x_i, &x_m, &covariance.matrix)?);
        }
        Ok(betas)
    }

    /// Risk indicators of every stock in `market` with at least two closes.
    ///
    /// # Errors
    /// Returns error if a collaborator call fails.
    pub fn market_indicators<S>(
        &self,
        source: &S,
        market: Market,
    ) -> Result<BTreeMap<StockId, RiskIndicators>, ModelError>
    where
        S: MarketDataSource + FactorStore + ?Sized,
    {
        let price_map = source.price_history(market, self.config.price_limit)?;
        if price_map.is_empty() {
            warn!(market = %market, "no price data");
            return Ok(BTreeMap::new());
        }

        let benchmark = source.benchmark_history(market.benchmark(), self.config.price_limit)?;
        let benchmark_returns = (!benchmark.is_empty()).then(|| close_series(&benchmark).pct_change());
        let rf_pct = source.risk_free_rate(market.country())?.unwrap_or(self.config.default_risk_free_rate);
        let factor_betas = self.get_betas(source, market)?;

        let mut out = BTreeMap::new();
        for (stock_id, bars) in &price_map {
            if bars.len() < 2 {
                continue;
            }
            let returns = close_series(bars).pct_change();
            let indicators = compute_risk_indicators(
                &returns,
                benchmark_returns.as_ref(),
                rf_pct,
                factor_betas.get(stock_id).copied(),
            );
            out.insert(*stock_id, indicators);
        }

        let factor_used = price_map.keys().filter(|id| factor_betas.contains_key(id)).count();
        info!(
            market = %market,
            computed = out.len(),
            total = price_map.len(),
            factor_betas = factor_used,
            "risk indicators computed"
        );
        Ok(out)
    }

    fn stock_inputs<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
        market: Market,
        stocks: &[Stock],
    ) -> Result<Vec<StockInputs>, ModelError> {
        let ids: Vec<StockId> = stocks.iter().map(|s| s.id).collect();
        let price_map = source.price_history(market, self.config.price_limit)?;
        let fundamentals: HashMap<StockId, _> =
            source.fundamentals(&ids)?.into_iter().map(|f| (f.stock_id, f)).collect();

        let inputs = stocks
            .iter()
            .map(|stock| {
                let mut inputs = StockInputs::new(stock.id, stock.sector.as_deref());
                if let Some(bars) = price_map.get(&stock.id) {
                    let closes: Vec<f64> = bars.iter().map(|b| b.close_f64()).collect();
                    inputs.prices = PriceFeatures::from_closes(&closes, &self.config.prices);
                }
                if let Some(f) = fundamentals.get(&stock.id) {
                    inputs.shares_outstanding = f.shares_outstanding.map(decimal_to_f64);
                    inputs.price_to_book = f.price_to_book.map(decimal_to_f64);
                    inputs.return_on_equity = f.return_on_equity.map(decimal_to_f64);
                    inputs.operating_margin = f.operating_margin.map(decimal_to_f64);
                    inputs.debt_ratio = f.debt_ratio.map(decimal_to_f64);
                }
                inputs
            })
            .collect();
        Ok(inputs)
    }

    /// Estimate the covariance over the stored history, oldest to newest, in sorted factor
    /// order. Missing `(date, factor)` cells count as zero.
    fn update_covariance<S: FactorStore + ?Sized>(
        &self,
        store: &mut S,
        market: Market,
        date: Date,
    ) -> Result<bool, ModelError> {
        let history = store.factor_return_history(market, self.config.covariance_history)?;
        if history.is_empty() {
            return Ok(false);
        }

        let dates: BTreeSet<Date> = history.iter().map(|r| r.date).collect();
        let names: BTreeSet<&str> = history.iter().map(|r| r.factor.as_str()).collect();
        let date_idx: HashMap<Date, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let name_idx: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let mut matrix = Array2::zeros((dates.len(), names.len()));
        for r in &history {
            matrix[[date_idx[&r.date], name_idx[r.factor.as_str()]]] = r.value;
        }

        let cov = ewm_factor_covariance(&matrix, self.config.factor_half_life)?;
        store.upsert_covariance(&FactorCovariance::new(market, date, cov))?;
        info!(market = %market, dates = dates.len(), factors = names.len(), "factor covariance updated");
        Ok(true)
    }
}

fn market_caps_by_id(exposures: &ExposureSet) -> HashMap<StockId, f64> {
    exposures.stock_ids.iter().copied().zip(exposures.market_caps.iter().copied()).collect()
}
