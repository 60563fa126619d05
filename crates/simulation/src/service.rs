//! Simulation requests against a portfolio.

use std::collections::{BTreeMap, HashMap};

use equirisk_math::stats::round_to;
use equirisk_portfolio::{Portfolio, PortfolioSource, PriceHistory, simple_returns};
use equirisk_primitives::{DataCoverage, Holding, SimulationMethod, Stock, StockId};
use ndarray::{Array1, Array2};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::{GbmParameters, SimulationConfig, SimulationError, bootstrap_paths, gbm_paths, summarize};

/// Returns and closes the paths are generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInputs {
    /// Simulated holdings, in holding order.
    pub stock_ids: Vec<StockId>,
    /// Holdings dropped for a short history.
    pub excluded: Vec<StockId>,
    /// `T x N` daily simple returns over the common dates of `stock_ids`.
    pub returns: Array2<f64>,
    /// Close of each simulated holding on the last common date.
    pub current_prices: Array1<f64>,
}

impl SimulationInputs {
    /// Align the holdings on their common trading dates.
    ///
    /// When fewer than `min_data_points` dates are shared, a holding is dropped if the
    /// others alone share at least `min_data_points` dates and more than all of them do.
    ///
    /// # Errors
    /// Returns `SimulationError::InsufficientData` with fewer than `min_data_points`
    /// daily returns left.
    pub fn build(
        history: &PriceHistory,
        stock_ids: &[StockId],
        min_data_points: usize,
    ) -> Result<Self, SimulationError> {
        let common = |ids: &[StockId]| history.common_dates(ids).unwrap_or_default();
        let mut dates = common(stock_ids);

        let mut excluded = Vec::new();
        if dates.len() < min_data_points {
            for (i, id) in stock_ids.iter().enumerate() {
                let others: Vec<StockId> =
                    stock_ids.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, s)| *s).collect();
                if others.is_empty() {
                    continue;
                }
                let alternative = common(others.as_slice()).len();
                if alternative >= min_data_points && alternative > dates.len() {
                    excluded.push(*id);
                }
            }
        }

        let active: Vec<StockId> = stock_ids.iter().filter(|id| !excluded.contains(id)).copied().collect();
        if !excluded.is_empty() {
            dates = common(active.as_slice());
            debug!(excluded = excluded.len(), dates = dates.len(), "dropped short histories");
        }

        let effective = dates.len().saturating_sub(1);
        if effective < min_data_points {
            return Err(SimulationError::InsufficientData { required: min_data_points, actual: effective });
        }

        let prices = history.price_matrix(&active, &dates);
        let current_prices = prices.row(prices.nrows() - 1).to_owned();
        Ok(Self { stock_ids: active, excluded, returns: simple_returns(&prices), current_prices })
    }

    /// Return observations the paths are drawn from.
    #[must_use]
    pub fn effective_lookback(&self) -> usize {
        self.returns.nrows()
    }

    /// Coverage of the holdings.
    #[must_use]
    pub fn coverage(&self) -> DataCoverage {
        if self.excluded.is_empty() { DataCoverage::Full } else { DataCoverage::Partial }
    }
}

/// What was simulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationTarget {
    /// Always "portfolio".
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Simulated portfolio.
    pub portfolio_id: u64,
    /// Market group label, "UNKNOWN" when untagged.
    pub market_group: &'static str,
    /// Holdings actually simulated.
    pub holdings_count: usize,
    /// Value of the simulated holdings at the last common close.
    pub current_value: f64,
}

/// Risk figures of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResults {
    /// Mean final value over current value, minus one.
    pub expected_return: f64,
    /// Value at risk, as a return.
    pub var: f64,
    /// Conditional value at risk, as a return.
    pub cvar: f64,
    /// Final portfolio value by percentile level.
    pub final_value_percentiles: BTreeMap<u8, f64>,
}

/// History the simulation was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationParameters {
    /// Closes requested per holding.
    pub lookback_days: usize,
    /// Daily returns actually used.
    pub effective_lookback_days: usize,
    /// Daily returns required.
    pub min_data_points: usize,
}

/// A holding left out of the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedStock {
    /// Dropped stock.
    pub stock_id: StockId,
    /// Ticker, "?" when the stock is unknown.
    pub symbol: String,
}

/// Response to a simulation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    /// What was simulated.
    pub target: SimulationTarget,
    /// Trading days simulated forward.
    pub simulation_days: usize,
    /// Number of simulated paths.
    pub num_simulations: usize,
    /// Path generator.
    pub method: SimulationMethod,
    /// Confidence level of VaR and CVaR.
    pub confidence: f64,
    /// Risk figures.
    pub results: SimulationResults,
    /// History used.
    pub parameters: SimulationParameters,
    /// `PARTIAL` when holdings were dropped.
    pub data_coverage: DataCoverage,
    /// Dropped holdings.
    pub excluded_stocks: Vec<ExcludedStock>,
}

/// Runs Monte Carlo simulations of portfolios.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSimulationService {
    config: SimulationConfig,
}

impl PortfolioSimulationService {
    /// Create a service with the default request parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service for specific request parameters.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidConfig` if the parameters do not validate.
    pub fn with_config(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate the value of `portfolio`.
    ///
    /// # Errors
    /// Returns `SimulationError::NoHoldings` for an empty portfolio,
    /// `SimulationError::InsufficientData` when too few trading days are shared, and
    /// the source's error when it cannot be read.
    pub fn run<S>(&self, source: &S, portfolio: &Portfolio) -> Result<SimulationReport, SimulationError>
    where
        S: PortfolioSource + ?Sized,
    {
        if portfolio.holdings.is_empty() {
            return Err(SimulationError::NoHoldings);
        }
        let config = &self.config;
        let stock_ids = portfolio.stock_ids();
        let stocks = source.stocks(&stock_ids)?;
        let history = PriceHistory::load(source, &stock_ids, config.lookback)?;
        let inputs = SimulationInputs::build(&history, &stock_ids, config.min_data_points)?;

        let shares: Array1<f64> = portfolio
            .holdings
            .iter()
            .filter(|h| !inputs.excluded.contains(&h.stock_id))
            .map(Holding::shares_f64)
            .collect();

        let mut rng = config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let paths = match config.method {
            SimulationMethod::Bootstrap => bootstrap_paths(
                &inputs.current_prices,
                &inputs.returns,
                &shares,
                config.days,
                config.num_simulations,
                &mut rng,
            )?,
            SimulationMethod::Gbm => {
                let params = GbmParameters::estimate(&inputs.returns)?;
                gbm_paths(&inputs.current_prices, &params, &shares, config.days, config.num_simulations, &mut rng)?
            }
        };
        let summary = summarize(&paths, config.confidence)?;

        info!(
            portfolio = portfolio.id,
            method = %config.method,
            simulations = config.num_simulations,
            effective_lookback = inputs.effective_lookback(),
            excluded = inputs.excluded.len(),
            "portfolio simulated"
        );

        Ok(SimulationReport {
            target: SimulationTarget {
                kind: "portfolio",
                portfolio_id: portfolio.id,
                market_group: portfolio.market_group_label(),
                holdings_count: inputs.stock_ids.len(),
                current_value: round_to(inputs.current_prices.dot(&shares), 2),
            },
            simulation_days: config.days,
            num_simulations: config.num_simulations,
            method: config.method,
            confidence: config.confidence,
            results: SimulationResults {
                expected_return: summary.expected_return,
                var: summary.var,
                cvar: summary.cvar,
                final_value_percentiles: summary.final_value_percentiles,
            },
            parameters: SimulationParameters {
                lookback_days: config.lookback,
                effective_lookback_days: inputs.effective_lookback(),
                min_data_points: config.min_data_points,
            },
            data_coverage: inputs.coverage(),
            excluded_stocks: excluded_stocks(&inputs.excluded, &stocks),
        })
    }
}

fn excluded_stocks(excluded: &[StockId], stocks: &HashMap<StockId, Stock>) -> Vec<ExcludedStock> {
    excluded
        .iter()
        .map(|id| ExcludedStock {
            stock_id: *id,
            symbol: stocks.get(id).map_or_else(|| "?".to_string(), |s| s.symbol.as_str().to_string()),
        })
        .collect()
}
