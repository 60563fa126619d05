//! Full risk analysis of one portfolio.

use std::collections::HashMap;

use equirisk_math::{sample_covariance, stats::round_to};
use equirisk_model::{FactorStore, MarketDataSource};
use equirisk_primitives::{Benchmark, MarketGroup, PriceBar, Stock, StockId};
use ndarray::Array1;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    AnalysisConfig, BenchmarkChart, BenchmarkComparison, DiversificationMetrics, FactorRisk,
    HypotheticalReturns, Portfolio, PortfolioError, PortfolioSource, PriceHistory, RiskScore,
    Section, Unavailable, UnknownReason, benchmark_chart, benchmark_volatility,
    build_hypothetical_returns, compare_with_benchmark, compute_diversification,
    compute_factor_risk, compute_mcar, compute_risk_score, holding_weights,
};

/// Risk share of one holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockContribution {
    /// Held stock.
    pub stock_id: StockId,
    /// Ticker, "?" when the stock is unknown.
    pub symbol: String,
    /// Portfolio weight.
    pub weight: f64,
    /// Marginal contribution to risk.
    pub mcar: f64,
    /// Share of portfolio risk.
    pub contribution_pct: f64,
}

/// Volatility split across holdings, with the factor view when one is available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDecompositionReport {
    /// Daily portfolio volatility from the sample return covariance.
    pub portfolio_vol: f64,
    /// Per-holding contributions, in holding order.
    pub stock_contributions: Vec<StockContribution>,
    /// Factor risk from the first market of the portfolio's group with a usable model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor_analysis: Option<FactorRisk>,
}

/// Every section of a portfolio analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioAnalysis {
    /// Risk score against the benchmark.
    pub risk_score: Section<RiskScore>,
    /// MCAR and factor risk.
    pub risk_decomposition: Section<RiskDecompositionReport>,
    /// Concentration metrics.
    pub diversification: Section<DiversificationMetrics>,
    /// Cumulative return against the benchmark.
    pub benchmark_comparison: Section<BenchmarkComparison>,
    /// Growth series against the benchmark.
    pub benchmark_chart: Section<BenchmarkChart>,
}

impl PortfolioAnalysis {
    fn no_holdings() -> Self {
        Self {
            risk_score: Section::unavailable(Unavailable::NoHoldings),
            risk_decomposition: Section::unavailable(Unavailable::NoHoldings),
            diversification: Section::unavailable(Unavailable::NoHoldings),
            benchmark_comparison: Section::unavailable(Unavailable::NoHoldings),
            benchmark_chart: Section::unavailable(Unavailable::NoHoldings),
        }
    }
}

/// Benchmark a portfolio is compared with; untagged portfolios use the US benchmark.
#[must_use]
pub fn portfolio_benchmark(group: Option<MarketGroup>) -> Benchmark {
    group.map_or(Benchmark::UsSp500, |g| g.benchmark())
}

/// Runs portfolio analyses against a data source.
#[derive(Debug, Clone, Default)]
pub struct PortfolioAnalysisService {
    config: AnalysisConfig,
}

impl PortfolioAnalysisService {
    /// Create a service with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service with a custom configuration.
    ///
    /// # Errors
    /// Returns `PortfolioError::InvalidConfig` if the configuration does not validate.
    pub fn with_config(config: AnalysisConfig) -> Result<Self, PortfolioError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse `portfolio`: risk score, risk decomposition, diversification and
    /// benchmark comparison and chart, all over one load of prices.
    ///
    /// # Errors
    /// Returns error if a collaborator call fails.
    pub fn full_analysis<S>(&self, source: &S, portfolio: &Portfolio) -> Result<PortfolioAnalysis, PortfolioError>
    where
        S: PortfolioSource + MarketDataSource + FactorStore + ?Sized,
    {
        if portfolio.holdings.is_empty() {
            debug!(portfolio = portfolio.id, "no holdings");
            return Ok(PortfolioAnalysis::no_holdings());
        }

        let stock_ids = portfolio.stock_ids();
        let weights = holding_weights(&portfolio.holdings);
        let benchmark = portfolio_benchmark(portfolio.market_group);

        let history = PriceHistory::load(source, &stock_ids, self.config.lookback)?;
        let stocks = source.stocks(&stock_ids)?;
        let bench_prices = source.benchmark_history(benchmark, self.config.benchmark_limit())?;
        if bench_prices.is_empty() {
            warn!(portfolio = portfolio.id, benchmark = benchmark.display_name(), "no benchmark prices");
        }

        let hyp = build_hypothetical_returns(
            &history,
            &stock_ids,
            &weights,
            self.config.lookback,
            self.config.min_data_points,
        )?;

        let risk_decomposition = self.risk_decomposition(source, portfolio, &hyp, &history, &weights, &stocks)?;
        let sectors: Vec<Option<String>> =
            stock_ids.iter().map(|id| stocks.get(id).and_then(|s| s.sector.clone())).collect();

        let analysis = PortfolioAnalysis {
            risk_score: Section::Ready(self.risk_score(&hyp, &bench_prices)),
            risk_decomposition,
            diversification: Section::Ready(compute_diversification(&weights, None, Some(sectors.as_slice()))),
            benchmark_comparison: if hyp.is_sufficient() {
                compare_with_benchmark(&hyp.returns, &bench_prices, benchmark.display_name(), &self.config).into()
            } else {
                Section::unavailable(Unavailable::InsufficientData)
            },
            benchmark_chart: benchmark_chart(
                &history,
                &stock_ids,
                &weights,
                &bench_prices,
                benchmark.display_name(),
                &self.config,
            )
            .into(),
        };

        info!(
            portfolio = portfolio.id,
            holdings = stock_ids.len(),
            coverage = %hyp.coverage,
            effective_lookback = hyp.effective_lookback,
            "portfolio analysed"
        );
        Ok(analysis)
    }

    /// Risk score of hypothetical returns against benchmark closes.
    #[must_use]
    pub fn risk_score(&self, hyp: &HypotheticalReturns, bench_prices: &[PriceBar]) -> RiskScore {
        if !hyp.is_sufficient() {
            return RiskScore::Unknown {
                reason: UnknownReason::InsufficientData,
                effective_lookback: Some(hyp.effective_lookback),
            };
        }
        let window = hyp.effective_lookback.min(self.config.lookback);
        let bench_vol = benchmark_volatility(bench_prices, window, &self.config);
        compute_risk_score(&hyp.returns, hyp.effective_lookback, bench_vol, &self.config)
    }

    fn risk_decomposition<S>(
        &self,
        source: &S,
        portfolio: &Portfolio,
        hyp: &HypotheticalReturns,
        history: &PriceHistory,
        weights: &Array1<f64>,
        stocks: &HashMap<StockId, Stock>,
    ) -> Result<Section<RiskDecompositionReport>, PortfolioError>
    where
        S: MarketDataSource + FactorStore + ?Sized,
    {
        if !hyp.is_sufficient() {
            return Ok(Section::unavailable(Unavailable::InsufficientDecompositionData));
        }
        let stock_ids = portfolio.stock_ids();
        let returns = match history.returns_matrix(&stock_ids, self.config.min_matrix_days) {
            Ok(returns) => returns,
            Err(PortfolioError::InsufficientData { .. }) => return Ok(Section::unavailable(Unavailable::ReturnsMatrix)),
            Err(err) => return Err(err),
        };
        let mcar = compute_mcar(weights, &sample_covariance(&returns)?)?;

        let stock_contributions = stock_ids
            .iter()
            .enumerate()
            .map(|(i, id)| StockContribution {
                stock_id: *id,
                symbol: stocks.get(id).map_or_else(|| "?".to_string(), |s| s.symbol.as_str().to_string()),
                weight: round_to(weights[i], 6),
                mcar: mcar.mcar[i],
                contribution_pct: mcar.contribution_pct[i],
            })
            .collect();

        let mut factor_analysis = None;
        for market in portfolio.market_group.iter().flat_map(MarketGroup::markets) {
            if let Some(risk) = compute_factor_risk(source, &stock_ids, weights, market)? {
                factor_analysis = Some(risk);
                break;
            }
        }

        Ok(Section::Ready(RiskDecompositionReport {
            portfolio_vol: mcar.portfolio_vol,
            stock_contributions,
            factor_analysis,
        }))
    }
}
