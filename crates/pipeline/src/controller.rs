//! Ordered, failure-isolated execution of a regional batch.

use std::{collections::BTreeMap, fmt};

use equirisk_model::{FactorModelService, FactorStore, MarketDataSource, RunReport, RunStatus, UnitOfWork};
use equirisk_primitives::{Date, Market, MarketGroup};
use tracing::{debug, error, info, warn};

use crate::{
    ComputeStep, ConnectionProvider, IntegrityReport, PipelineConfig, PipelineError, PipelineReport, SafetyOutcome,
    SkipCause, StepKind, StepOutcome, StepRecord, UniverseCounts, UniverseStore,
};

/// Regions in the order a full run visits them.
pub const REGIONS: [MarketGroup; 2] = [MarketGroup::Kr, MarketGroup::Us];

/// Runs the daily batch of a region behind an active-universe safety gate.
///
/// Steps run strictly one after another, each on its own scoped unit of work. A failing
/// step is recorded and skips its dependants; the integrity check runs regardless, even
/// after the gate aborted.
pub struct PipelineSafetyController<C> {
    config: PipelineConfig,
    factor_model: FactorModelService,
    fundamentals: Option<Box<dyn ComputeStep<C>>>,
    sector_aggregates: Option<Box<dyn ComputeStep<C>>>,
}

impl<C> fmt::Debug for PipelineSafetyController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSafetyController")
            .field("config", &self.config)
            .field("factor_model", &self.factor_model)
            .field("fundamentals", &self.fundamentals.is_some())
            .field("sector_aggregates", &self.sector_aggregates.is_some())
            .finish()
    }
}

impl<C> Default for PipelineSafetyController<C> {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            factor_model: FactorModelService::default(),
            fundamentals: None,
            sector_aggregates: None,
        }
    }
}

impl<C> PipelineSafetyController<C>
where
    C: MarketDataSource + FactorStore + UniverseStore + UnitOfWork,
{
    /// Create a controller with default thresholds, the default factor model and no
    /// fundamentals or sector aggregate steps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with custom thresholds.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` if the thresholds do not validate.
    pub fn with_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, ..Self::default() })
    }

    /// Use `service` for the factor model and indicator steps.
    #[must_use]
    pub fn with_factor_model(mut self, service: FactorModelService) -> Self {
        self.factor_model = service;
        self
    }

    /// Run `step` as the fundamentals step.
    #[must_use]
    pub fn with_fundamentals<S>(mut self, step: S) -> Self
    where
        S: ComputeStep<C> + 'static,
    {
        self.fundamentals = Some(Box::new(step));
        self
    }

    /// Run `step` as the sector aggregates step.
    #[must_use]
    pub fn with_sector_aggregates<S>(mut self, step: S) -> Self
    where
        S: ComputeStep<C> + 'static,
    {
        self.sector_aggregates = Some(Box::new(step));
        self
    }

    /// Get the thresholds.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every region in [`REGIONS`] order.
    ///
    /// # Errors
    /// Returns the first error of [`Self::run_region`]; regions already run keep their
    /// committed writes.
    pub fn run_all<P>(&self, provider: &mut P, date: Date) -> Result<Vec<PipelineReport>, PipelineError>
    where
        P: ConnectionProvider<Connection = C>,
    {
        REGIONS.iter().map(|&region| self.run_region(provider, region, date)).collect()
    }

    /// Run the batch of `region` as of `date`.
    ///
    /// # Errors
    /// Returns error only when the deactivation and safety gate cannot be read or
    /// written. Failures of later steps are recorded in the report.
    pub fn run_region<P>(&self, provider: &mut P, region: MarketGroup, date: Date) -> Result<PipelineReport, PipelineError>
    where
        P: ConnectionProvider<Connection = C>,
    {
        let markets = region.markets();
        let (safety, deactivated) = self.safety_gate(provider, region, &markets)?;

        let mut report = PipelineReport {
            region,
            date,
            deactivated,
            safety,
            steps: Vec::new(),
            factor_runs: Vec::new(),
            indicators: BTreeMap::new(),
            integrity: Vec::new(),
        };

        if safety.passed() {
            self.compute(provider, &markets, date, &mut report);
        } else {
            for step in [StepKind::Fundamentals, StepKind::FactorModel, StepKind::Indicators, StepKind::SectorAggregates] {
                skip(&mut report, step, SkipCause::SafetyAbort);
            }
        }

        let integrity = attempt(provider, |conn| integrity_stats(conn, &markets));
        if let Some(stats) = record(&mut report, StepKind::IntegrityCheck, integrity, Vec::len) {
            self.review_integrity(&stats);
            report.integrity = stats;
        }

        info!(region = %region, clean = report.is_clean(), deactivated = report.deactivated, "pipeline run finished");
        Ok(report)
    }

    fn safety_gate<P>(
        &self,
        provider: &mut P,
        region: MarketGroup,
        markets: &[Market],
    ) -> Result<(SafetyOutcome, usize), PipelineError>
    where
        P: ConnectionProvider<Connection = C>,
    {
        let mut unit = provider.acquire()?;
        let mut deactivated = 0;
        for &market in markets {
            deactivated += unit.deactivate_no_price_stocks(market)?;
        }

        let counts = markets
            .iter()
            .map(|&market| unit.universe_counts(market))
            .try_fold(UniverseCounts::default(), |acc, counts| counts.map(|c| acc + c))?;
        let ratio = counts.active_ratio();
        let threshold = self.config.min_active_ratio;

        if ratio > threshold {
            unit.commit()?;
            info!(region = %region, deactivated, active = counts.active, total = counts.total, ratio, "safety gate passed");
            Ok((SafetyOutcome::Passed { counts, ratio }, deactivated))
        } else {
            unit.rollback()?;
            error!(
                region = %region,
                active = counts.active,
                total = counts.total,
                ratio,
                threshold,
                "active universe too small, aborting computation"
            );
            Ok((SafetyOutcome::Aborted { counts, ratio, threshold }, 0))
        }
    }

    fn compute<P>(&self, provider: &mut P, markets: &[Market], date: Date, report: &mut PipelineReport)
    where
        P: ConnectionProvider<Connection = C>,
    {
        let fundamentals_ok = match &self.fundamentals {
            Some(step) => {
                let result = attempt(provider, |conn| step.run(conn, markets, date));
                record(report, StepKind::Fundamentals, result, |rows| *rows).is_some()
            }
            None => {
                skip(report, StepKind::Fundamentals, SkipCause::NotConfigured);
                true
            }
        };

        if !fundamentals_ok {
            skip(report, StepKind::FactorModel, SkipCause::Upstream(StepKind::Fundamentals));
            skip(report, StepKind::Indicators, SkipCause::Upstream(StepKind::FactorModel));
            skip(report, StepKind::SectorAggregates, SkipCause::Upstream(StepKind::FactorModel));
            return;
        }

        let result = attempt(provider, |conn| self.factor_runs(conn, markets, date));
        let Some(runs) = record(report, StepKind::FactorModel, result, |runs| runs.iter().map(exposures_written).sum())
        else {
            skip(report, StepKind::Indicators, SkipCause::Upstream(StepKind::FactorModel));
            skip(report, StepKind::SectorAggregates, SkipCause::Upstream(StepKind::FactorModel));
            return;
        };
        report.factor_runs = runs;

        let result = attempt(provider, |conn| {
            markets
                .iter()
                .map(|&market| Ok::<_, PipelineError>((market, self.factor_model.market_indicators(&*conn, market)?)))
                .collect::<Result<BTreeMap<_, _>, PipelineError>>()
        });
        if let Some(indicators) =
            record(report, StepKind::Indicators, result, |by_market| by_market.values().map(BTreeMap::len).sum())
        {
            report.indicators = indicators;
        }

        match &self.sector_aggregates {
            Some(step) => {
                let result = attempt(provider, |conn| step.run(conn, markets, date));
                record(report, StepKind::SectorAggregates, result, |rows| *rows);
            }
            None => skip(report, StepKind::SectorAggregates, SkipCause::NotConfigured),
        }
    }

    fn factor_runs(&self, conn: &mut C, markets: &[Market], date: Date) -> Result<Vec<RunReport>, PipelineError> {
        let mut runs = Vec::with_capacity(markets.len());
        for &market in markets {
            let run = self.factor_model.run(conn, market, date)?;
            if let RunStatus::Skipped(reason) = &run.status {
                debug!(market = %market, ?reason, "factor model skipped market");
            }
            runs.push(run);
        }
        Ok(runs)
    }

    fn review_integrity(&self, stats: &[IntegrityReport]) {
        for report in stats {
            match report.unclassified_ratio() {
                Some(ratio) if ratio > self.config.max_unclassified_ratio => warn!(
                    market = %report.market,
                    active = report.active_total,
                    sector_null = report.sector_null,
                    sector_na = report.sector_na,
                    ratio,
                    "many active stocks are left out of the factor model for lack of a sector"
                ),
                _ => debug!(
                    market = %report.market,
                    active = report.active_total,
                    no_fs = report.no_fs,
                    no_price = report.no_price,
                    "integrity checked"
                ),
            }
        }
    }
}

/// Run `work` on a freshly acquired unit; uncommitted writes are rolled back on release.
fn attempt<P, T>(provider: &mut P, work: impl FnOnce(&mut P::Connection) -> Result<T, PipelineError>) -> Result<T, PipelineError>
where
    P: ConnectionProvider,
{
    let mut unit = provider.acquire()?;
    work(&mut *unit)
}

fn record<T>(
    report: &mut PipelineReport,
    step: StepKind,
    result: Result<T, PipelineError>,
    rows: impl FnOnce(&T) -> usize,
) -> Option<T> {
    match result {
        Ok(value) => {
            let rows = rows(&value);
            info!(region = %report.region, step = %step, rows, "step completed");
            report.steps.push(StepRecord { step, outcome: StepOutcome::Completed { rows } });
            Some(value)
        }
        Err(err) => {
            error!(region = %report.region, step = %step, error = %err, "step failed");
            report.steps.push(StepRecord { step, outcome: StepOutcome::Failed { error: err.to_string() } });
            None
        }
    }
}

fn skip(report: &mut PipelineReport, step: StepKind, reason: SkipCause) {
    debug!(region = %report.region, step = %step, ?reason, "step skipped");
    report.steps.push(StepRecord { step, outcome: StepOutcome::Skipped { reason } });
}

fn integrity_stats<C: UniverseStore + ?Sized>(conn: &C, markets: &[Market]) -> Result<Vec<IntegrityReport>, PipelineError> {
    markets.iter().map(|&market| conn.integrity_stats(market).map_err(PipelineError::from)).collect()
}

const fn exposures_written(run: &RunReport) -> usize {
    match &run.status {
        RunStatus::Completed(summary) => summary.exposures,
        RunStatus::Skipped(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use equirisk_model::InMemoryStore;
    use equirisk_primitives::{PriceBar, Stock, StockId};
    use rust_decimal::Decimal;

    use super::*;

    fn day() -> Date {
        Date::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn empty_universe_aborts() {
        let mut store = InMemoryStore::new();
        let controller = PipelineSafetyController::<InMemoryStore>::new();
        let report = controller.run_region(&mut store, MarketGroup::Us, day()).unwrap();

        assert!(!report.safety.passed());
        assert_eq!(report.steps.len(), 5);
        assert_eq!(
            report.outcome(StepKind::FactorModel),
            Some(&StepOutcome::Skipped { reason: SkipCause::SafetyAbort })
        );
        assert_eq!(report.outcome(StepKind::IntegrityCheck), Some(&StepOutcome::Completed { rows: 2 }));
    }

    #[test]
    fn failing_fundamentals_gate_the_factor_model() {
        let mut store = InMemoryStore::new();
        store.add_stock(Stock::new(StockId::new(1), "A", Market::UsNyse, Some("Tech")));
        store.add_prices(StockId::new(1), [PriceBar::new(day(), Decimal::from(10))]);
        let controller = PipelineSafetyController::<InMemoryStore>::new().with_fundamentals(
            |_: &mut InMemoryStore, _: &[Market], _: Date| -> Result<usize, PipelineError> {
                Err(PipelineError::Compute("statement feed empty".to_string()))
            },
        );
        let report = controller.run_region(&mut store, MarketGroup::Us, day()).unwrap();

        assert!(report.safety.passed());
        assert!(matches!(report.outcome(StepKind::Fundamentals), Some(StepOutcome::Failed { .. })));
        assert_eq!(
            report.outcome(StepKind::FactorModel),
            Some(&StepOutcome::Skipped { reason: SkipCause::Upstream(StepKind::Fundamentals) })
        );
        assert!(report.factor_runs.is_empty());
        assert!(report.outcome(StepKind::IntegrityCheck).is_some_and(StepOutcome::is_completed));
    }

    #[test]
    fn rejects_invalid_thresholds() {
        let config = PipelineConfig { min_active_ratio: 2.0, ..PipelineConfig::default() };
        assert!(PipelineSafetyController::<InMemoryStore>::with_config(config).is_err());
    }
}
