//! What a pipeline run did, step by step.

use std::{collections::BTreeMap, fmt};

use equirisk_model::{RiskIndicators, RunReport};
use equirisk_primitives::{Date, Market, MarketGroup, StockId};
use serde::Serialize;

use crate::{IntegrityReport, UniverseCounts};

/// Steps of a regional run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Fundamental ratios from statements and latest closes.
    Fundamentals,
    /// Exposures, factor returns and factor covariance.
    FactorModel,
    /// Beta, alpha and Sharpe per stock.
    Indicators,
    /// Per-sector aggregates.
    SectorAggregates,
    /// Universe data health counts.
    IntegrityCheck,
}

impl StepKind {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fundamentals => "fundamentals",
            Self::FactorModel => "factor_model",
            Self::Indicators => "indicators",
            Self::SectorAggregates => "sector_aggregates",
            Self::IntegrityCheck => "integrity_check",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "cause", content = "step", rename_all = "snake_case")]
pub enum SkipCause {
    /// No implementation was supplied for the step.
    NotConfigured,
    /// A step this one depends on failed or did not run.
    Upstream(StepKind),
    /// The safety gate aborted the run.
    SafetyAbort,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step ran to the end.
    Completed {
        /// Rows written or computed.
        rows: usize,
    },
    /// The step raised an error; dependants are skipped.
    Failed {
        /// Rendered error.
        error: String,
    },
    /// The step was not run.
    Skipped {
        /// Why.
        reason: SkipCause,
    },
}

impl StepOutcome {
    /// Whether the step ran to the end.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Result of the active-ratio check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SafetyOutcome {
    /// The universe was healthy; staged deactivations were committed.
    Passed {
        /// Region counts after deactivation.
        counts: UniverseCounts,
        /// Active share.
        ratio: f64,
    },
    /// Too few active stocks; staged deactivations were rolled back and nothing was
    /// computed.
    Aborted {
        /// Region counts the check saw.
        counts: UniverseCounts,
        /// Active share.
        ratio: f64,
        /// Threshold it had to exceed.
        threshold: f64,
    },
}

impl SafetyOutcome {
    /// Whether the gate passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// One executed or skipped step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// Step.
    pub step: StepKind,
    /// Outcome.
    pub outcome: StepOutcome,
}

/// Report of one regional run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Region run.
    pub region: MarketGroup,
    /// Computation date.
    pub date: Date,
    /// Stocks deactivated for having no closes; zero when the gate aborted.
    pub deactivated: usize,
    /// Safety gate result.
    pub safety: SafetyOutcome,
    /// Steps after the gate, in execution order.
    pub steps: Vec<StepRecord>,
    /// Factor model report per market.
    pub factor_runs: Vec<RunReport>,
    /// Risk indicators per market and stock.
    pub indicators: BTreeMap<Market, BTreeMap<StockId, RiskIndicators>>,
    /// Integrity counts per market.
    pub integrity: Vec<IntegrityReport>,
}

impl PipelineReport {
    /// Outcome of `step`, if it was recorded.
    #[must_use]
    pub fn outcome(&self, step: StepKind) -> Option<&StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.outcome)
    }

    /// Whether the gate passed and every recorded step completed or was not configured.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.safety.passed()
            && self.steps.iter().all(|r| {
                matches!(r.outcome, StepOutcome::Completed { .. })
                    || r.outcome == StepOutcome::Skipped { reason: SkipCause::NotConfigured }
            })
    }
}
