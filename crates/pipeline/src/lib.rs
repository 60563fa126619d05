#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::PipelineConfig;

pub mod logging;
pub use logging::{LogFormat, init_default_logging, init_logging};

mod universe;
pub use universe::{IntegrityReport, UniverseCounts, UniverseStore};

mod unit;
pub use unit::{ConnectionProvider, ScopedUnit};

mod step;
pub use step::ComputeStep;

mod report;
pub use report::{PipelineReport, SafetyOutcome, SkipCause, StepKind, StepOutcome, StepRecord};

mod controller;
pub use controller::{PipelineSafetyController, REGIONS};

mod error;
pub use error::PipelineError;

/// Re-export commonly used types.
pub mod prelude {
    pub use super::{
        ComputeStep, ConnectionProvider, PipelineConfig, PipelineError, PipelineReport,
        PipelineSafetyController, StepKind, StepOutcome,
    };
}
