#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::SimulationConfig;

mod paths;
pub use paths::{
    GbmParameters, MIN_CORRELATION_EIGENVALUE, bootstrap_paths, correlation_factor, gbm_paths,
};

mod summary;
pub use summary::{DayPercentiles, PERCENTILE_LEVELS, SimulationSummary, summarize};

mod service;
pub use service::{
    ExcludedStock, PortfolioSimulationService, SimulationInputs, SimulationParameters,
    SimulationReport, SimulationResults, SimulationTarget,
};

mod error;
pub use error::SimulationError;

/// Re-export commonly used types.
pub mod prelude {
    pub use super::{
        PortfolioSimulationService, SimulationConfig, SimulationError, SimulationReport,
    };
}
