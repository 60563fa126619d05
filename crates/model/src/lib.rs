#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::FactorModelConfig;

mod store;
pub use store::{FactorStore, MarketDataSource, StoreError, UnitOfWork};

mod memory;
pub use memory::InMemoryStore;

mod design;
pub use design::DesignMatrix;

mod regression;
pub use regression::{CrossSectionFit, fit_cross_section, industry_cap_shares, regression_weights};

mod beta;
pub use beta::{
    RiskDecomposition, build_exposure_vector, factor_beta, market_exposure, ols_beta,
    risk_decomposition,
};

mod indicators;
pub use indicators::{
    BetaSource, RiskIndicators, TRADING_DAYS, compute_risk_indicators, jensen_alpha, sharpe_ratio,
};

mod service;
pub use service::{
    FactorModelService, RunReport, RunStatus, RunSummary, SkipReason, latest_factor_names,
};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use super::{
        FactorModelConfig, FactorModelService, FactorStore, MarketDataSource, ModelError,
        RunStatus, UnitOfWork,
    };
}
