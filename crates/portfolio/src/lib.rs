#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::AnalysisConfig;

mod source;
pub use source::{Portfolio, PortfolioSource};

mod prices;
pub use prices::{PriceHistory, holding_weights, simple_returns};

mod returns;
pub use returns::{HypotheticalReturns, build_hypothetical_returns};

mod mcar;
pub use mcar::{McarResult, compute_mcar};

mod diversification;
pub use diversification::{
    DiversificationMetrics, UNKNOWN_SECTOR, VolatilityInputs, compute_diversification,
};

mod risk_score;
pub use risk_score::{
    RiskScore, UnknownReason, annualized_volatility, benchmark_volatility, compute_risk_score,
};

mod factor_risk;
pub use factor_risk::{FactorRisk, PLACEHOLDER_SPECIFIC_VARIANCE, compute_factor_risk};

mod benchmark;
pub use benchmark::{
    BenchmarkChart, BenchmarkComparison, ChartPoint, benchmark_chart, compare_with_benchmark,
};

mod section;
pub use section::{Section, Unavailable};

mod analysis;
pub use analysis::{
    PortfolioAnalysis, PortfolioAnalysisService, RiskDecompositionReport, StockContribution,
    portfolio_benchmark,
};

mod error;
pub use error::PortfolioError;

/// Re-export commonly used types.
pub mod prelude {
    pub use super::{
        AnalysisConfig, Portfolio, PortfolioAnalysis, PortfolioAnalysisService, PortfolioError,
        PortfolioSource, RiskScore, Section,
    };
}
