#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod stock;
pub use stock::{NOT_APPLICABLE_SECTOR, Stock, StockId, Symbol, sector_is_assigned};

mod market;
pub use market::{Benchmark, Country, Market, MarketGroup};

mod factor;
pub use factor::{
    FactorCovariance, FactorExposure, FactorReturn, MARKET_FACTOR, StyleExposures, StyleFactor,
};

mod holding;
pub use holding::{FundamentalSnapshot, Holding, PriceBar, close_series, decimal_to_f64};

mod coverage;
pub use coverage::{DataCoverage, RiskTier, SimulationMethod};

mod series;
pub use series::LabeledSeries;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
