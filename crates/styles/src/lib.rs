#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod descriptor;
pub use descriptor::{StockInputs, StyleDescriptor};

mod price;
pub use price::{PriceFeatureConfig, PriceFeatures};

mod size;
pub use size::SizeStyle;

mod value;
pub use value::ValueStyle;

mod momentum;
pub use momentum::MomentumStyle;

mod volatility;
pub use volatility::VolatilityStyle;

mod quality;
pub use quality::QualityStyle;

mod leverage;
pub use leverage::LeverageStyle;

mod industry;
pub use industry::IndustryDummies;

mod exposure;
pub use exposure::{ExposureBuilder, ExposureConfig, ExposureSet};

mod error;
pub use error::StyleError;
