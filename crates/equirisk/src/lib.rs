//! # equirisk
//!
//! A Barra-style multi-factor equity risk model with portfolio risk analytics and
//! Monte Carlo simulation.
//!
//! This crate provides a unified interface to the equirisk crates. Individual
//! components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Domain types shared by every crate
//! - `math`: Normalisation, covariance and linear algebra
//! - `styles`: Style factor exposures
//! - `model`: Daily factor model, betas and risk indicators
//! - `portfolio`: Portfolio risk analytics
//! - `simulation`: Monte Carlo simulation of portfolio value
//! - `pipeline`: Daily batch behind a universe safety gate
//!
//! ## Example
//!
//! ```rust,ignore
//! // With default features (all components):
//! use equirisk::model::FactorModelService;
//! use equirisk::pipeline::PipelineSafetyController;
//!
//! // Or with specific features only:
//! // [dependencies]
//! // equirisk = { version = "0.1", default-features = false, features = ["portfolio"] }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use equirisk_primitives as primitives;
#[cfg(feature = "math")]
#[doc(inline)]
pub use equirisk_math as math;
#[cfg(feature = "styles")]
#[doc(inline)]
pub use equirisk_styles as styles;
#[cfg(feature = "model")]
#[doc(inline)]
pub use equirisk_model as model;
#[cfg(feature = "portfolio")]
#[doc(inline)]
pub use equirisk_portfolio as portfolio;
#[cfg(feature = "simulation")]
#[doc(inline)]
pub use equirisk_simulation as simulation;
#[cfg(feature = "pipeline")]
#[doc(inline)]
pub use equirisk_pipeline as pipeline;
