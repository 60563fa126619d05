#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equirisk/equirisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod normalize;
pub use normalize::{DEFAULT_N_MAD, MAD_NORMAL_CONSISTENCY, Winsorizer, winsorize, z_score};

mod weights;
pub use weights::{ewm_decay, exp_weights};

mod linalg;
pub use linalg::{
    ConstrainedWlsResult, EigenDecomposition, cholesky, constrained_wls, jacobi_eigen,
    nearest_correlation, solve_linear_system, symmetrize,
};

mod covariance;
pub use covariance::{
    correlation_matrix, ewm_factor_covariance, ewm_specific_variance, ewm_std, sample_covariance,
};

pub mod stats;

mod error;
pub use error::MathError;
