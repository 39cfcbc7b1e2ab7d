#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod estimator;
pub mod ols;
pub mod summary;

pub use error::{ArError, Result};
pub use estimator::{
    Ar1Estimate, ArConfig, ArEstimator, ArFit, FeatureTable, difference, fit_ar_on_diff, half_life,
};
pub use ols::{OlsFit, fit_ols};
pub use summary::{RatioSummary, SummaryConfig, round_to, summarize_by_ratio};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
