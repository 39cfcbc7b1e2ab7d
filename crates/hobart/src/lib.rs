#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod pipeline;

// Re-export main types from sub-crates
pub use hobart_ar as ar;
pub use hobart_data as data;
pub use hobart_output as output;
pub use hobart_panel as panel;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{PipelineError, PipelineOutputs};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
