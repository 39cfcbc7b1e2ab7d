#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod compute;
pub mod error;
pub mod panel;
pub mod ratio;
pub mod winsorize;

pub use assemble::{PanelAssembler, PanelBuildReport, PanelConfig, TickerOutcome};
pub use compute::{compute_ratios, safe_divide};
pub use error::{PanelError, Result};
pub use panel::{QUARTER_COLUMN, RatioDescription, RatioPanel, TICKER_COLUMN, TickerSeries};
pub use ratio::{FieldRef, RatioCategory, RatioDefinition, default_ratios, get_ratio, ratio_names};
pub use winsorize::{ColumnBounds, WinsorizeConfig, apply_bounds, compute_bounds, winsorize};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
