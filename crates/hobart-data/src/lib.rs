#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod completeness;
pub mod error;
pub mod quarter;
pub mod source;
pub mod universe;

pub use completeness::{CompleteSources, Incompleteness, StatementSources, is_complete};
pub use error::{DataError, Result};
pub use quarter::{CanonicalQuarterIndex, Quarter, YearRange};
pub use source::{CompanySourceTable, SourceLayout, StatementKind, load_source, read_source};
pub use universe::{SectorFilter, SectorFilterOutcome, SectorMap, ticker_universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
