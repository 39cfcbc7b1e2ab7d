//! Error types for panel construction.

use hobart_data::DataError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors that can occur while building or persisting the ratio panel.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Statement source error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No ticker passed the completeness filter
    #[error("No ticker passed the completeness filter ({candidates} candidates)")]
    NoCompleteTickers {
        /// Tickers that reached the completeness filter
        candidates: usize,
    },

    /// Panel is missing an expected column
    #[error("Missing panel column: {0}")]
    MissingColumn(String),

    /// Invalid panel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
