//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading statement sources.
///
/// Missing files and empty sources are not errors: they surface as `None`
/// and are handled by the completeness filter.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid year range
    #[error("Invalid year range: start {start} is after end {end}")]
    InvalidYearRange {
        /// First year of the range
        start: i32,
        /// Last year of the range
        end: i32,
    },

    /// Quarter label could not be parsed
    #[error("Invalid quarter label: {0}")]
    InvalidQuarter(String),

    /// Source directory does not exist
    #[error("Source directory not found: {0}")]
    MissingDirectory(String),
}
