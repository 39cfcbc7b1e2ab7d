//! Error types for AR estimation.

use hobart_panel::PanelError;
use thiserror::Error;

/// Result type for estimation operations.
pub type Result<T> = std::result::Result<T, ArError>;

/// Errors that can occur during estimation.
///
/// Inside the estimator every fit error is a skip condition: the series is
/// left out of the feature table rather than failing the run.
#[derive(Debug, Error)]
pub enum ArError {
    /// Not enough observations
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required observations
        required: usize,
        /// Available observations
        actual: usize,
    },

    /// Dimension mismatch between design and response
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Design matrix is singular
    #[error("Singular design matrix")]
    SingularDesign,

    /// Distribution could not be constructed
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Panel error
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),
}
