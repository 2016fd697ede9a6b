//! Error types for the saidi-forecast library.

use thiserror::Error;

/// Result type alias for model and data operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors raised while preparing data or fitting a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// A cancellation request arrived while the operation was running.
    #[error("operation interrupted by cancellation request")]
    Interrupted,
}

/// Errors that end a parameter search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The historical series could not be used.
    #[error("input error: {0}")]
    Input(String),

    /// A model or data operation failed outside the per-combination loop.
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Filesystem failure on a channel that must be writable.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The CSV source could not be parsed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid search configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Neither the grid nor the fallback produced a model.
    #[error("no model could be fitted to the series")]
    NoModel,

    /// The user asked the search to stop.
    #[error("search cancelled by user request")]
    Cancelled,
}

impl SearchError {
    /// Exit code conventionally used for SIGINT-style cancellation.
    pub const CANCELLED_EXIT_CODE: u8 = 130;
    /// Exit code for any unrecovered error.
    pub const FAILURE_EXIT_CODE: u8 = 1;

    /// Process exit code that external callers use to tell outcomes apart.
    pub fn exit_code(&self) -> u8 {
        match self {
            SearchError::Cancelled => Self::CANCELLED_EXIT_CODE,
            _ => Self::FAILURE_EXIT_CODE,
        }
    }

    /// Whether this error is the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}
