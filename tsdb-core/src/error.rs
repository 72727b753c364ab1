//! Error types for storage engine operations

use thiserror::Error;

/// Result type for storage engine operations
pub type TsdbResult<T> = Result<T, TsdbError>;

/// Errors raised by the storage engine and its core types
#[derive(Error, Debug)]
pub enum TsdbError {
    #[error("out of order sample")]
    OutOfOrder,

    #[error("duplicate sample for timestamp")]
    DuplicateSample,

    #[error("unknown series reference: {0}")]
    UnknownSeriesRef(u64),

    #[error("invalid labels: {0}")]
    InvalidLabels(String),

    #[error("invalid matcher: {0}")]
    InvalidMatcher(String),

    #[error("invalid time range: {0}")]
    TimeRange(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TsdbError {
    /// Create a new invalid labels error
    pub fn invalid_labels<S: Into<String>>(message: S) -> Self {
        Self::InvalidLabels(message.into())
    }

    /// Create a new invalid matcher error
    pub fn invalid_matcher<S: Into<String>>(message: S) -> Self {
        Self::InvalidMatcher(message.into())
    }

    /// Create a new time range error
    pub fn time_range<S: Into<String>>(message: S) -> Self {
        Self::TimeRange(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Normalized failure reason, safe to use as a metric label.
    ///
    /// The set of values is closed, unlike `to_string()`, which may embed
    /// series references or I/O details.
    pub fn reason(&self) -> &'static str {
        match self {
            TsdbError::OutOfOrder => "out_of_order",
            TsdbError::DuplicateSample => "duplicate_sample",
            TsdbError::UnknownSeriesRef(_) => "unknown_series_ref",
            TsdbError::InvalidLabels(_) => "invalid_labels",
            TsdbError::InvalidMatcher(_) => "invalid_matcher",
            TsdbError::TimeRange(_) => "time_range",
            TsdbError::Snapshot(_) => "snapshot",
            TsdbError::Internal(_) => "internal",
            TsdbError::Io(_) => "io",
            TsdbError::Json(_) => "json",
        }
    }
}
