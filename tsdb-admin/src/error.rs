//! Error types surfaced by the admin service

use thiserror::Error;
use tsdb_core::TsdbError;

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

/// Status codes reported to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Unavailable,
    InvalidArgument,
    Internal,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Unavailable => "unavailable",
            StatusCode::InvalidArgument => "invalid_argument",
            StatusCode::Internal => "internal",
        }
    }
}

/// Failures of admin and remote-write operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// Administration switched off at startup
    #[error("Admin APIs are disabled")]
    Disabled,

    /// Storage engine not opened yet
    #[error("TSDB not ready")]
    NotReady,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Internal(String),

    /// Reading the inbound stream failed
    #[error("stream read failure: {0}")]
    Transport(String),
}

impl AdminError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Status code reported to callers
    pub fn code(&self) -> StatusCode {
        match self {
            AdminError::Disabled | AdminError::NotReady => StatusCode::Unavailable,
            AdminError::InvalidArgument(_) => StatusCode::InvalidArgument,
            AdminError::Internal(_) | AdminError::Transport(_) => StatusCode::Internal,
        }
    }

    /// Wrap an engine failure as an internal error with a context prefix
    pub fn engine(context: &str, err: TsdbError) -> Self {
        Self::Internal(format!("{}: {}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(AdminError::Disabled.code(), StatusCode::Unavailable);
        assert_eq!(AdminError::NotReady.code(), StatusCode::Unavailable);
        assert_eq!(
            AdminError::invalid_argument("bad").code(),
            StatusCode::InvalidArgument
        );
        assert_eq!(AdminError::internal("boom").code(), StatusCode::Internal);
        assert_eq!(AdminError::transport("eof").code(), StatusCode::Internal);
    }

    #[test]
    fn test_messages() {
        assert_eq!(AdminError::Disabled.to_string(), "Admin APIs are disabled");
        assert_eq!(AdminError::NotReady.to_string(), "TSDB not ready");
        let err = AdminError::engine("clean tombstones", TsdbError::internal("disk full"));
        assert_eq!(err.to_string(), "clean tombstones: internal error: disk full");
    }
}
