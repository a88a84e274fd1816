//! Error types for sqlshift.

use std::fmt;

use thiserror::Error;

/// The main error type for translation-service operations.
#[derive(Debug, Error)]
pub enum ShiftError {
    /// Missing or invalid local configuration (credentials, paths).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required data source is not configured in the remote workspace.
    #[error("No {0} data source found. Configure a {0} data source and retry")]
    MissingDataSource(String),

    /// The service could not be reached (connect failure, timeout, or a
    /// request that died before producing a response).
    #[error("{kind} error: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The service answered 2xx but the payload was not what we expected.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// IO error (query files, report output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What went wrong at the network level, before any HTTP status existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Request,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connect => write!(f, "Connection"),
            TransportErrorKind::Timeout => write!(f, "Timeout"),
            TransportErrorKind::Request => write!(f, "Request"),
        }
    }
}

impl ShiftError {
    /// Whether the poll loop may retry after this error.
    ///
    /// Network transience and HTTP error statuses are retryable while
    /// waiting on a job; everything else surfaces immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ShiftError::Transport { .. } | ShiftError::Http { .. }
        )
    }

    /// Short stable label for the polling error log.
    pub fn poll_kind(&self) -> String {
        match self {
            ShiftError::Transport { kind, .. } => match kind {
                TransportErrorKind::Connect => "connect".to_string(),
                TransportErrorKind::Timeout => "timeout".to_string(),
                TransportErrorKind::Request => "request".to_string(),
            },
            ShiftError::Http { status, .. } => format!("http {status}"),
            ShiftError::Config(_) => "config".to_string(),
            ShiftError::MissingDataSource(_) => "missing_data_source".to_string(),
            ShiftError::UnexpectedResponse(_) => "unexpected_response".to_string(),
            ShiftError::Io(_) => "io".to_string(),
        }
    }
}

/// Result type alias for sqlshift operations.
pub type ShiftResult<T> = Result<T, ShiftError>;
