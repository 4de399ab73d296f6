//! Unified error types for ical-cache.
//!
//! Every variant carries a stable code prefix in its display form so hosts
//! can branch on it without matching on the enum.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the ical-cache core and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty document id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No cache entry exists for the given url.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Reading or writing a cache file failed.
    #[error("STORE_ERROR: {0}")]
    Store(#[from] std::io::Error),

    /// Invalid or unsupported calendar URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetching a calendar failed, either in transport or with a non-success status.
    ///
    /// The resource's last-checked timestamp is never advanced when this is returned.
    #[error("FETCH_FAILED: could not get {url}{}: {reason}", .status.map(|s| format!(", HTTP status {s}")).unwrap_or_default())]
    FetchFailed { url: String, status: Option<u16>, reason: String },

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),
}

impl Error {
    /// Whether a later pass may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::FetchFailed { .. } | Error::FetchTooLarge(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::CacheMiss(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) => -32002,
            Error::InvalidUrl(_) => -32003,
            Error::Store(_) => -32004,
            Error::FetchFailed { .. } => -32008,
            Error::FetchTooLarge(_) => -32007,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
