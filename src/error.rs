// Error types
// Every failure the gate can surface to a caller lives in this one enum

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while authorizing, classifying, executing or serializing a query
///
/// None of these are retried internally. They travel to the caller unchanged and
/// the HTTP layer decides which status code each one deserves.
#[derive(Debug, Error)]
pub enum GateError {
    /// The token presented to `execute` is not the most recently issued one
    #[error("action token does not match the current authorized action")]
    Authorization,

    /// The query text is neither a read-select nor a pragma-introspection statement
    #[error("only SELECT and PRAGMA queries are supported")]
    UnsupportedQuery,

    /// The fetched data could not be shaped into rows keyed by column name
    #[error("data must be a row sequence or a single row ({detail})")]
    Serialization { detail: String },

    /// The store could not be opened at startup
    #[error("failed to open store at {}: {source}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The store rejected the statement itself (syntax error, write on a read-only handle, ...)
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl GateError {
    pub(crate) fn serialization(detail: impl Into<String>) -> Self {
        GateError::Serialization {
            detail: detail.into(),
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, GateError>;
