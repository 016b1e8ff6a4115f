//! Record store error types
//!
//! Error codes:
//! - PLANDB_STORE_NOT_FOUND: key absent or expired (expected outcome)
//! - PLANDB_STORE_IO_ERROR: disk or backend I/O failure
//! - PLANDB_STORE_CORRUPTION: stored bytes failed checksum or framing
//! - PLANDB_STORE_BACKEND: any other backend failure

use std::io;

use thiserror::Error;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key absent (or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// I/O failure talking to the backing medium
    #[error("Store I/O error: {message}: {source}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Log framing or checksum failure
    #[error("Store corruption at byte offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    /// Backend failure without an I/O cause (poisoned lock, bad pattern, ...)
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            message: message.into(),
            source,
        }
    }

    pub fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        StoreError::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "PLANDB_STORE_NOT_FOUND",
            StoreError::Io { .. } => "PLANDB_STORE_IO_ERROR",
            StoreError::Corruption { .. } => "PLANDB_STORE_CORRUPTION",
            StoreError::Backend(_) => "PLANDB_STORE_BACKEND",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
