//! MVSTORE - Error Types
//! Defines the error hierarchy shared by the column store, the MVCC
//! pipeline and the map manager.

use std::time::Duration;

use thiserror::Error;

/// Custom Result type for the store.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Connectivity failures raised by the keyspace while reading or
/// submitting a batch.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The keyspace is not accepting requests.
    #[error("keyspace unavailable")]
    Unavailable,

    /// The operation could not be scheduled within the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The write-ahead log rejected the batch.
    #[error("write-ahead log failure: {0}")]
    Wal(String),
}

/// Error types for the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed input detected before any I/O was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mutation batch could not be submitted. Never retried internally.
    #[error("{message}: {source}")]
    CommitFailure {
        message: String,
        #[source]
        source: TransportError,
    },

    /// A read could not reach the keyspace.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O errors from file operations (WAL).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected (CRC mismatch).
    #[error("Data corruption detected: {0}")]
    Corruption(String),

    /// WAL recovery failure.
    #[error("WAL recovery failed: {0}")]
    RecoveryFailed(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Wrap a failed batch submission.
    pub fn commit_failure(message: impl Into<String>, source: TransportError) -> Self {
        StoreError::CommitFailure {
            message: message.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    /// Returns true for errors raised before any I/O was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
