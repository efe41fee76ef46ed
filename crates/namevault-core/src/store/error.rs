//! Storage error handling
//!
//! One error type covers every backend. Engine-level failures pass
//! through verbatim; the named variants carry the context callers need
//! (which domain missed, which record broke a reset).

use std::io;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The storage engine could not be reached or its data file opened
    #[error("Failed to connect to storage at '{uri}': {details}")]
    Connection { uri: String, details: String },

    /// The namespace holding DNS records could not be created
    #[error("Failed to prepare storage namespace: {details}")]
    Schema { details: String },

    /// Lookup miss
    #[error("No record found for '{domain}'")]
    NotFound { domain: String },

    /// A stored payload could not be encoded or decoded
    ///
    /// On read this is treated as data corruption and never skipped.
    #[error("Failed to encode or decode stored record: {details}")]
    Encoding { details: String },

    /// The connection URI could not be parsed
    #[error("Invalid connection URI '{uri}': {details}")]
    Config { uri: String, details: String },

    /// A record could not be re-inserted during a full reset
    ///
    /// The namespace has already been dropped and recreated; records
    /// before this one were saved. Callers should re-issue the reset.
    #[error("Failed to restore record for '{domain}' during reset: {source}")]
    Reset {
        domain: String,
        #[source]
        source: Box<StoreError>,
    },

    /// Embedded key-value engine error
    #[error("Database error: {0}")]
    Kv(#[from] redb::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// HTTP transport error talking to a remote store
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

// redb reports distinct error types per operation; funnel them all into
// the one passthrough variant so `?` works in the backend.

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Kv(err.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Kv(err.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Kv(err.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Kv(err.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Kv(err.into())
    }
}
