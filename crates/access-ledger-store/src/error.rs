//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The query expression could not be interpreted by this ledger.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding ledger state was poisoned by a panicking writer.
    #[error("ledger lock poisoned: {0}")]
    Poisoned(String),

    /// A blocking ledger task failed to complete.
    #[error("ledger task failed: {0}")]
    Task(String),

    /// The ledger refused the operation.
    ///
    /// Returned by ledgers fronting a remote platform; the reference
    /// ledgers never produce it.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
