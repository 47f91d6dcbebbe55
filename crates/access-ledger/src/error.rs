//! Error types for the registries.

use std::fmt;

use access_ledger_core::{CoreError, TokenId, TokenStatus, ValidationError};
use access_ledger_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A record with this key already exists.
    #[error("record {0} already exists")]
    AlreadyExists(String),

    /// No record under this key.
    #[error("record {0} does not exist")]
    NotFound(String),

    /// Malformed request.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// The issuing token's tier does not allow the operation.
    #[error("permission denied for token {token_id}: {reason}")]
    PermissionDenied { token_id: TokenId, reason: String },

    /// The operation needs a `VALID` token.
    #[error("token {token_id} has status {status}")]
    InvalidState { token_id: TokenId, status: TokenStatus },

    /// The certificate was already revoked.
    #[error("certificate {0} already revoked")]
    AlreadyRevoked(String),

    /// The deduction would drive the balance negative.
    #[error("token {token_id} has {available} accesses available, {required} required")]
    InsufficientBalance {
        token_id: TokenId,
        available: i64,
        required: i64,
    },

    /// Ledger error.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A stored record could not be encoded or decoded.
    #[error("record codec error: {0}")]
    Codec(#[from] CoreError),

    /// A compensating write failed after a partial issuance. The issuer's
    /// balance is short until reconciled by hand.
    #[error(
        "failed to refund issuer {issuer_token_id} after issuing {token_id} failed: \
         {compensation}; original error: {primary}; \
         previous amount: {amount_before}, available accesses: {accesses_before}"
    )]
    FatalInconsistency {
        issuer_token_id: TokenId,
        token_id: TokenId,
        primary: String,
        compensation: String,
        amount_before: i64,
        accesses_before: i64,
    },
}

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    InvalidArgument,
    PermissionDenied,
    InvalidState,
    InsufficientBalance,
    StorageFailure,
    FatalInconsistency,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::FatalInconsistency => "fatal_inconsistency",
        };
        f.write_str(name)
    }
}

impl RegistryError {
    /// The kind of failure, for callers that branch on it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RegistryError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            RegistryError::InvalidState { .. } | RegistryError::AlreadyRevoked(_) => {
                ErrorKind::InvalidState
            }
            RegistryError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            RegistryError::Storage(_) | RegistryError::Codec(_) => ErrorKind::StorageFailure,
            RegistryError::FatalInconsistency { .. } => ErrorKind::FatalInconsistency,
        }
    }

    pub(crate) fn permission_denied(token_id: &TokenId, reason: impl Into<String>) -> Self {
        RegistryError::PermissionDenied {
            token_id: token_id.clone(),
            reason: reason.into(),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
