//! Error types for the Access Ledger Core.

use thiserror::Error;

/// Errors raised while moving token records to and from their wire form.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Argument validation errors for issuance operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("token id must not be empty")]
    EmptyTokenId,

    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(i64),

    #[error("monthly token quota must not be negative, got {0}")]
    NegativeMonthlyQuota(i64),

    #[error("access quota must be greater than zero, got {0}")]
    NonPositiveAccessQuota(i64),

    #[error("expiry date must not be negative, got {0}")]
    NegativeExpiry(i64),

    #[error("expiry date {expiry} is before current time {now}")]
    ExpiryInPast { expiry: i64, now: i64 },

    #[error("amount {amount} times access quota {access_quota} overflows")]
    QuotaOverflow { amount: i64, access_quota: i64 },
}
