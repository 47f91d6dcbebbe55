//! Token status derivation.
//!
//! Status is never stored; it is computed from the record and the current
//! time. The checks form a strict priority chain: a revoked token that is
//! also spent reports `Revoked`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::token::AccessToken;

/// Derived status of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    /// Usable.
    Valid,
    /// Revoked by its holder or issuer. Permanent.
    Revoked,
    /// No accesses left and no monthly replenishment.
    Spent,
    /// Past its expiry date. May still hold accesses.
    Expired,
    /// The token reference did not resolve.
    Invalid,
}

impl TokenStatus {
    /// Uppercase name, as reported to callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Valid => "VALID",
            TokenStatus::Revoked => "REVOKED",
            TokenStatus::Spent => "SPENT",
            TokenStatus::Expired => "EXPIRED",
            TokenStatus::Invalid => "INVALID",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid)
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the status of a possibly-missing token at time `now` (Unix seconds).
pub fn token_status(token: Option<&AccessToken>, now: i64) -> TokenStatus {
    let token = match token {
        Some(token) => token,
        None => return TokenStatus::Invalid,
    };

    if token.is_revoked {
        return TokenStatus::Revoked;
    }

    if !token.is_root() {
        if token.available_accesses == 0 && token.monthly_token_quota == 0 {
            return TokenStatus::Spent;
        }
        if token.expiry_date != 0 && token.expiry_date < now {
            return TokenStatus::Expired;
        }
    }

    TokenStatus::Valid
}
