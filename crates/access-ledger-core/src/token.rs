//! AccessToken: the ledger record gating access to one certificate.
//!
//! A token is one of three tiers:
//!
//! - **Root**: issued directly, holds no spendable balance, may issue any tier.
//! - **Transferable**: issued by a root token, may issue standard tokens out of
//!   its own balance.
//! - **Standard**: terminal; its balance is only ever consumed.
//!
//! The serialized field names are the ledger's storage format and must not
//! change.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::quota::total_accesses;
use crate::types::{TokenId, ROOT_ISSUER};

/// One access token record, keyed by `token_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Primary key. Immutable.
    pub token_id: TokenId,
    /// Certificate this token grants access to. Immutable.
    pub certificate_id: String,
    /// Current holder.
    pub owner: String,
    /// Whether the token may issue standard tokens. Immutable.
    pub transferable: bool,
    /// Whole units held, `ceil(available_accesses / access_quota)`.
    pub amount: i64,
    /// Units restored on the first use of each calendar month; 0 disables.
    pub monthly_token_quota: i64,
    /// Accesses granted per unit. Immutable.
    pub access_quota: i64,
    /// Remaining consumable accesses. The real balance.
    pub available_accesses: i64,
    /// Unix seconds; 0 means no expiry.
    pub expiry_date: i64,
    /// Unix seconds of the last consumption or replenishment; 0 means never.
    pub last_used_at: i64,
    /// Owner of the issuing token, or [`ROOT_ISSUER`].
    pub issuer: String,
    /// Id of the issuing token; empty for root tokens.
    pub issuer_ref: String,
    /// One-way revocation flag.
    pub is_revoked: bool,
}

impl AccessToken {
    /// Build a root token.
    pub fn root(token_id: TokenId, certificate_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            token_id,
            certificate_id: certificate_id.into(),
            owner: owner.into(),
            transferable: false,
            amount: 1,
            monthly_token_quota: 0,
            access_quota: 0,
            available_accesses: 0,
            expiry_date: 0,
            last_used_at: 0,
            issuer: ROOT_ISSUER.to_owned(),
            issuer_ref: String::new(),
            is_revoked: false,
        }
    }

    /// Build a transferable token issued by `issuer`.
    pub fn transferable(
        token_id: TokenId,
        issuer: &AccessToken,
        recipient: impl Into<String>,
        amount: i64,
        monthly_token_quota: i64,
        expiry_date: i64,
    ) -> Self {
        Self {
            token_id,
            certificate_id: issuer.certificate_id.clone(),
            owner: recipient.into(),
            transferable: true,
            amount,
            monthly_token_quota,
            access_quota: 1,
            available_accesses: amount,
            expiry_date,
            last_used_at: 0,
            issuer: issuer.owner.clone(),
            issuer_ref: issuer.token_id.as_str().to_owned(),
            is_revoked: false,
        }
    }

    /// Build a standard token issued by `issuer`.
    pub fn standard(
        token_id: TokenId,
        issuer: &AccessToken,
        recipient: impl Into<String>,
        amount: i64,
        access_quota: i64,
        expiry_date: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            token_id,
            certificate_id: issuer.certificate_id.clone(),
            owner: recipient.into(),
            transferable: false,
            amount,
            monthly_token_quota: 0,
            access_quota,
            available_accesses: total_accesses(amount, access_quota)?,
            expiry_date,
            last_used_at: 0,
            issuer: issuer.owner.clone(),
            issuer_ref: issuer.token_id.as_str().to_owned(),
            is_revoked: false,
        })
    }

    /// Whether this is a root token.
    pub fn is_root(&self) -> bool {
        self.issuer_ref.is_empty() && self.issuer == ROOT_ISSUER
    }

    /// The issuing token's id, if any.
    pub fn issuer_token_id(&self) -> Option<TokenId> {
        if self.issuer_ref.is_empty() {
            None
        } else {
            Some(TokenId::new(self.issuer_ref.clone()))
        }
    }

    /// Whether `owner` names the current holder, ignoring case.
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.to_lowercase() == owner.to_lowercase()
    }

    /// Encode to the ledger's JSON representation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Decode from the ledger's JSON representation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
