//! The token registry: issuance, ownership, consumption and revocation of
//! access tokens.
//!
//! Every operation reads what it needs from the ledger, decides, and writes.
//! Nothing is cached between calls. The only operation that writes two keys
//! is a standard issuance from a transferable token; if its second write
//! fails the issuer is refunded with a compensating write.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use access_ledger_core::{
    consume_one, debit, ensure_covers, replenish, token_status, validate_standard_issue,
    validate_token_id, validate_transferable_issue, AccessToken, Clock, HistoryEntry, RichQuery,
    Shortfall, SystemClock, TokenId, TokenStatus,
};
use access_ledger_store::{Ledger, LedgerExt, StoreError};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::records;

/// Access token registry over a ledger.
pub struct TokenRegistry<L: Ledger, C: Clock = SystemClock> {
    /// The ledger backend.
    ledger: Arc<L>,
    /// Source of the current time.
    clock: C,
    /// Configuration.
    config: RegistryConfig,
}

impl<L: Ledger> TokenRegistry<L, SystemClock> {
    /// Create a registry on the system clock with default configuration.
    pub fn with_ledger(ledger: L) -> Self {
        Self::new(ledger, SystemClock, RegistryConfig::default())
    }
}

impl<L: Ledger, C: Clock> TokenRegistry<L, C> {
    /// Create a new registry.
    pub fn new(ledger: L, clock: C, config: RegistryConfig) -> Self {
        Self {
            ledger: Arc::new(ledger),
            clock,
            config,
        }
    }

    /// Get the ledger reference.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Get the configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a root token for a certificate.
    pub async fn issue_root(
        &self,
        token_id: &TokenId,
        certificate_id: &str,
        owner: &str,
    ) -> Result<AccessToken> {
        validate_token_id(token_id)?;
        self.ensure_absent(token_id).await?;

        let token = AccessToken::root(token_id.clone(), certificate_id, owner);
        self.store(&token).await?;

        info!(token_id = %token_id, certificate_id, owner, "root token issued");
        Ok(token)
    }

    /// Issue a transferable token from a root token.
    ///
    /// The root is not debited.
    pub async fn issue_transferable(
        &self,
        token_id: &TokenId,
        issuer_token_id: &TokenId,
        recipient: &str,
        amount: i64,
        monthly_token_quota: i64,
        expiry_date: i64,
    ) -> Result<AccessToken> {
        let now = self.clock.now();
        validate_transferable_issue(token_id, amount, monthly_token_quota, expiry_date, now)?;
        self.ensure_absent(token_id).await?;

        let (issuer, _) = self.require(issuer_token_id).await?;
        if !issuer.is_root() {
            return Err(RegistryError::permission_denied(
                issuer_token_id,
                "only root tokens issue transferable tokens",
            ));
        }
        let status = token_status(Some(&issuer), now);
        if !status.is_valid() {
            return Err(RegistryError::InvalidState {
                token_id: issuer_token_id.clone(),
                status,
            });
        }

        let token = AccessToken::transferable(
            token_id.clone(),
            &issuer,
            recipient,
            amount,
            monthly_token_quota,
            expiry_date,
        );
        self.store(&token).await?;

        info!(
            token_id = %token_id,
            issuer = %issuer_token_id,
            amount,
            monthly_token_quota,
            "transferable token issued"
        );
        Ok(token)
    }

    /// Issue a standard token from a root or transferable token.
    ///
    /// A transferable issuer is debited `amount * access_quota` accesses and
    /// persisted before the new token is written.
    pub async fn issue_standard(
        &self,
        token_id: &TokenId,
        issuer_token_id: &TokenId,
        recipient: &str,
        amount: i64,
        access_quota: i64,
        expiry_date: i64,
    ) -> Result<AccessToken> {
        let now = self.clock.now();
        let accesses = validate_standard_issue(token_id, amount, access_quota, expiry_date, now)?;
        self.ensure_absent(token_id).await?;

        let (issuer, issuer_bytes) = self.require(issuer_token_id).await?;
        let status = token_status(Some(&issuer), now);
        if !status.is_valid() {
            return Err(RegistryError::InvalidState {
                token_id: issuer_token_id.clone(),
                status,
            });
        }

        let token = AccessToken::standard(
            token_id.clone(),
            &issuer,
            recipient,
            amount,
            access_quota,
            expiry_date,
        )?;
        let token_bytes = Bytes::from(token.to_bytes()?);

        if issuer.is_root() {
            self.put(token_id, token_bytes).await?;
            info!(token_id = %token_id, issuer = %issuer_token_id, accesses, "standard token issued");
            return Ok(token);
        }

        if !issuer.transferable {
            return Err(RegistryError::permission_denied(
                issuer_token_id,
                "standard tokens cannot issue tokens",
            ));
        }

        // The balance as stored decides, before any replenishment.
        ensure_covers(&issuer, accesses)
            .map_err(|shortfall| insufficient(issuer_token_id, shortfall))?;

        let mut before = issuer;
        let mut before_bytes = issuer_bytes;
        if replenish(&mut before, now, self.config.month_offset) {
            debug!(token_id = %issuer_token_id, "monthly quota replenished");
            before_bytes = Bytes::from(before.to_bytes()?);
        }

        let mut debited = before.clone();
        debit(&mut debited, accesses, now)
            .map_err(|shortfall| insufficient(issuer_token_id, shortfall))?;

        self.store(&debited).await?;

        if let Err(primary) = self.put(token_id, token_bytes).await {
            return Err(self
                .compensate(&before, before_bytes, token_id, primary)
                .await);
        }

        info!(
            token_id = %token_id,
            issuer = %issuer_token_id,
            accesses,
            issuer_available = debited.available_accesses,
            "standard token issued"
        );
        Ok(token)
    }

    /// Restore the issuer after the new token's write failed.
    ///
    /// `issuer` is the record as it stood just before the debit, after any
    /// monthly replenishment. Unreplenished issuers get their stored bytes back.
    async fn compensate(
        &self,
        issuer: &AccessToken,
        issuer_bytes: Bytes,
        token_id: &TokenId,
        primary: StoreError,
    ) -> RegistryError {
        let fatal = |compensation: String, primary: &StoreError| {
            RegistryError::FatalInconsistency {
                issuer_token_id: issuer.token_id.clone(),
                token_id: token_id.clone(),
                primary: primary.to_string(),
                compensation,
                amount_before: issuer.amount,
                accesses_before: issuer.available_accesses,
            }
        };

        if !self.config.compensate_failed_issuance {
            let err = fatal("compensation disabled".to_owned(), &primary);
            error!(error = %err, "issuer left debited");
            return err;
        }

        warn!(
            token_id = %token_id,
            issuer = %issuer.token_id,
            error = %primary,
            "token write failed, refunding issuer"
        );

        match self.ledger.put_state(issuer.token_id.as_str(), issuer_bytes).await {
            Ok(()) => RegistryError::Storage(primary),
            Err(compensation) => {
                let err = fatal(compensation.to_string(), &primary);
                error!(error = %err, "issuer refund failed");
                err
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ownership, consumption, revocation
    // ─────────────────────────────────────────────────────────────────────────

    /// Hand a token to a new owner.
    ///
    /// Succeeds without writing if `new_owner` already holds it (ignoring case).
    pub async fn change_owner(&self, token_id: &TokenId, new_owner: &str) -> Result<AccessToken> {
        let now = self.clock.now();
        let mut token = self.require_valid(token_id, now).await?;

        if token.is_root() {
            return Err(RegistryError::permission_denied(
                token_id,
                "root tokens cannot change owner",
            ));
        }
        if token.is_owned_by(new_owner) {
            debug!(token_id = %token_id, owner = new_owner, "owner unchanged");
            return Ok(token);
        }

        let previous = std::mem::replace(&mut token.owner, new_owner.to_owned());
        self.store(&token).await?;

        info!(token_id = %token_id, from = %previous, to = new_owner, "owner changed");
        Ok(token)
    }

    /// Spend one access.
    ///
    /// Root tokens only record the time of use.
    pub async fn consume(&self, token_id: &TokenId) -> Result<AccessToken> {
        let now = self.clock.now();
        let mut token = self.require_valid(token_id, now).await?;

        if token.is_root() {
            token.last_used_at = now;
        } else {
            if replenish(&mut token, now, self.config.month_offset) {
                debug!(token_id = %token_id, "monthly quota replenished");
            }
            consume_one(&mut token, now).map_err(|shortfall| insufficient(token_id, shortfall))?;
        }
        self.store(&token).await?;

        info!(
            token_id = %token_id,
            available = token.available_accesses,
            amount = token.amount,
            "access consumed"
        );
        Ok(token)
    }

    /// Revoke a token. Only `VALID` tokens can be revoked.
    pub async fn revoke(&self, token_id: &TokenId) -> Result<()> {
        let now = self.clock.now();
        let mut token = self.require_valid(token_id, now).await?;

        token.is_revoked = true;
        self.store(&token).await?;

        info!(token_id = %token_id, "token revoked");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up a token.
    pub async fn get_token(&self, token_id: &TokenId) -> Result<AccessToken> {
        let (token, _) = self.require(token_id).await?;
        Ok(token)
    }

    /// Derived status of a token. An unknown id is `INVALID`, not an error.
    pub async fn token_status(&self, token_id: &TokenId) -> Result<TokenStatus> {
        let token = self.load(token_id).await?.map(|(token, _)| token);
        let status = token_status(token.as_ref(), self.clock.now());
        debug!(token_id = %token_id, %status, "token status");
        Ok(status)
    }

    /// Run a rich query and decode every hit as a token.
    pub async fn query_tokens(&self, query: &RichQuery) -> Result<Vec<AccessToken>> {
        let hits = self.ledger.range_query(query).await?;
        debug!(query = query.as_str(), hits = hits.len(), "token query");

        hits.iter()
            .map(|(_, value)| AccessToken::from_bytes(value).map_err(RegistryError::from))
            .collect()
    }

    /// Every committed version of a token, oldest first.
    pub async fn token_history(&self, token_id: &TokenId) -> Result<Vec<HistoryEntry<AccessToken>>> {
        let modifications = self.ledger.history_of(token_id.as_str()).await?;
        records::project_history(modifications)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn load(&self, token_id: &TokenId) -> Result<Option<(AccessToken, Bytes)>> {
        match self.ledger.get_state(token_id.as_str()).await? {
            Some(bytes) => Ok(Some((AccessToken::from_bytes(&bytes)?, bytes))),
            None => Ok(None),
        }
    }

    async fn require(&self, token_id: &TokenId) -> Result<(AccessToken, Bytes)> {
        self.load(token_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(token_id.as_str().to_owned()))
    }

    async fn require_valid(&self, token_id: &TokenId, now: i64) -> Result<AccessToken> {
        let (token, _) = self.require(token_id).await?;
        let status = token_status(Some(&token), now);
        if !status.is_valid() {
            return Err(RegistryError::InvalidState {
                token_id: token_id.clone(),
                status,
            });
        }
        Ok(token)
    }

    async fn ensure_absent(&self, token_id: &TokenId) -> Result<()> {
        if self.ledger.contains_key(token_id.as_str()).await? {
            return Err(RegistryError::AlreadyExists(token_id.as_str().to_owned()));
        }
        Ok(())
    }

    async fn store(&self, token: &AccessToken) -> Result<()> {
        let bytes = Bytes::from(token.to_bytes()?);
        self.put(&token.token_id, bytes).await?;
        Ok(())
    }

    async fn put(&self, token_id: &TokenId, bytes: Bytes) -> std::result::Result<(), StoreError> {
        self.ledger.put_state(token_id.as_str(), bytes).await
    }
}

fn insufficient(token_id: &TokenId, shortfall: Shortfall) -> RegistryError {
    RegistryError::InsufficientBalance {
        token_id: token_id.clone(),
        available: shortfall.available,
        required: shortfall.required,
    }
}
