//! Serializable token operations and their outcomes.
//!
//! A transport adapter decodes an [`Operation`] from the wire, hands it to
//! [`TokenRegistry::apply`] and encodes the [`Outcome`]:
//!
//! ```json
//! {"op": "issue_standard", "token_id": "S1", "issuer_token_id": "T",
//!  "recipient": "student", "amount": 3, "access_quota": 2, "expiry_date": 0}
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use access_ledger_core::{AccessToken, Clock, HistoryEntry, RichQuery, TokenId, TokenStatus};
use access_ledger_store::Ledger;

use crate::error::Result;
use crate::registry::TokenRegistry;

/// One token registry operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    IssueRoot {
        token_id: TokenId,
        certificate_id: String,
        owner: String,
    },
    IssueTransferable {
        token_id: TokenId,
        issuer_token_id: TokenId,
        recipient: String,
        amount: i64,
        #[serde(default)]
        monthly_token_quota: i64,
        #[serde(default)]
        expiry_date: i64,
    },
    IssueStandard {
        token_id: TokenId,
        issuer_token_id: TokenId,
        recipient: String,
        amount: i64,
        access_quota: i64,
        #[serde(default)]
        expiry_date: i64,
    },
    ChangeOwner {
        token_id: TokenId,
        new_owner: String,
    },
    Consume {
        token_id: TokenId,
    },
    Revoke {
        token_id: TokenId,
    },
    QueryToken {
        token_id: TokenId,
    },
    QueryStatus {
        token_id: TokenId,
    },
    QueryTokens {
        query: RichQuery,
    },
    History {
        token_id: TokenId,
    },
}

impl Operation {
    /// The wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::IssueRoot { .. } => "issue_root",
            Operation::IssueTransferable { .. } => "issue_transferable",
            Operation::IssueStandard { .. } => "issue_standard",
            Operation::ChangeOwner { .. } => "change_owner",
            Operation::Consume { .. } => "consume",
            Operation::Revoke { .. } => "revoke",
            Operation::QueryToken { .. } => "query_token",
            Operation::QueryStatus { .. } => "query_status",
            Operation::QueryTokens { .. } => "query_tokens",
            Operation::History { .. } => "history",
        }
    }

    /// Whether the operation never writes.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Operation::QueryToken { .. }
                | Operation::QueryStatus { .. }
                | Operation::QueryTokens { .. }
                | Operation::History { .. }
        )
    }
}

/// Result of a successful [`Operation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// Completed with nothing to report.
    Done,
    /// The token as created, updated or read.
    Token(AccessToken),
    Tokens(Vec<AccessToken>),
    Status(TokenStatus),
    History(Vec<HistoryEntry<AccessToken>>),
}

impl<L: Ledger, C: Clock> TokenRegistry<L, C> {
    /// Execute one operation.
    pub async fn apply(&self, operation: Operation) -> Result<Outcome> {
        debug!(op = operation.name(), "applying operation");

        let outcome = match operation {
            Operation::IssueRoot {
                token_id,
                certificate_id,
                owner,
            } => Outcome::Token(self.issue_root(&token_id, &certificate_id, &owner).await?),
            Operation::IssueTransferable {
                token_id,
                issuer_token_id,
                recipient,
                amount,
                monthly_token_quota,
                expiry_date,
            } => Outcome::Token(
                self.issue_transferable(
                    &token_id,
                    &issuer_token_id,
                    &recipient,
                    amount,
                    monthly_token_quota,
                    expiry_date,
                )
                .await?,
            ),
            Operation::IssueStandard {
                token_id,
                issuer_token_id,
                recipient,
                amount,
                access_quota,
                expiry_date,
            } => Outcome::Token(
                self.issue_standard(
                    &token_id,
                    &issuer_token_id,
                    &recipient,
                    amount,
                    access_quota,
                    expiry_date,
                )
                .await?,
            ),
            Operation::ChangeOwner {
                token_id,
                new_owner,
            } => Outcome::Token(self.change_owner(&token_id, &new_owner).await?),
            Operation::Consume { token_id } => Outcome::Token(self.consume(&token_id).await?),
            Operation::Revoke { token_id } => {
                self.revoke(&token_id).await?;
                Outcome::Done
            }
            Operation::QueryToken { token_id } => Outcome::Token(self.get_token(&token_id).await?),
            Operation::QueryStatus { token_id } => {
                Outcome::Status(self.token_status(&token_id).await?)
            }
            Operation::QueryTokens { query } => Outcome::Tokens(self.query_tokens(&query).await?),
            Operation::History { token_id } => {
                Outcome::History(self.token_history(&token_id).await?)
            }
        };

        Ok(outcome)
    }
}
