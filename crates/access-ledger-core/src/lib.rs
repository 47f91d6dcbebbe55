//! # Access Ledger Core
//!
//! Pure primitives for the Access Ledger: access tokens, status derivation,
//! and quota rules.
//!
//! This crate contains no I/O, no storage, no networking. Every function takes
//! the current time as an argument (or through a [`Clock`]).
//!
//! ## Key Types
//!
//! - [`AccessToken`] - The ledger record gating access to one certificate
//! - [`TokenId`] - Identifier and ledger key of a token
//! - [`TokenStatus`] - Derived status (`VALID`, `REVOKED`, `SPENT`, `EXPIRED`, `INVALID`)
//! - [`TxId`] - Ledger transaction identifier
//! - [`RichQuery`] - Opaque query expression handed to the ledger
//!
//! ## Token Hierarchy
//!
//! Root tokens issue transferable tokens; transferable (and root) tokens issue
//! standard tokens. See [`token`] for the tier rules and [`quota`] for balance
//! arithmetic.

pub mod clock;
pub mod error;
pub mod history;
pub mod quota;
pub mod status;
pub mod token;
pub mod types;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, ValidationError};
pub use history::HistoryEntry;
pub use quota::{consume_one, debit, ensure_covers, replenish, same_calendar_month, units_for, Shortfall};
pub use status::{token_status, TokenStatus};
pub use token::AccessToken;
pub use types::{RichQuery, TokenId, TxId, ROOT_ISSUER};
pub use validation::{validate_standard_issue, validate_token_id, validate_transferable_issue};
