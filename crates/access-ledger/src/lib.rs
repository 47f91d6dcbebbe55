//! # Access Ledger
//!
//! Registries for tokenised access to issued certificates, running against
//! any [`Ledger`](access_ledger_store::Ledger).
//!
//! ## Overview
//!
//! - **Access tokens**: a three-tier hierarchy. A root token (one per
//!   certificate) issues transferable tokens; transferable tokens issue
//!   standard tokens from their balance; standard tokens are only consumed.
//! - **Certificates**: the issued documents tokens point at.
//! - **Templates**: write-once certificate layouts.
//!
//! ## Key Concepts
//!
//! - **Status**: derived on every read, never stored.
//! - **Replenishment**: tokens with a monthly quota are topped up on the first
//!   balance-affecting operation of a new calendar month.
//! - **Compensation**: issuing a standard token writes the debited issuer
//!   first. If the new token's write then fails, the issuer is restored; if
//!   that fails too, the caller gets [`RegistryError::FatalInconsistency`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use access_ledger::{RegistryConfig, TokenRegistry};
//! use access_ledger::core::{SystemClock, TokenId};
//! use access_ledger::store::SqliteLedger;
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("ledger.db").unwrap();
//!     let registry = TokenRegistry::new(ledger, SystemClock, RegistryConfig::default());
//!
//!     let root = TokenId::new("root-1");
//!     registry.issue_root(&root, "cert-1", "registrar").await.unwrap();
//!
//!     let dept = TokenId::new("dept-1");
//!     registry
//!         .issue_transferable(&dept, &root, "cs-department", 100, 100, 0)
//!         .await
//!         .unwrap();
//!
//!     let student = TokenId::new("student-1");
//!     registry
//!         .issue_standard(&student, &dept, "ada", 2, 5, 0)
//!         .await
//!         .unwrap();
//!     registry.consume(&student).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `access_ledger::core` - Token model, status and quota rules
//! - `access_ledger::store` - Ledger abstraction, SQLite and in-memory ledgers

pub mod certificates;
pub mod config;
pub mod error;
pub mod operation;
mod records;
pub mod registry;
pub mod templates;

// Re-export component crates
pub use access_ledger_core as core;
pub use access_ledger_store as store;

// Re-export main types for convenience
pub use certificates::{CertificateRecord, CertificateRegistry};
pub use config::RegistryConfig;
pub use error::{ErrorKind, RegistryError, Result};
pub use operation::{Operation, Outcome};
pub use registry::TokenRegistry;
pub use templates::{CertificateTemplate, TemplateRegistry};

// Re-export commonly used core types
pub use access_ledger_core::{AccessToken, HistoryEntry, RichQuery, TokenId, TokenStatus};
