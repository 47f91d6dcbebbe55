//! # Access Ledger Store
//!
//! Ledger abstraction for the Access Ledger. Provides a trait-based interface
//! to versioned key-value state with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The engines never talk to a concrete store. They are written against the
//! [`Ledger`] trait, which mirrors the four primitives a platform ledger
//! offers: point read, write, rich query and per-key history.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait for all ledger operations
//! - [`SqliteLedger`] - SQLite-based persistent ledger
//! - [`MemoryLedger`] - In-memory ledger for tests
//! - [`KeyModification`] - One committed version of a key
//! - [`Selector`] - The equality query language of the reference ledgers
//!
//! ## Usage
//!
//! ```rust,no_run
//! use access_ledger_store::{Ledger, SqliteLedger};
//! use bytes::Bytes;
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("ledger.db").unwrap();
//!     ledger.put_state("tok-1", Bytes::from_static(b"{}")).await.unwrap();
//!     let history = ledger.history_of("tok-1").await.unwrap();
//!     assert_eq!(history.len(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Single-key commits**: there is no multi-key transaction
//! - **Append-only history**: deletes are recorded as tombstones

pub mod error;
pub mod memory;
pub mod migration;
pub mod selector;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryLedger;
pub use selector::Selector;
pub use sqlite::SqliteLedger;
pub use traits::{KeyModification, Ledger, LedgerExt};
