//! Ledger trait: the abstract interface to the versioned key-value store.
//!
//! The platform ledger offers four primitives: point read, write, rich query
//! and per-key history. The engines are written against this trait only, so
//! they run unchanged over the platform ledger, [`SqliteLedger`] or
//! [`MemoryLedger`].
//!
//! [`SqliteLedger`]: crate::SqliteLedger
//! [`MemoryLedger`]: crate::MemoryLedger

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use access_ledger_core::{RichQuery, TxId};

use crate::error::Result;

/// One committed modification of a key, as reported by [`Ledger::history_of`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    /// The value written. Empty for tombstones.
    pub value: Bytes,
    /// Transaction that committed the modification.
    pub tx_id: TxId,
    /// Commit time (Unix ms).
    pub timestamp: i64,
    /// Whether the modification deleted the key.
    pub is_delete: bool,
}

/// The Ledger trait: async interface to versioned key-value state.
///
/// # Design Notes
///
/// - **No multi-key atomicity**: each `put_state` commits on its own. Callers
///   that write several keys must compensate on partial failure themselves.
/// - **Opaque queries**: `range_query` interprets the expression however the
///   backing store defines it.
/// - **Ordered history**: `history_of` returns modifications oldest first.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Read the current value of a key.
    async fn get_state(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write a new value for a key, appending to its history.
    async fn put_state(&self, key: &str, value: Bytes) -> Result<()>;

    /// Run a rich query over current state.
    ///
    /// Returns `(key, value)` pairs.
    async fn range_query(&self, query: &RichQuery) -> Result<Vec<(String, Bytes)>>;

    /// Every committed modification of a key, oldest first.
    async fn history_of(&self, key: &str) -> Result<Vec<KeyModification>>;
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    async fn get_state(&self, key: &str) -> Result<Option<Bytes>> {
        (**self).get_state(key).await
    }

    async fn put_state(&self, key: &str, value: Bytes) -> Result<()> {
        (**self).put_state(key, value).await
    }

    async fn range_query(&self, query: &RichQuery) -> Result<Vec<(String, Bytes)>> {
        (**self).range_query(query).await
    }

    async fn history_of(&self, key: &str) -> Result<Vec<KeyModification>> {
        (**self).history_of(key).await
    }
}

/// Extension trait for common ledger patterns.
pub trait LedgerExt: Ledger {
    /// Whether a key currently holds a value.
    fn contains_key(&self, key: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl<L: Ledger + ?Sized> LedgerExt for L {
    async fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_state(key).await?.is_some())
    }
}
