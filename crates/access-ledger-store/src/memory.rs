//! In-memory implementation of the Ledger trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use access_ledger_core::{RichQuery, TxId};

use crate::error::{Result, StoreError};
use crate::selector::Selector;
use crate::traits::{KeyModification, Ledger};

/// In-memory ledger implementation.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

#[derive(Default)]
struct MemoryLedgerInner {
    /// Current state, ordered by key.
    states: BTreeMap<String, Bytes>,

    /// Modification history per key, oldest first.
    history: HashMap<String, Vec<KeyModification>>,

    /// Commit sequence across all keys.
    seq: u64,
}

impl MemoryLedgerInner {
    fn commit(&mut self, key: &str, value: Bytes, is_delete: bool) -> TxId {
        self.seq += 1;
        let tx_id = TxId::derive(key, &value, self.seq);

        self.history
            .entry(key.to_owned())
            .or_default()
            .push(KeyModification {
                value: value.clone(),
                tx_id,
                timestamp: now_millis(),
                is_delete,
            });

        if is_delete {
            self.states.remove(key);
        } else {
            self.states.insert(key.to_owned(), value);
        }

        tx_id
    }
}

impl MemoryLedger {
    /// Create a new empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner::default()),
        }
    }

    /// Delete a key, leaving a tombstone in its history.
    ///
    /// Returns `None` if the key held no value.
    pub fn delete(&self, key: &str) -> Result<Option<TxId>> {
        let mut inner = self.write()?;
        if !inner.states.contains_key(key) {
            return Ok(None);
        }
        Ok(Some(inner.commit(key, Bytes::new(), true)))
    }

    /// Number of keys currently holding a value.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.states.len())
    }

    /// Whether no key holds a value.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total number of commits across all keys.
    pub fn commit_count(&self) -> Result<u64> {
        Ok(self.read()?.seq)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryLedgerInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryLedgerInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn get_state(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.read()?.states.get(key).cloned())
    }

    async fn put_state(&self, key: &str, value: Bytes) -> Result<()> {
        let tx_id = self.write()?.commit(key, value, false);
        tracing::trace!(key, %tx_id, "memory ledger commit");
        Ok(())
    }

    async fn range_query(&self, query: &RichQuery) -> Result<Vec<(String, Bytes)>> {
        let selector = Selector::parse(query)?;
        let inner = self.read()?;

        Ok(inner
            .states
            .iter()
            .filter(|(_, value)| selector.matches(value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn history_of(&self, key: &str) -> Result<Vec<KeyModification>> {
        Ok(self
            .read()?
            .history
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(s: &str) -> Bytes {
        Bytes::from(s.to_owned())
    }

    #[tokio::test]
    async fn test_memory_ledger_basic() {
        let ledger = MemoryLedger::new();

        assert_eq!(ledger.get_state("a").await.unwrap(), None);
        ledger.put_state("a", value(r#"{"n":1}"#)).await.unwrap();
        assert_eq!(
            ledger.get_state("a").await.unwrap(),
            Some(value(r#"{"n":1}"#))
        );
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_ledger_history_in_order() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", value("1")).await.unwrap();
        ledger.put_state("b", value("x")).await.unwrap();
        ledger.put_state("a", value("2")).await.unwrap();

        let history = ledger.history_of("a").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].value, value("1"));
        assert_eq!(history[1].value, value("2"));
        assert_ne!(history[0].tx_id, history[1].tx_id);
        assert!(history.iter().all(|m| !m.is_delete));
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[tokio::test]
    async fn test_memory_ledger_delete_leaves_tombstone() {
        let ledger = MemoryLedger::new();
        ledger.put_state("a", value("1")).await.unwrap();

        assert!(ledger.delete("a").unwrap().is_some());
        assert!(ledger.delete("a").unwrap().is_none());
        assert_eq!(ledger.get_state("a").await.unwrap(), None);

        let history = ledger.history_of("a").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].is_delete);
        assert!(history[1].value.is_empty());
    }

    #[tokio::test]
    async fn test_memory_ledger_range_query() {
        let ledger = MemoryLedger::new();
        ledger.put_state("b", value(r#"{"owner":"x"}"#)).await.unwrap();
        ledger.put_state("a", value(r#"{"owner":"x"}"#)).await.unwrap();
        ledger.put_state("c", value(r#"{"owner":"y"}"#)).await.unwrap();

        let hits = ledger
            .range_query(&RichQuery::new(r#"{"selector":{"owner":"x"}}"#))
            .await
            .unwrap();
        let keys: Vec<_> = hits.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_ledger_bad_query() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .range_query(&RichQuery::new("SELECT *"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }
}
