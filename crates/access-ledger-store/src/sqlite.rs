//! SQLite implementation of the Ledger trait.
//!
//! Keeps current state in `world_state` and every modification in
//! `key_history`. Each write commits both rows in one SQLite transaction.
//! Blocking work runs on `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use access_ledger_core::{RichQuery, TxId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::selector::Selector;
use crate::traits::{KeyModification, Ledger};

/// SQLite-based ledger implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteLedger {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Delete a key, leaving a tombstone in its history.
    ///
    /// Returns `None` if the key held no value.
    pub async fn delete(&self, key: &str) -> Result<Option<TxId>> {
        let key = key.to_owned();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let live: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM world_state WHERE key = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            if !live {
                return Ok(None);
            }

            let tx_id = append_history(&tx, &key, &[], true)?;
            tx.execute("DELETE FROM world_state WHERE key = ?1", params![key])?;
            tx.commit()?;
            Ok(Some(tx_id))
        })
        .await
    }

    /// Run a blocking operation on the connection.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Append a history row and return the derived transaction id.
fn append_history(conn: &Connection, key: &str, value: &[u8], is_delete: bool) -> Result<TxId> {
    let seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM key_history",
        [],
        |row| row.get(0),
    )?;
    let tx_id = TxId::derive(key, value, seq as u64);

    conn.execute(
        "INSERT INTO key_history (seq, key, value, tx_id, timestamp, is_delete)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            seq,
            key,
            value,
            tx_id.as_bytes().as_slice(),
            now_millis(),
            is_delete,
        ],
    )?;

    Ok(tx_id)
}

fn row_to_modification(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Vec<u8>, Vec<u8>, i64, bool)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn get_state(&self, key: &str) -> Result<Option<Bytes>> {
        let key = key.to_owned();
        self.with_conn(move |conn| {
            let value: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT value FROM world_state WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value.map(Bytes::from))
        })
        .await
    }

    async fn put_state(&self, key: &str, value: Bytes) -> Result<()> {
        let key = key.to_owned();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let tx_id = append_history(&tx, &key, &value, false)?;

            tx.execute(
                "INSERT INTO world_state (key, value, tx_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    tx_id = excluded.tx_id,
                    updated_at = excluded.updated_at",
                params![key, value.as_ref(), tx_id.as_bytes().as_slice(), now_millis()],
            )?;

            tx.commit()?;
            tracing::trace!(key = %key, %tx_id, "sqlite ledger commit");
            Ok(())
        })
        .await
    }

    async fn range_query(&self, query: &RichQuery) -> Result<Vec<(String, Bytes)>> {
        let selector = Selector::parse(query)?;

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM world_state ORDER BY key")?;

            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(rows
                .into_iter()
                .filter(|(_, value)| selector.matches(value))
                .map(|(key, value)| (key, Bytes::from(value)))
                .collect())
        })
        .await
    }

    async fn history_of(&self, key: &str) -> Result<Vec<KeyModification>> {
        let key = key.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT value, tx_id, timestamp, is_delete FROM key_history
                 WHERE key = ?1 ORDER BY seq",
            )?;

            let rows = stmt
                .query_map(params![key], row_to_modification)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(value, tx_id, timestamp, is_delete)| -> Result<KeyModification> {
                    let tx_id = TxId::try_from(tx_id.as_slice()).map_err(|_| {
                        StoreError::InvalidData(format!("bad tx_id length for key {}", key))
                    })?;
                    Ok(KeyModification {
                        value: Bytes::from(value),
                        tx_id,
                        timestamp,
                        is_delete,
                    })
                })
                .collect()
        })
        .await
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
