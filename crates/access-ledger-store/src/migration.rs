//! Ledger schema versions.
//!
//! `ledger_schema` records every version applied to a database file. Opening
//! a file brings it up to [`SCHEMA_VERSION`] in one transaction; a file
//! written by a newer build is refused.

use rusqlite::{params, Connection, Transaction};

use crate::error::{Result, StoreError};

/// Schema version this build writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Bring `conn` up to [`SCHEMA_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS ledger_schema (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let found = schema_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "ledger schema v{} was written by a newer build (this build knows v{})",
            found, SCHEMA_VERSION
        )));
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for version in found + 1..=SCHEMA_VERSION {
        upgrade_to(&tx, version)?;
        tx.execute(
            "INSERT INTO ledger_schema (version, applied_at) VALUES (?1, ?2)",
            params![version, chrono::Utc::now().timestamp_millis()],
        )?;
    }
    tx.commit()?;

    tracing::debug!(from = found, to = SCHEMA_VERSION, "ledger schema upgraded");
    Ok(())
}

/// Highest applied version, 0 for a fresh file.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM ledger_schema",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn upgrade_to(tx: &Transaction<'_>, version: u32) -> Result<()> {
    match version {
        1 => {
            tx.execute_batch(
                r#"
                -- live value of each key
                CREATE TABLE world_state (
                    key TEXT PRIMARY KEY,
                    value BLOB NOT NULL,
                    tx_id BLOB NOT NULL,          -- 32 bytes
                    updated_at INTEGER NOT NULL   -- Unix ms
                );

                -- append-only modification log, tombstones included
                CREATE TABLE key_history (
                    seq INTEGER PRIMARY KEY,      -- commit order across all keys
                    key TEXT NOT NULL,
                    value BLOB NOT NULL,          -- empty for tombstones
                    tx_id BLOB NOT NULL,
                    timestamp INTEGER NOT NULL,   -- Unix ms
                    is_delete INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX idx_key_history_key ON key_history(key, seq);
                "#,
            )?;
            Ok(())
        }
        other => Err(StoreError::Migration(format!(
            "no upgrade path to ledger schema v{}",
            other
        ))),
    }
}
