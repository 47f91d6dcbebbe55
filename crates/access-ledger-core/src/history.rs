//! History projection entries.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TxId;

/// One committed version of a ledger record.
///
/// Tombstones (`is_delete`) carry no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    pub value: Option<T>,
    pub txid: TxId,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
}

impl<T> HistoryEntry<T> {
    /// Build an entry from a commit time in Unix milliseconds.
    pub fn new(value: Option<T>, txid: TxId, timestamp_millis: i64, is_delete: bool) -> Self {
        Self {
            value,
            txid,
            timestamp: Utc
                .timestamp_millis_opt(timestamp_millis)
                .single()
                .unwrap_or_default(),
            is_delete,
        }
    }
}
