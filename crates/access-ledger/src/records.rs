//! JSON record encoding and history projection shared by the registries.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use access_ledger_core::{CoreError, HistoryEntry};
use access_ledger_store::KeyModification;

use crate::error::Result;

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Bytes> {
    let bytes = serde_json::to_vec(record).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(Bytes::from(bytes))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let record =
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    Ok(record)
}

/// Decode a key's modifications into history entries, keeping ledger order.
///
/// Tombstones carry no value.
pub(crate) fn project_history<T: DeserializeOwned>(
    modifications: Vec<KeyModification>,
) -> Result<Vec<HistoryEntry<T>>> {
    modifications
        .into_iter()
        .map(|m| -> Result<HistoryEntry<T>> {
            let value = if m.is_delete || m.value.is_empty() {
                None
            } else {
                Some(decode(&m.value)?)
            };
            Ok(HistoryEntry::new(value, m.tx_id, m.timestamp, m.is_delete))
        })
        .collect()
}
