//! Selector queries for the reference ledgers.
//!
//! A query is a JSON document of the form `{"selector": {"field": value, ...}}`.
//! A record matches when every listed top-level field is present and equal to
//! the given value. An empty selector matches every record.

use serde_json::{Map, Value};

use access_ledger_core::RichQuery;

use crate::error::{Result, StoreError};

/// A parsed equality selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    fields: Map<String, Value>,
}

impl Selector {
    /// Parse a query expression.
    pub fn parse(query: &RichQuery) -> Result<Self> {
        let doc: Value = serde_json::from_str(query.as_str())
            .map_err(|e| StoreError::InvalidQuery(e.to_string()))?;

        match doc.get("selector") {
            Some(Value::Object(fields)) => Ok(Self {
                fields: fields.clone(),
            }),
            Some(_) => Err(StoreError::InvalidQuery(
                "\"selector\" must be an object".into(),
            )),
            None => Err(StoreError::InvalidQuery("missing \"selector\"".into())),
        }
    }

    /// Whether a stored value satisfies the selector.
    ///
    /// Values that are not JSON objects never match a non-empty selector.
    pub fn matches(&self, value: &[u8]) -> bool {
        if self.fields.is_empty() {
            return true;
        }

        let record: Value = match serde_json::from_slice(value) {
            Ok(v) => v,
            Err(_) => return false,
        };

        let record = match record.as_object() {
            Some(obj) => obj,
            None => return false,
        };

        self.fields
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}
