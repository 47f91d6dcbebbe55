//! Certificate templates. Write-once; every later change is a new key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use access_ledger_core::HistoryEntry;
use access_ledger_store::{Ledger, LedgerExt};

use crate::error::{RegistryError, Result};
use crate::records;

/// A certificate layout published by an issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateTemplate {
    /// The template document, in whatever shape `source_type` names.
    pub template_source: serde_json::Value,
    pub source_type: String,
    pub version: String,
    pub issuer_id: String,
    pub issuer_name: String,
}

/// Template registry over a ledger.
pub struct TemplateRegistry<L: Ledger> {
    ledger: Arc<L>,
}

impl<L: Ledger> TemplateRegistry<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub async fn put(&self, template_key: &str, template: &CertificateTemplate) -> Result<()> {
        if self.ledger.contains_key(template_key).await? {
            return Err(RegistryError::AlreadyExists(template_key.to_owned()));
        }

        self.ledger
            .put_state(template_key, records::encode(template)?)
            .await?;

        info!(template_key, version = %template.version, "template published");
        Ok(())
    }

    pub async fn get(&self, template_key: &str) -> Result<CertificateTemplate> {
        match self.ledger.get_state(template_key).await? {
            Some(bytes) => records::decode(&bytes),
            None => Err(RegistryError::NotFound(template_key.to_owned())),
        }
    }

    pub async fn history(
        &self,
        template_key: &str,
    ) -> Result<Vec<HistoryEntry<CertificateTemplate>>> {
        records::project_history(self.ledger.history_of(template_key).await?)
    }
}
