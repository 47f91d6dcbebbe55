//! Certificate records: the documents access tokens point at.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use access_ledger_core::{HistoryEntry, RichQuery};
use access_ledger_store::{Ledger, LedgerExt};

use crate::error::{RegistryError, Result};
use crate::records;

/// An issued certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub certificate_signature: String,
    pub template_ref: String,
    pub course_name: String,
    pub module_name: String,
    pub certificate_holder: String,
    pub email: String,
    pub is_revoked: bool,
    pub issuer_id: String,
    pub issuer_name: String,
    /// Issue time as supplied by the issuer; not interpreted.
    pub issued_at: String,
    /// Free-form issuer data.
    #[serde(default)]
    pub extras: serde_json::Value,
}

/// Certificate registry over a ledger.
pub struct CertificateRegistry<L: Ledger> {
    ledger: Arc<L>,
}

impl<L: Ledger> CertificateRegistry<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Store a new certificate under `cert_key`. It is always stored unrevoked.
    pub async fn issue(&self, cert_key: &str, mut record: CertificateRecord) -> Result<()> {
        if self.ledger.contains_key(cert_key).await? {
            return Err(RegistryError::AlreadyExists(cert_key.to_owned()));
        }

        record.is_revoked = false;
        self.ledger
            .put_state(cert_key, records::encode(&record)?)
            .await?;

        info!(cert_key, holder = %record.certificate_holder, "certificate issued");
        Ok(())
    }

    pub async fn get(&self, cert_key: &str) -> Result<CertificateRecord> {
        match self.ledger.get_state(cert_key).await? {
            Some(bytes) => records::decode(&bytes),
            None => Err(RegistryError::NotFound(cert_key.to_owned())),
        }
    }

    /// Revoke a certificate. Revoking twice is an error.
    pub async fn revoke(&self, cert_key: &str) -> Result<()> {
        let mut record = self.get(cert_key).await?;
        if record.is_revoked {
            return Err(RegistryError::AlreadyRevoked(cert_key.to_owned()));
        }

        record.is_revoked = true;
        self.ledger
            .put_state(cert_key, records::encode(&record)?)
            .await?;

        info!(cert_key, "certificate revoked");
        Ok(())
    }

    pub async fn query(&self, query: &RichQuery) -> Result<Vec<CertificateRecord>> {
        let hits = self.ledger.range_query(query).await?;
        debug!(query = query.as_str(), hits = hits.len(), "certificate query");

        hits.iter().map(|(_, value)| records::decode(value)).collect()
    }

    pub async fn history(&self, cert_key: &str) -> Result<Vec<HistoryEntry<CertificateRecord>>> {
        records::project_history(self.ledger.history_of(cert_key).await?)
    }
}
