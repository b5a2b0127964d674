//! Remote mirror boundary
//!
//! The mirror is a best-effort secondary store for cross-device
//! visibility. The local ledger stays authoritative: this core writes
//! to the mirror opportunistically and never reads from it to drive
//! local state.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::TransactionRecord;

/// Environment variable for the mirror base URL; unset disables mirroring
pub const MIRROR_URL_ENV: &str = "LEKHA_MIRROR_URL";

/// Keyed write API accepting one record per call, idempotent on the
/// record's identity key.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn push(&self, record: &TransactionRecord) -> Result<()>;
}

/// HTTP mirror client
pub struct HttpMirror {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMirror {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Build a mirror client from `LEKHA_MIRROR_URL`, if set
    pub fn from_env() -> Option<Self> {
        std::env::var(MIRROR_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl RemoteMirror for HttpMirror {
    async fn push(&self, record: &TransactionRecord) -> Result<()> {
        // PUT keyed by identity key so server-side retries stay idempotent
        let url = format!(
            "{}/users/{}/transactions/{}",
            self.base_url.trim_end_matches('/'),
            record.owner_user_id,
            record.identity_key
        );

        let body = json!({
            "owner_user_id": record.owner_user_id,
            "timestamp": record.timestamp.to_rfc3339(),
            "amount": record.amount,
            "direction": record.direction.as_str(),
            "mode": record.mode.as_str(),
            "merchant": record.merchant,
            "bank_name": record.bank_name,
            "category": record.category,
            "upi_id": record.upi_id,
            "reference_number": record.reference_number,
            "identity_key": record.identity_key,
        });

        let response = self.client.put(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::InvalidData(format!(
                "Mirror rejected push: HTTP {}",
                response.status()
            )));
        }

        debug!(identity_key = %record.identity_key, "Mirrored record");
        Ok(())
    }
}

/// In-memory mirror for tests: records pushes, optionally fails them all
pub struct MemoryMirror {
    pushed: std::sync::Mutex<Vec<String>>,
    failing: bool,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self {
            pushed: std::sync::Mutex::new(Vec::new()),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            pushed: std::sync::Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Identity keys pushed so far
    pub fn pushed_keys(&self) -> Vec<String> {
        self.pushed.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteMirror for MemoryMirror {
    async fn push(&self, record: &TransactionRecord) -> Result<()> {
        if self.failing {
            return Err(Error::InvalidData("mirror unavailable".into()));
        }
        if let Ok(mut pushed) = self.pushed.lock() {
            pushed.push(record.identity_key.clone());
        }
        Ok(())
    }
}
