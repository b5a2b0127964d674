//! Sync coordinator
//!
//! Orchestrates one pass over the device inbox: read messages, extract
//! candidates, derive identity keys, insert-if-absent into the local
//! ledger, and opportunistically mirror fresh insertions. The local
//! store is the durable source of truth; mirror pushes never roll back
//! or fail a local insertion.
//!
//! Concurrency: at most one in-flight scan per user (single-flight),
//! with a short cooldown window that coalesces rapid re-invocations by
//! replaying the previous outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::dedup::{hash_raw_message, identity_key};
use crate::error::{Error, Result};
use crate::extract::MessageExtractor;
use crate::inbox::InboxProvider;
use crate::mirror::RemoteMirror;
use crate::models::{
    InboxMessage, NewRecord, RawMessage, SyncOutcome, SyncReport, TransactionRecord,
};
use crate::settings::{PrivacySettings, DEFAULT_DEBOUNCE};

/// Per-user sync state owned by the coordinator.
///
/// The explicit idle/running flag here is the single-flight guard; it is
/// set before the inbox scan starts and cleared by a drop guard on every
/// exit path.
#[derive(Default)]
struct UserSyncState {
    running: bool,
    finished_at: Option<Instant>,
    last_outcome: Option<SyncOutcome>,
}

type StateMap = Arc<Mutex<HashMap<String, UserSyncState>>>;

/// Clears the running flag when the scan exits, success or not
struct FlightGuard {
    states: StateMap,
    owner: String,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(&self.owner) {
                state.running = false;
            }
        }
    }
}

pub struct SyncCoordinator<I: InboxProvider> {
    db: Database,
    extractor: MessageExtractor,
    inbox: I,
    mirror: Option<Arc<dyn RemoteMirror>>,
    settings: PrivacySettings,
    debounce: Duration,
    states: StateMap,
}

impl<I: InboxProvider> SyncCoordinator<I> {
    pub fn new(db: Database, inbox: I, settings: PrivacySettings) -> Result<Self> {
        Ok(Self {
            db,
            extractor: MessageExtractor::new()?,
            inbox,
            mirror: None,
            settings,
            debounce: DEFAULT_DEBOUNCE,
            states: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Attach a remote mirror; pushes still require
    /// `persist_remote_transactions` to be enabled
    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Whether inbox access is granted right now
    pub fn has_permission(&self) -> bool {
        self.inbox.has_permission()
    }

    /// Ask the platform for inbox access
    pub fn request_permission(&self) -> bool {
        self.inbox.request_permission()
    }

    /// Run one sync pass for a user over messages received since `from`.
    ///
    /// Always yields a definite result: a completed outcome with the
    /// count of true insertions, an already-running signal, a replayed
    /// outcome inside the cooldown window, or a typed error
    /// (denied permission, store unavailable before any progress).
    pub async fn sync(&self, owner_user_id: &str, from: DateTime<Utc>) -> Result<SyncReport> {
        // Single-flight + debounce gate
        let _guard = {
            let mut states = self
                .states
                .lock()
                .map_err(|_| Error::InvalidData("sync state poisoned".into()))?;
            let state = states.entry(owner_user_id.to_string()).or_default();

            if state.running {
                debug!(user = owner_user_id, "Sync already in progress, rejecting");
                return Ok(SyncReport::AlreadyRunning);
            }

            if let (Some(finished), Some(outcome)) = (state.finished_at, &state.last_outcome) {
                if finished.elapsed() < self.debounce {
                    debug!(user = owner_user_id, "Sync debounced, replaying last outcome");
                    return Ok(SyncReport::Debounced(outcome.clone()));
                }
            }

            state.running = true;
            FlightGuard {
                states: Arc::clone(&self.states),
                owner: owner_user_id.to_string(),
            }
        };

        // Permission is checked per attempt; denial is terminal for this
        // run and never retried from here
        if !self.inbox.has_permission() && !self.inbox.request_permission() {
            return Err(Error::PermissionDenied(
                "inbox read access not granted".into(),
            ));
        }

        let messages = self.inbox.read_since(from)?;
        debug!(user = owner_user_id, count = messages.len(), "Scanning inbox");

        let outcome = self.ingest(owner_user_id, &messages).await;

        info!(
            user = owner_user_id,
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            unparsed = outcome.unparsed,
            remote_failures = outcome.remote_failures,
            interrupted = outcome.interrupted,
            "Sync finished"
        );

        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(owner_user_id) {
                state.finished_at = Some(Instant::now());
                state.last_outcome = Some(outcome.clone());
            }
        }

        Ok(SyncReport::Completed(outcome))
    }

    async fn ingest(&self, owner_user_id: &str, messages: &[InboxMessage]) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();

        for message in messages {
            // Unrecognized messages are a normal skip, not a failure
            let Some(candidate) = self.extractor.extract(message) else {
                outcome.unparsed += 1;
                continue;
            };

            let key = identity_key(owner_user_id, &candidate);

            // Plain vs hash is decided here, at ingestion time, and the
            // stored row keeps that shape forever
            let raw = if self.settings.store_plain_raw_message {
                RawMessage::Plain(message.body.clone())
            } else {
                RawMessage::Hashed(hash_raw_message(&message.body))
            };

            let record = NewRecord {
                owner_user_id: owner_user_id.to_string(),
                timestamp: candidate.timestamp,
                amount: candidate.amount,
                direction: candidate.direction,
                mode: candidate.mode,
                merchant: candidate.merchant,
                bank_name: candidate.bank_name,
                category: candidate.category,
                upi_id: candidate.upi_id,
                reference_number: candidate.reference_number,
                raw,
                identity_key: key,
            };

            match self.db.insert_if_absent(&record) {
                Ok(crate::db::LedgerInsertResult::Inserted(id)) => {
                    outcome.inserted += 1;
                    if self.settings.persist_remote_transactions {
                        if let Some(ref mirror) = self.mirror {
                            self.push_to_mirror(mirror, id, &record, &mut outcome).await;
                        }
                    }
                }
                Ok(crate::db::LedgerInsertResult::AlreadyExists(_)) => {
                    outcome.duplicates += 1;
                }
                Err(e) => {
                    // Keep the progress made before the failure; the
                    // caller sees a partial, retryable outcome
                    error!(user = owner_user_id, error = %e, "Ledger insert failed, stopping scan");
                    outcome.interrupted = true;
                    break;
                }
            }
        }

        outcome
    }

    /// Best-effort mirror push for one freshly inserted record. Failure
    /// is counted and logged, never propagated: the local insertion
    /// already succeeded and is the system of record.
    async fn push_to_mirror(
        &self,
        mirror: &Arc<dyn RemoteMirror>,
        id: i64,
        record: &NewRecord,
        outcome: &mut SyncOutcome,
    ) {
        let stored = TransactionRecord {
            id,
            owner_user_id: record.owner_user_id.clone(),
            timestamp: record.timestamp,
            amount: record.amount,
            direction: record.direction,
            mode: record.mode,
            merchant: record.merchant.clone(),
            bank_name: record.bank_name.clone(),
            category: record.category.clone(),
            upi_id: record.upi_id.clone(),
            reference_number: record.reference_number.clone(),
            raw: record.raw.clone(),
            identity_key: record.identity_key.clone(),
            created_at: Utc::now(),
        };

        if let Err(e) = mirror.push(&stored).await {
            warn!(identity_key = %record.identity_key, error = %e, "Mirror push failed");
            outcome.remote_failures += 1;
        }
    }
}
