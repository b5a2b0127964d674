//! Lekha Core Library
//!
//! Shared functionality for the Lekha transaction ledger:
//! - Pattern extraction of transactions from bank inbox messages
//! - Deterministic identity keys for cross-run deduplication
//! - Encrypted local ledger storage with stable pagination
//! - Sync coordination (single-flight, debounced inbox scans)
//! - Optional best-effort remote mirroring
//! - Period summaries and date grouping for reports

pub mod db;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod inbox;
pub mod mirror;
pub mod models;
pub mod settings;
pub mod sync;

pub use db::{group_by_date, Database, LedgerInsertResult};
pub use dedup::{hash_raw_message, identity_key};
pub use error::{Error, Result};
pub use extract::MessageExtractor;
pub use inbox::{CsvInbox, InboxProvider, MemoryInbox};
pub use mirror::{HttpMirror, MemoryMirror, RemoteMirror};
pub use models::{
    Direction, InboxMessage, NewRecord, PaymentMode, PeriodSummary, RawMessage, SyncOutcome,
    SyncReport, TransactionCandidate, TransactionRecord,
};
pub use settings::PrivacySettings;
pub use sync::SyncCoordinator;
