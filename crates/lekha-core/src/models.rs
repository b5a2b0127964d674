//! Domain models for Lekha

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw device inbox message, converted at the platform boundary.
///
/// The native platform message object never crosses into the core;
/// providers map whatever they read into this fixed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessage {
    /// Sender id as reported by the network (e.g., "VM-HDFCBK")
    pub sender: String,
    /// Full message body
    pub body: String,
    /// When the device received the message; fallback timestamp source
    pub received_at: DateTime<Utc>,
}

/// Whether money left or entered the user's account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment channel inferred from message vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Upi,
    Card,
    NetBanking,
    Cash,
    Other,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::Card => "card",
            Self::NetBanking => "net_banking",
            Self::Cash => "cash",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            "net_banking" | "netbanking" => Ok(Self::NetBanking),
            "cash" => Ok(Self::Cash),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment mode: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw message retention: either the original text or a one-way hash,
/// never both. Fixed at ingestion time by the active privacy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RawMessage {
    Plain(String),
    Hashed(String),
}

impl RawMessage {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::Hashed(_) => "hash",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Plain(v) | Self::Hashed(v) => v,
        }
    }

    pub fn from_columns(kind: &str, value: String) -> std::result::Result<Self, String> {
        match kind {
            "plain" => Ok(Self::Plain(value)),
            "hash" => Ok(Self::Hashed(value)),
            other => Err(format!("Unknown raw message kind: {}", other)),
        }
    }
}

/// An extracted-but-not-yet-deduplicated transaction, produced by the
/// pattern extractor. Amount and direction are always present; a message
/// where either is missing never becomes a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCandidate {
    /// When the underlying transaction occurred: the printed date (with
    /// the receipt time-of-day, since messages print no clock), or the
    /// receipt time outright when no date is parseable
    pub timestamp: DateTime<Utc>,
    /// Strictly positive amount; sign is carried by `direction`
    pub amount: f64,
    pub direction: Direction,
    pub mode: PaymentMode,
    /// Best-effort counterparty label, placeholder when unextractable
    pub merchant: String,
    pub bank_name: Option<String>,
    pub category: Option<String>,
    pub upi_id: Option<String>,
    /// Bank reference number; strongest dedup signal when present
    pub reference_number: Option<String>,
    /// Which shape matcher recognized the message
    pub matched_shape: &'static str,
}

/// A record ready for insertion (candidate + owner + identity + privacy)
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub owner_user_id: String,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub direction: Direction,
    pub mode: PaymentMode,
    pub merchant: String,
    pub bank_name: Option<String>,
    pub category: Option<String>,
    pub upi_id: Option<String>,
    pub reference_number: Option<String>,
    pub raw: RawMessage,
    /// Deterministic dedup key, see `dedup::identity_key`
    pub identity_key: String,
}

/// A stored ledger record. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub owner_user_id: String,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub direction: Direction,
    pub mode: PaymentMode,
    pub merchant: String,
    pub bank_name: Option<String>,
    pub category: Option<String>,
    pub upi_id: Option<String>,
    pub reference_number: Option<String>,
    pub raw: RawMessage,
    pub identity_key: String,
    pub created_at: DateTime<Utc>,
}

/// Counters accumulated by one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// True insertions (already-exists hits are not counted)
    pub inserted: usize,
    /// Candidates that collapsed onto an existing record
    pub duplicates: usize,
    /// Messages the extractor did not recognize (normal skips)
    pub unparsed: usize,
    /// Best-effort mirror pushes that failed
    pub remote_failures: usize,
    /// The scan stopped early on a storage failure; counts above are
    /// the progress made before it, and the run is worth retrying
    pub interrupted: bool,
}

/// Definite result of a sync request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncReport {
    /// A full inbox scan ran
    Completed(SyncOutcome),
    /// Another scan was in flight for this user; nothing was started
    AlreadyRunning,
    /// The request landed inside the cooldown window; the previous
    /// outcome is replayed without a new scan
    Debounced(SyncOutcome),
}

/// Debit/credit totals over a period
#[derive(Debug, Clone, Default, Serialize)]
pub struct PeriodSummary {
    pub total_debit: f64,
    pub total_credit: f64,
    pub count: i64,
}
