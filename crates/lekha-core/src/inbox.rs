//! Device inbox boundary
//!
//! The platform message store is only ever seen through `InboxProvider`;
//! whatever native object a platform hands out is converted to
//! `InboxMessage` at this boundary and never carried further in.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::InboxMessage;

/// Permission-gated read access to inbox messages.
///
/// A denied permission is terminal for the sync attempt that hit it;
/// this core never retries the request itself.
pub trait InboxProvider: Send + Sync {
    /// Whether inbox read access is currently granted
    fn has_permission(&self) -> bool;

    /// Ask the platform for access; returns the resulting grant state
    fn request_permission(&self) -> bool;

    /// All messages received at or after `from`, oldest first
    fn read_since(&self, from: DateTime<Utc>) -> Result<Vec<InboxMessage>>;
}

/// Inbox provider over an SMS export file.
///
/// Format: CSV with a `sender,body,received_at` header, `received_at`
/// in RFC 3339. This is what the common Android SMS backup tools emit.
pub struct CsvInbox {
    path: PathBuf,
}

impl CsvInbox {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl InboxProvider for CsvInbox {
    /// For a file-based inbox, "permission" is readability of the export
    fn has_permission(&self) -> bool {
        std::fs::File::open(&self.path).is_ok()
    }

    fn request_permission(&self) -> bool {
        self.has_permission()
    }

    fn read_since(&self, from: DateTime<Utc>) -> Result<Vec<InboxMessage>> {
        let file = std::fs::File::open(&self.path)?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut messages = Vec::new();
        for result in rdr.records() {
            let record = result?;

            let sender = record
                .get(0)
                .ok_or_else(|| Error::InvalidData("Missing sender column".into()))?
                .to_string();
            let body = record
                .get(1)
                .ok_or_else(|| Error::InvalidData("Missing body column".into()))?
                .to_string();
            let received_str = record
                .get(2)
                .ok_or_else(|| Error::InvalidData("Missing received_at column".into()))?;
            let received_at = DateTime::parse_from_rfc3339(received_str.trim())
                .map_err(|e| {
                    Error::InvalidData(format!(
                        "Unable to parse received_at '{}': {}",
                        received_str, e
                    ))
                })?
                .with_timezone(&Utc);

            if received_at >= from {
                messages.push(InboxMessage {
                    sender,
                    body,
                    received_at,
                });
            }
        }

        debug!(count = messages.len(), "Read inbox messages from export");
        Ok(messages)
    }
}

/// In-memory inbox for tests and simulations
pub struct MemoryInbox {
    messages: Vec<InboxMessage>,
    granted: bool,
}

impl MemoryInbox {
    pub fn new(messages: Vec<InboxMessage>) -> Self {
        Self {
            messages,
            granted: true,
        }
    }

    pub fn denied() -> Self {
        Self {
            messages: Vec::new(),
            granted: false,
        }
    }
}

impl InboxProvider for MemoryInbox {
    fn has_permission(&self) -> bool {
        self.granted
    }

    fn request_permission(&self) -> bool {
        self.granted
    }

    fn read_since(&self, from: DateTime<Utc>) -> Result<Vec<InboxMessage>> {
        Ok(self
            .messages
            .iter()
            .filter(|m| m.received_at >= from)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_csv_inbox_reads_and_filters() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sender,body,received_at").unwrap();
        writeln!(
            file,
            "VM-HDFCBK,\"Rs.500.00 debited from A/c XX1234 to SHOP via UPI\",2025-01-05T10:00:00Z"
        )
        .unwrap();
        writeln!(
            file,
            "VM-HDFCBK,\"Rs.300.00 debited from A/c XX1234 to OLD via UPI\",2024-12-01T10:00:00Z"
        )
        .unwrap();

        let inbox = CsvInbox::new(file.path());
        assert!(inbox.has_permission());

        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let messages = inbox.read_since(from).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "VM-HDFCBK");
        assert!(messages[0].body.contains("SHOP"));
    }

    #[test]
    fn test_csv_inbox_missing_file_denied() {
        let inbox = CsvInbox::new("/nonexistent/inbox.csv");
        assert!(!inbox.has_permission());
        assert!(!inbox.request_permission());
    }

    #[test]
    fn test_csv_inbox_bad_timestamp_is_invalid_data() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sender,body,received_at").unwrap();
        writeln!(file, "VM-HDFCBK,hello,not-a-date").unwrap();

        let inbox = CsvInbox::new(file.path());
        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let err = inbox.read_since(from).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }
}
