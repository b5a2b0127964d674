//! Deduplication key derivation
//!
//! Every candidate gets a stable identity so repeated inbox scans (and
//! provider-side duplicate notifications) collapse onto one stored
//! record. Reference-number dedup is exact; the composite fallback
//! accepts a bounded false-collapse risk (two identical transactions to
//! the same merchant within the same minute) in exchange for robustness
//! against duplicated provider messages.

use chrono::{DateTime, Timelike, Utc};
use sha2::{Digest, Sha256};

use crate::models::TransactionCandidate;

/// Merchant prefix length folded into the fallback key
const MERCHANT_KEY_LEN: usize = 24;

/// Derive the deterministic identity key for a candidate.
///
/// Preferred input is `(owner, reference_number)`, since bank reference
/// numbers are unique per transaction. Without one, the key is built
/// from the minute-rounded timestamp, amount, direction, mode and a
/// truncated lowercased merchant.
pub fn identity_key(owner_user_id: &str, candidate: &TransactionCandidate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner_user_id.as_bytes());

    if let Some(ref reference) = candidate.reference_number {
        hasher.update(b"ref:");
        hasher.update(reference.as_bytes());
    } else {
        hasher.update(b"composite:");
        hasher.update(round_to_minute(candidate.timestamp).to_rfc3339().as_bytes());
        hasher.update(format!("{:.2}", candidate.amount).as_bytes());
        hasher.update(candidate.direction.as_str().as_bytes());
        hasher.update(candidate.mode.as_str().as_bytes());
        let merchant: String = candidate
            .merchant
            .to_lowercase()
            .chars()
            .take(MERCHANT_KEY_LEN)
            .collect();
        hasher.update(merchant.as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// One-way hash of a raw message body, stored instead of the text when
/// the privacy settings disallow plaintext retention
pub fn hash_raw_message(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

fn round_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, PaymentMode};
    use chrono::TimeZone;

    fn candidate(ts: DateTime<Utc>, reference: Option<&str>) -> TransactionCandidate {
        TransactionCandidate {
            timestamp: ts,
            amount: 500.0,
            direction: Direction::Debit,
            mode: PaymentMode::Upi,
            merchant: "MERCHANT1".to_string(),
            bank_name: None,
            category: None,
            upi_id: None,
            reference_number: reference.map(|r| r.to_string()),
            matched_shape: "test",
        }
    }

    #[test]
    fn test_reference_key_ignores_timestamp() {
        let a = candidate(Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap(), Some("123456789"));
        let b = candidate(Utc.with_ymd_and_hms(2025, 1, 5, 14, 30, 0).unwrap(), Some("123456789"));
        // Same reference, same owner -> same identity even hours apart
        assert_eq!(identity_key("user-1", &a), identity_key("user-1", &b));
    }

    #[test]
    fn test_reference_key_is_owner_scoped() {
        let c = candidate(Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap(), Some("123456789"));
        assert_ne!(identity_key("user-1", &c), identity_key("user-2", &c));
    }

    #[test]
    fn test_fallback_collapses_within_minute() {
        let a = candidate(Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 5).unwrap(), None);
        let b = candidate(Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 42).unwrap(), None);
        assert_eq!(identity_key("user-1", &a), identity_key("user-1", &b));
    }

    #[test]
    fn test_fallback_distinct_across_minutes() {
        let a = candidate(Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 59).unwrap(), None);
        let b = candidate(Utc.with_ymd_and_hms(2025, 1, 5, 10, 1, 0).unwrap(), None);
        assert_ne!(identity_key("user-1", &a), identity_key("user-1", &b));
    }

    #[test]
    fn test_fallback_distinct_on_amount() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap();
        let a = candidate(ts, None);
        let mut b = candidate(ts, None);
        b.amount = 501.0;
        assert_ne!(identity_key("user-1", &a), identity_key("user-1", &b));
    }

    #[test]
    fn test_raw_hash_differs_from_text() {
        let body = "Rs.500.00 debited from A/c XX1234";
        let hashed = hash_raw_message(body);
        assert_ne!(hashed, body);
        // Deterministic
        assert_eq!(hashed, hash_raw_message(body));
    }
}
