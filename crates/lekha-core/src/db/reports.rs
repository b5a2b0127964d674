//! Period summaries and date grouping
//!
//! Read-side computation over already-persisted records; never triggers
//! a sync or re-reads raw messages.

use chrono::{DateTime, Local, Utc};
use rusqlite::params;

use super::{format_datetime, Database};
use crate::error::Result;
use crate::models::{PeriodSummary, TransactionRecord};

impl Database {
    /// Debit/credit totals and record count for a user over `[from, to)`
    pub fn summarize(
        &self,
        owner_user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PeriodSummary> {
        let conn = self.conn()?;

        let (total_debit, total_credit, count): (f64, f64, i64) = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN direction = 'debit' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN direction = 'credit' THEN amount ELSE 0 END), 0),
                COUNT(*)
            FROM transactions
            WHERE owner_user_id = ?1 AND ts >= ?2 AND ts < ?3
            "#,
            params![
                owner_user_id,
                format_datetime(from),
                format_datetime(to)
            ],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(PeriodSummary {
            total_debit,
            total_credit,
            count,
        })
    }
}

/// Group records by calendar date label, preserving the incoming order
/// within each group.
///
/// The label uses the device's local time zone at read time, not at
/// ingestion time: a record can legitimately group under a different
/// date after a time zone change. Returned in first-seen group order, so
/// feeding records sorted timestamp-descending yields newest dates first.
pub fn group_by_date(records: &[TransactionRecord]) -> Vec<(String, Vec<TransactionRecord>)> {
    let mut groups: Vec<(String, Vec<TransactionRecord>)> = Vec::new();

    for record in records {
        let label = record
            .timestamp
            .with_timezone(&Local)
            .format("%d %b %Y")
            .to_string();

        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, bucket)) => bucket.push(record.clone()),
            None => groups.push((label, vec![record.clone()])),
        }
    }

    groups
}
