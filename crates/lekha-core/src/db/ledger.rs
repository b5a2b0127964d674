//! Transaction record storage

use rusqlite::{params, OptionalExtension};

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewRecord, RawMessage, TransactionRecord};

/// Result of inserting a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerInsertResult {
    /// Record was inserted, contains the new row id
    Inserted(i64),
    /// A record with this identity key already exists, contains its row id
    AlreadyExists(i64),
}

impl LedgerInsertResult {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

impl Database {
    /// Insert a record unless one with the same identity key exists.
    ///
    /// Atomic with respect to `(owner_user_id, identity_key)` uniqueness:
    /// the unique index arbitrates concurrent calls, so exactly one of
    /// them performs the logical insertion. Never mutates an existing row.
    /// The conflict clause names the identity index, so any other
    /// constraint failure (e.g. the amount check) still errors.
    pub fn insert_if_absent(&self, record: &NewRecord) -> Result<LedgerInsertResult> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            INSERT INTO transactions
                (owner_user_id, ts, amount, direction, mode, merchant, bank_name,
                 category, upi_id, reference_number, raw_kind, raw_value, identity_key)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_user_id, identity_key) DO NOTHING
            "#,
            params![
                record.owner_user_id,
                format_datetime(record.timestamp),
                record.amount,
                record.direction.as_str(),
                record.mode.as_str(),
                record.merchant,
                record.bank_name,
                record.category,
                record.upi_id,
                record.reference_number,
                record.raw.kind_str(),
                record.raw.value(),
                record.identity_key,
            ],
        )?;

        if changed == 1 {
            return Ok(LedgerInsertResult::Inserted(conn.last_insert_rowid()));
        }

        let existing: i64 = conn.query_row(
            "SELECT id FROM transactions WHERE owner_user_id = ? AND identity_key = ?",
            params![record.owner_user_id, record.identity_key],
            |row| row.get(0),
        )?;
        Ok(LedgerInsertResult::AlreadyExists(existing))
    }

    /// All records for a user in the fixed pagination order
    /// (timestamp descending, identity key ascending as tiebreak)
    pub fn get_all_for_user(&self, owner_user_id: &str) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_user_id, ts, amount, direction, mode, merchant, bank_name,
                   category, upi_id, reference_number, raw_kind, raw_value, identity_key, created_at
            FROM transactions
            WHERE owner_user_id = ?
            ORDER BY ts DESC, identity_key ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![owner_user_id], |row| Self::row_to_record(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// One page of a user's records.
    ///
    /// The sort order is total (identity key breaks timestamp ties), so
    /// concatenating pages never duplicates or skips a record for a fixed
    /// record set.
    pub fn get_page_for_user(
        &self,
        owner_user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_user_id, ts, amount, direction, mode, merchant, bank_name,
                   category, upi_id, reference_number, raw_kind, raw_value, identity_key, created_at
            FROM transactions
            WHERE owner_user_id = ?
            ORDER BY ts DESC, identity_key ASC
            LIMIT ? OFFSET ?
            "#,
        )?;

        let records = stmt
            .query_map(params![owner_user_id, limit, offset], |row| {
                Self::row_to_record(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Count records for a user
    pub fn count_for_user(&self, owner_user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE owner_user_id = ?",
            params![owner_user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get a single record by id
    pub fn get_record(&self, id: i64) -> Result<Option<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_user_id, ts, amount, direction, mode, merchant, bank_name,
                   category, upi_id, reference_number, raw_kind, raw_value, identity_key, created_at
            FROM transactions WHERE id = ?
            "#,
        )?;

        let record = stmt
            .query_row(params![id], |row| Self::row_to_record(row))
            .optional()?;

        Ok(record)
    }

    /// Helper to convert a row to TransactionRecord
    /// Column order: id, owner_user_id, ts, amount, direction, mode, merchant,
    ///               bank_name, category, upi_id, reference_number, raw_kind,
    ///               raw_value, identity_key, created_at
    pub(crate) fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TransactionRecord> {
        let ts_str: String = row.get(2)?;
        let direction_str: String = row.get(4)?;
        let mode_str: String = row.get(5)?;
        let raw_kind: String = row.get(11)?;
        let raw_value: String = row.get(12)?;
        let created_at_str: String = row.get(14)?;

        let direction = direction_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;
        let mode = mode_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;
        let raw = RawMessage::from_columns(&raw_kind, raw_value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;
        let timestamp = parse_datetime(&ts_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;
        let created_at = parse_datetime(&created_at_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                14,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;

        Ok(TransactionRecord {
            id: row.get(0)?,
            owner_user_id: row.get(1)?,
            timestamp,
            amount: row.get(3)?,
            direction,
            mode,
            merchant: row.get(6)?,
            bank_name: row.get(7)?,
            category: row.get(8)?,
            upi_id: row.get(9)?,
            reference_number: row.get(10)?,
            raw,
            identity_key: row.get(13)?,
            created_at,
        })
    }
}
