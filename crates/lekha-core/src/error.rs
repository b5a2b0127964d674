//! Error types for Lekha

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Inbox permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Whether the caller should treat this failure as transient.
    ///
    /// Storage-unavailable conditions (database, pool, disk) are retryable;
    /// a denied inbox permission is terminal for the attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Pool(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
