//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Lekha - SMS-derived transaction ledger
#[derive(Parser)]
#[command(name = "lekha")]
#[command(about = "Local-first transaction ledger built from bank SMS messages", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "lekha.db", global = true)]
    pub db: PathBuf,

    /// User whose ledger to operate on
    #[arg(short, long, default_value = "local", global = true)]
    pub user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set LEKHA_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Scan an SMS inbox export and ingest new transactions
    Sync {
        /// Inbox export file (CSV: sender,body,received_at)
        #[arg(short, long)]
        file: PathBuf,

        /// Only scan messages received on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Keep running, re-scanning every N seconds
        #[arg(long)]
        every: Option<u64>,
    },

    /// List stored transactions
    Transactions {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Number of records to skip (for paging)
        #[arg(long, default_value = "0")]
        offset: i64,
    },

    /// Show debit/credit totals for a period
    Report {
        /// Period: this-month, last-month, this-year, all
        #[arg(short, long, default_value = "this-month")]
        period: String,

        /// Custom period start (YYYY-MM-DD), overrides --period with --to
        #[arg(long)]
        from: Option<String>,

        /// Custom period end, exclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show database status (encryption, record counts)
    Status,
}
