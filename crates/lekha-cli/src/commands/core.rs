//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database status

use std::path::Path;

use anyhow::{Context, Result};
use lekha_core::db::Database;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_string_lossy();
    if no_encrypt {
        Database::new_unencrypted(&path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(&path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Scan an inbox export: lekha sync --file inbox.csv");
    println!("  2. View your ledger: lekha transactions");

    Ok(())
}

pub fn cmd_status(db_path: &Path, user: &str, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    let count = db.count_for_user(user).context("Failed to count records")?;
    let encrypted = db.is_encrypted().unwrap_or(false);
    let size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    println!();
    println!("📇 Lekha Status");
    println!("   ─────────────────────────────");
    println!("   Database: {}", db_path.display());
    println!("   Size: {:.1} KB", size as f64 / 1024.0);
    if encrypted {
        println!("   🔒 Encryption: ENABLED");
    } else {
        println!("   ⚠️  Encryption: DISABLED");
    }
    println!("   User: {}", user);
    println!("   Transactions: {}", count);

    Ok(())
}
