//! Inbox scan command, one-shot and periodic

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use lekha_core::inbox::CsvInbox;
use lekha_core::mirror::HttpMirror;
use lekha_core::models::{SyncOutcome, SyncReport};
use lekha_core::settings::{debounce_from_env, PrivacySettings};
use lekha_core::sync::SyncCoordinator;

use super::open_db;

pub async fn cmd_sync(
    db_path: &Path,
    file: &Path,
    user: &str,
    since: Option<&str>,
    every: Option<u64>,
    no_encrypt: bool,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    let from = match since {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .context("Invalid --since date format (use YYYY-MM-DD)")?;
            date.and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        }
        None => DateTime::<Utc>::UNIX_EPOCH,
    };

    let settings = PrivacySettings::from_env();
    let mut coordinator = SyncCoordinator::new(db, CsvInbox::new(file), settings)
        .context("Failed to build sync coordinator")?
        .with_debounce(debounce_from_env());

    if let Some(mirror) = HttpMirror::from_env() {
        if settings.persist_remote_transactions {
            println!("   ☁️  Remote mirror enabled");
        }
        coordinator = coordinator.with_mirror(Arc::new(mirror));
    }

    match every {
        None => {
            run_once(&coordinator, user, from, file).await?;
        }
        Some(secs) => {
            println!(
                "🔄 Periodic sync every {}s from {} (Ctrl-C to stop)",
                secs,
                file.display()
            );
            let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
            loop {
                interval.tick().await;
                if let Err(e) = run_once(&coordinator, user, from, file).await {
                    // A failed scan is logged, not fatal; the next tick retries
                    info!(error = %e, "Sync attempt failed");
                    println!("⚠️  Sync failed: {:#}", e);
                }
            }
        }
    }

    Ok(())
}

async fn run_once(
    coordinator: &SyncCoordinator<CsvInbox>,
    user: &str,
    from: DateTime<Utc>,
    file: &Path,
) -> Result<()> {
    println!("📨 Scanning {} for transactions...", file.display());

    let report = coordinator
        .sync(user, from)
        .await
        .context("Sync failed")?;

    match report {
        SyncReport::Completed(outcome) => print_outcome(&outcome),
        SyncReport::AlreadyRunning => {
            println!("⏳ A sync is already running for this user.");
        }
        SyncReport::Debounced(outcome) => {
            println!("💤 Recently synced; showing the previous result:");
            print_outcome(&outcome);
        }
    }

    Ok(())
}

fn print_outcome(outcome: &SyncOutcome) {
    println!();
    println!("📊 Sync Results");
    println!("   ─────────────────────────────");
    println!("   ✅ New transactions: {}", outcome.inserted);
    println!("   👯 Already recorded: {}", outcome.duplicates);
    println!("   ✉️  Non-transactional: {}", outcome.unparsed);
    if outcome.remote_failures > 0 {
        println!(
            "   ☁️  Mirror pushes failed: {} (records are safe locally)",
            outcome.remote_failures
        );
    }
    if outcome.interrupted {
        println!("   ⚠️  Scan stopped early on a storage error; run sync again.");
    }
}
