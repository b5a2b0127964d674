//! Lekha CLI - SMS-derived transaction ledger
//!
//! Usage:
//!   lekha init                          Initialize database
//!   lekha sync --file inbox.csv         Scan an inbox export for transactions
//!   lekha transactions                  List stored transactions
//!   lekha report --period this-month    Debit/credit totals for a period

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Sync { file, since, every } => {
            commands::cmd_sync(
                &cli.db,
                &file,
                &cli.user,
                since.as_deref(),
                every,
                cli.no_encrypt,
            )
            .await
        }
        Commands::Transactions { limit, offset } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_transactions_list(&db, &cli.user, limit, offset)
        }
        Commands::Report { period, from, to } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let (from, to) = commands::resolve_period(&period, from.as_deref(), to.as_deref())?;
            commands::cmd_report(&db, &cli.user, from, to)
        }
        Commands::Status => commands::cmd_status(&cli.db, &cli.user, cli.no_encrypt),
    }
}
