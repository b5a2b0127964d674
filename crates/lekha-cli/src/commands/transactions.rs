//! Transaction listing

use anyhow::Result;
use lekha_core::db::{group_by_date, Database};
use lekha_core::models::Direction;

use super::truncate;

pub fn cmd_transactions_list(db: &Database, user: &str, limit: i64, offset: i64) -> Result<()> {
    let records = db.get_page_for_user(user, offset, limit)?;

    if records.is_empty() {
        if offset == 0 {
            println!("No transactions found. Scan an inbox export with:");
            println!("  lekha sync --file inbox.csv");
        } else {
            println!("No more transactions.");
        }
        return Ok(());
    }

    let total = db.count_for_user(user)?;

    println!();
    println!("📝 Transactions ({} total)", total);

    for (date, group) in group_by_date(&records) {
        println!();
        println!("   {}", date);
        println!("   ─────────────────────────────────────────────────────────────");
        for tx in group {
            let amount_str = match tx.direction {
                Direction::Debit => format!("\x1b[31m-₹{:.2}\x1b[0m", tx.amount),
                Direction::Credit => format!("\x1b[32m+₹{:.2}\x1b[0m", tx.amount),
            };
            let detail = tx
                .upi_id
                .as_deref()
                .or(tx.reference_number.as_deref())
                .unwrap_or("");

            println!(
                "   {:>12} │ {:<4} │ {:<28} {}",
                amount_str,
                tx.mode.as_str(),
                truncate(&tx.merchant, 28),
                truncate(detail, 20)
            );
        }
    }

    let shown_through = offset + records.len() as i64;
    if shown_through < total {
        println!();
        println!(
            "   Showing {}-{} of {}. Next page: lekha transactions --offset {}",
            offset + 1,
            shown_through,
            total,
            shown_through
        );
    }

    Ok(())
}
