//! Period resolution and the report command

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use lekha_core::db::Database;

/// First day of the month containing `date`
fn month_start(year: i32, month: u32) -> NaiveDate {
    // month is always 1..=12 here
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// First day of the month after (year, month)
fn next_month_start(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        month_start(year + 1, 1)
    } else {
        month_start(year, month + 1)
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Resolve a period string to a half-open `[from, to)` range.
///
/// Custom `--from`/`--to` dates take precedence; `--to` is exclusive.
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if let (Some(from), Some(to)) = (custom_from, custom_to) {
        let from_date = NaiveDate::parse_from_str(from, "%Y-%m-%d")
            .context("Invalid --from date format (use YYYY-MM-DD)")?;
        let to_date = NaiveDate::parse_from_str(to, "%Y-%m-%d")
            .context("Invalid --to date format (use YYYY-MM-DD)")?;
        return Ok((midnight(from_date), midnight(to_date)));
    }

    let today = Utc::now().date_naive();

    match period.to_lowercase().as_str() {
        "this-month" => Ok((
            midnight(month_start(today.year(), today.month())),
            midnight(next_month_start(today.year(), today.month())),
        )),
        "last-month" => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            Ok((
                midnight(month_start(year, month)),
                midnight(next_month_start(year, month)),
            ))
        }
        "this-year" => Ok((
            midnight(month_start(today.year(), 1)),
            midnight(month_start(today.year() + 1, 1)),
        )),
        "all" => Ok((
            midnight(month_start(2000, 1)),
            midnight(today) + Duration::days(1),
        )),
        _ => anyhow::bail!(
            "Unknown period: {}. Available: this-month, last-month, this-year, all",
            period
        ),
    }
}

pub fn cmd_report(
    db: &Database,
    user: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<()> {
    let summary = db.summarize(user, from, to)?;

    println!();
    println!("📊 Period Summary");
    println!(
        "   Period: {} to {} (exclusive)",
        from.format("%Y-%m-%d"),
        to.format("%Y-%m-%d")
    );
    println!("   ─────────────────────────────");

    if summary.count == 0 {
        println!("   No transactions in this period.");
        return Ok(());
    }

    let net = summary.total_credit - summary.total_debit;
    println!("   🔻 Spent:    ₹{:.2}", summary.total_debit);
    println!("   🔺 Received: ₹{:.2}", summary.total_credit);
    if net >= 0.0 {
        println!("   Net:      \x1b[32m+₹{:.2}\x1b[0m", net);
    } else {
        println!("   Net:      \x1b[31m-₹{:.2}\x1b[0m", net.abs());
    }
    println!("   Transactions: {}", summary.count);

    Ok(())
}
