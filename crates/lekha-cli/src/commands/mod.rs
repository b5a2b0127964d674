//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db)
//! - `reports` - Period resolution and the report command
//! - `sync` - Inbox scan command, one-shot and periodic
//! - `transactions` - Transaction listing

pub mod core;
pub mod reports;
pub mod sync;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use reports::*;
pub use sync::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..."
/// if truncated. Counts chars, not bytes: merchant labels extracted
/// from SMS bodies can carry Devanagari or the rupee sign.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
