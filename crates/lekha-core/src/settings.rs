//! Process-wide privacy and sync settings
//!
//! Read once at startup, applied at ingestion time. A record written
//! under one configuration keeps its shape; later edits never rewrite
//! stored rows.

use std::time::Duration;

use tracing::warn;

/// Environment variable: mirror raw transactions to the remote store
pub const PERSIST_REMOTE_ENV: &str = "LEKHA_MIRROR_PUSH";

/// Environment variable: retain the original SMS text instead of a hash
pub const STORE_RAW_ENV: &str = "LEKHA_STORE_RAW_SMS";

/// Environment variable: sync cooldown window override, in seconds
pub const DEBOUNCE_ENV: &str = "LEKHA_SYNC_DEBOUNCE_SECS";

/// Default cooldown absorbing accidental rapid re-taps
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(3);

/// Privacy configuration, fixed for the life of the process
#[derive(Debug, Clone, Copy)]
pub struct PrivacySettings {
    /// Whether locally inserted records are pushed to the remote mirror
    pub persist_remote_transactions: bool,
    /// When false, only a one-way hash of the raw message is retained
    pub store_plain_raw_message: bool,
}

impl Default for PrivacySettings {
    /// Conservative defaults: no mirroring, hash-only retention
    fn default() -> Self {
        Self {
            persist_remote_transactions: false,
            store_plain_raw_message: false,
        }
    }
}

impl PrivacySettings {
    pub fn from_env() -> Self {
        Self {
            persist_remote_transactions: env_flag(PERSIST_REMOTE_ENV),
            store_plain_raw_message: env_flag(STORE_RAW_ENV),
        }
    }
}

/// Sync cooldown window, from env override or default
pub fn debounce_from_env() -> Duration {
    match std::env::var(DEBOUNCE_ENV) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!("Ignoring unparseable {}={}", DEBOUNCE_ENV, raw);
                DEFAULT_DEBOUNCE
            }
        },
        Err(_) => DEFAULT_DEBOUNCE,
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_private() {
        let settings = PrivacySettings::default();
        assert!(!settings.persist_remote_transactions);
        assert!(!settings.store_plain_raw_message);
    }
}
