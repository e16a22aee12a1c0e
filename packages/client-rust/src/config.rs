use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts the sender applies to individual send attempts.
///
/// Callers pick the timeout per request; these are the standard tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SenderConfig {
    /// Timeout for point reads and small writes, in milliseconds.
    pub read_timeout_short_ms: u64,
    /// Timeout for batched reads and writes, in milliseconds.
    pub read_timeout_medium_ms: u64,
    /// Timeout for scans and coprocessor requests, in milliseconds.
    pub read_timeout_long_ms: u64,
}

impl SenderConfig {
    #[must_use]
    pub fn read_timeout_short(&self) -> Duration {
        Duration::from_millis(self.read_timeout_short_ms)
    }

    #[must_use]
    pub fn read_timeout_medium(&self) -> Duration {
        Duration::from_millis(self.read_timeout_medium_ms)
    }

    #[must_use]
    pub fn read_timeout_long(&self) -> Duration {
        Duration::from_millis(self.read_timeout_long_ms)
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            read_timeout_short_ms: 20_000,
            read_timeout_medium_ms: 60_000,
            read_timeout_long_ms: 150_000,
        }
    }
}
