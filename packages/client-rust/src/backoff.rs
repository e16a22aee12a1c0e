//! Backoff categories.
//!
//! The policy behind each category (base delay, cap, jitter, total budget)
//! belongs to the `Backoffer` implementation. The sender only names the
//! category when it asks for a wait.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named retry class used by a `Backoffer` to pick timing and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackoffKind {
    /// Transport-level failure talking to a store.
    StoreRpc,
    /// Region leader unknown; wait for an election to settle.
    RegionMiss,
    /// Store asked the client to slow down.
    ServerBusy,
    /// Blocked on another transaction's lock.
    TxnLock,
    /// Failure talking to the placement service.
    PdRpc,
    /// Leader hint could not be applied yet.
    UpdateLeader,
}

impl BackoffKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StoreRpc => "storeRPC",
            Self::RegionMiss => "regionMiss",
            Self::ServerBusy => "serverBusy",
            Self::TxnLock => "txnLock",
            Self::PdRpc => "pdRPC",
            Self::UpdateLeader => "updateLeader",
        }
    }
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
