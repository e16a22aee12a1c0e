//! Region-level errors reported by a serving store.
//!
//! A region error means the store could not serve the request for topology
//! reasons. It travels inside an otherwise well-formed response and is
//! distinct from transport failures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::region::{Peer, Region, StoreId};

/// Tagged region error. Exactly one variant is present per response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionError {
    /// The store is not the leader of the region. `leader` is the store's
    /// hint about who is, when it knows.
    NotLeader {
        region_id: u64,
        leader: Option<Peer>,
    },
    /// The request was addressed to a store id that does not match the
    /// store that received it.
    StoreNotMatch {
        request_store_id: StoreId,
        actual_store_id: StoreId,
    },
    /// The request carried an outdated region epoch. `new_regions` holds the
    /// descriptors the store currently knows for the affected range.
    StaleEpoch { new_regions: Vec<Region> },
    /// The store is overloaded.
    ServerIsBusy { reason: String, backoff_ms: u64 },
    /// The command was proposed against an outdated internal term.
    StaleCommand,
    /// The request exceeds the replication log's entry size limit.
    RaftEntryTooLarge { region_id: u64, entry_size: u64 },
    /// The store holds no replica of the region.
    RegionNotFound { region_id: u64 },
    /// A key of the request lies outside the region's range.
    KeyNotInRegion {
        #[serde(with = "serde_bytes")]
        key: Vec<u8>,
        region_id: u64,
        #[serde(with = "serde_bytes")]
        start_key: Vec<u8>,
        #[serde(with = "serde_bytes")]
        end_key: Vec<u8>,
    },
    /// Any other region error, described only by its message.
    Other { message: String },
}

impl RegionError {
    /// Stable snake_case label, suitable for metrics and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotLeader { .. } => "not_leader",
            Self::StoreNotMatch { .. } => "store_not_match",
            Self::StaleEpoch { .. } => "stale_epoch",
            Self::ServerIsBusy { .. } => "server_is_busy",
            Self::StaleCommand => "stale_command",
            Self::RaftEntryTooLarge { .. } => "raft_entry_too_large",
            Self::RegionNotFound { .. } => "region_not_found",
            Self::KeyNotInRegion { .. } => "key_not_in_region",
            Self::Other { .. } => "unknown",
        }
    }

    /// Region error with no replacement descriptors, as synthesized when the
    /// client has no routing information for a region at all.
    #[must_use]
    pub fn stale_epoch() -> Self {
        Self::StaleEpoch {
            new_regions: Vec::new(),
        }
    }
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLeader {
                region_id,
                leader: Some(leader),
            } => write!(f, "not leader: region {region_id}, leader is {leader}"),
            Self::NotLeader {
                region_id,
                leader: None,
            } => write!(f, "not leader: region {region_id}, leader unknown"),
            Self::StoreNotMatch {
                request_store_id,
                actual_store_id,
            } => write!(
                f,
                "store not match: requested store {request_store_id}, actual store {actual_store_id}"
            ),
            Self::StaleEpoch { new_regions } => {
                write!(f, "stale epoch: {} new region(s)", new_regions.len())
            }
            Self::ServerIsBusy { reason, backoff_ms } => {
                write!(f, "server is busy: {reason} (suggested backoff {backoff_ms}ms)")
            }
            Self::StaleCommand => f.write_str("stale command"),
            Self::RaftEntryTooLarge {
                region_id,
                entry_size,
            } => write!(
                f,
                "raft entry too large: region {region_id}, entry size {entry_size}"
            ),
            Self::RegionNotFound { region_id } => write!(f, "region {region_id} not found"),
            Self::KeyNotInRegion { key, region_id, .. } => {
                write!(f, "key {key:?} not in region {region_id}")
            }
            Self::Other { message } => f.write_str(message),
        }
    }
}
