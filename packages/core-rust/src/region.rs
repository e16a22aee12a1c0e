//! Region topology types.
//!
//! A region is a contiguous key range replicated across several stores with
//! one elected leader. These types describe a region at a specific topology
//! version and the peers that host it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a physical store (node) hosting region replicas.
pub type StoreId = u64;

// ---------------------------------------------------------------------------
// RegionVerId
// ---------------------------------------------------------------------------

/// Stable handle naming a region at a specific topology version.
///
/// Two handles with the same `id` but different versions refer to different
/// incarnations of the region (before and after a split, merge or
/// membership change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionVerId {
    pub id: u64,
    pub conf_ver: u64,
    pub ver: u64,
}

impl RegionVerId {
    #[must_use]
    pub fn new(id: u64, conf_ver: u64, ver: u64) -> Self {
        Self { id, conf_ver, ver }
    }
}

impl fmt::Display for RegionVerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ region id: {}, ver: {}, confVer: {} }}",
            self.id, self.ver, self.conf_ver
        )
    }
}

// ---------------------------------------------------------------------------
// RegionEpoch / Peer
// ---------------------------------------------------------------------------

/// Topology version of a region.
///
/// `conf_ver` advances on membership changes, `version` on splits and merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionEpoch {
    pub conf_ver: u64,
    pub version: u64,
}

/// A single replica of a region, placed on a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: u64,
    pub store_id: StoreId,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer {} on store {}", self.id, self.store_id)
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Region descriptor: key range, epoch, and replica placement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: u64,
    #[serde(with = "serde_bytes")]
    pub start_key: Vec<u8>,
    /// Exclusive upper bound. Empty means unbounded.
    #[serde(with = "serde_bytes")]
    pub end_key: Vec<u8>,
    pub region_epoch: RegionEpoch,
    pub peers: Vec<Peer>,
}

impl Region {
    /// Returns the version handle for this descriptor.
    #[must_use]
    pub fn ver_id(&self) -> RegionVerId {
        RegionVerId {
            id: self.id,
            conf_ver: self.region_epoch.conf_ver,
            ver: self.region_epoch.version,
        }
    }

    /// Returns `true` if `key` falls inside `[start_key, end_key)`.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start_key.as_slice()
            && (self.end_key.is_empty() || key < self.end_key.as_slice())
    }

    /// Finds the peer of this region hosted on `store_id`.
    #[must_use]
    pub fn peer_on_store(&self, store_id: StoreId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.store_id == store_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
