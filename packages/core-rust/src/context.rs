use std::fmt;

use serde::{Deserialize, Serialize};

use crate::region::{Peer, Region, RegionEpoch, RegionVerId, StoreId};

/// Per-request routing metadata stamped onto a request before it is sent.
/// The serving store checks it against its own view of the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KvContext {
    /// Region the request is addressed to.
    pub region_id: u64,
    /// Epoch the client believes the region is at.
    pub region_epoch: RegionEpoch,
    /// Peer the client believes is the leader.
    pub peer: Peer,
}

impl fmt::Display for KvContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "region_id:{} region_epoch:<conf_ver:{} version:{}> peer:<id:{} store_id:{}>",
            self.region_id,
            self.region_epoch.conf_ver,
            self.region_epoch.version,
            self.peer.id,
            self.peer.store_id
        )
    }
}

/// Resolved answer to "where is this region's leader right now".
///
/// Produced fresh by the topology cache for a single send attempt and
/// never reused once the cache has been told the attempt went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcContext {
    /// Version handle the context was resolved for.
    pub region: RegionVerId,
    /// Region descriptor as known to the cache at resolution time.
    pub meta: Region,
    /// Peer believed to be the leader.
    pub peer: Peer,
    /// Network address of the peer's store.
    pub addr: String,
}

impl RpcContext {
    /// Builds the routing metadata to stamp onto the request.
    #[must_use]
    pub fn kv_context(&self) -> KvContext {
        KvContext {
            region_id: self.meta.id,
            region_epoch: self.meta.region_epoch,
            peer: self.peer,
        }
    }

    /// Store the request will be sent to.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.peer.store_id
    }
}

impl fmt::Display for RpcContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "region {}, {}, addr: {}",
            self.region, self.peer, self.addr
        )
    }
}
