//! `RegionKV` Core — region topology, region errors, and RPC envelopes.

pub mod context;
pub mod region;
pub mod region_error;
pub mod rpc;

pub use context::{KvContext, RpcContext};
pub use region::{Peer, Region, RegionEpoch, RegionVerId, StoreId};
pub use region_error::RegionError;
pub use rpc::{CmdType, Command, EnvelopeError, Request, Response, ResponseBody};
