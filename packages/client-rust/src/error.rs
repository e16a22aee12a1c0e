use regionkv_core::{EnvelopeError, RegionVerId, RpcContext};

use crate::backoff::BackoffKind;

/// Errors returned by a `TransportClient`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request canceled")]
    Canceled,
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("store {addr} unavailable: {reason}")]
    Unavailable { addr: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    /// Returns `true` for caller-initiated cancellation, which is never retried.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Fatal outcomes of `RegionRequestSender::send`.
///
/// Each variant names the region or routing context involved. Errors from
/// collaborators are kept intact as the `source`.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to resolve routing for {region}: {source}")]
    Resolve {
        region: RegionVerId,
        #[source]
        source: anyhow::Error,
    },
    #[error("request canceled, ctx: {ctx}")]
    Canceled {
        ctx: Box<RpcContext>,
        #[source]
        source: TransportError,
    },
    #[error("request canceled during {kind} backoff, ctx: {ctx}: {source}")]
    BackoffCanceled {
        kind: BackoffKind,
        ctx: Box<RpcContext>,
        #[source]
        source: anyhow::Error,
    },
    #[error("{kind} backoff stopped retrying, ctx: {ctx}: {source}")]
    Backoff {
        kind: BackoffKind,
        ctx: Box<RpcContext>,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed response, ctx: {ctx}: {source}")]
    MalformedResponse {
        ctx: Box<RpcContext>,
        #[source]
        source: EnvelopeError,
    },
    #[error("{description}, ctx: {ctx}")]
    RaftEntryTooLarge {
        ctx: Box<RpcContext>,
        description: String,
    },
    #[error("failed to refresh stale region, ctx: {ctx}: {source}")]
    StaleTopology {
        ctx: Box<RpcContext>,
        #[source]
        source: anyhow::Error,
    },
}

impl SendError {
    /// Returns `true` if the operation ended because it was cancelled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. } | Self::BackoffCanceled { .. })
    }

    /// Routing context of the attempt that failed, when one was resolved.
    #[must_use]
    pub fn rpc_context(&self) -> Option<&RpcContext> {
        match self {
            Self::Resolve { .. } => None,
            Self::Canceled { ctx, .. }
            | Self::BackoffCanceled { ctx, .. }
            | Self::Backoff { ctx, .. }
            | Self::MalformedResponse { ctx, .. }
            | Self::RaftEntryTooLarge { ctx, .. }
            | Self::StaleTopology { ctx, .. } => Some(ctx.as_ref()),
        }
    }
}
