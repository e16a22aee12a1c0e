//! Collaborator contracts consumed by the region request sender.
//!
//! Defines the 4 services the sender talks to: `TopologyCache`,
//! `TransportClient`, `Backoffer`, and `ErrorReporter`. Implementations live
//! outside this crate; tests use recording fakes.

use std::time::Duration;

use async_trait::async_trait;
use regionkv_core::{Region, RegionError, RegionVerId, Request, Response, RpcContext, StoreId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backoff::BackoffKind;
use crate::error::TransportError;

// ---------------------------------------------------------------------------
// TopologyCache
// ---------------------------------------------------------------------------

/// Process-wide region-to-store routing cache.
///
/// Shared by every concurrent send, so implementations synchronize
/// internally. Concurrent leader updates for the same region are
/// last-writer-wins.
#[async_trait]
pub trait TopologyCache: Send + Sync {
    /// Resolves the current routing context for `region`.
    ///
    /// Returns `Ok(None)` when the cache has no entry for the region, which
    /// means the handle is outdated and the region has been cleaned up.
    async fn get_rpc_context(
        &self,
        bo: &mut dyn Backoffer,
        region: &RegionVerId,
    ) -> anyhow::Result<Option<RpcContext>>;

    /// Signals that an attempt through `ctx` failed at the transport level.
    fn on_request_fail(&self, ctx: &RpcContext);

    /// Records `store_id` as the leader of `region`.
    fn update_leader(&self, region: &RegionVerId, store_id: StoreId);

    /// Evicts every cached route that points at `store_id`.
    fn clear_store_by_id(&self, store_id: StoreId);

    /// Replaces the stale entry behind `ctx` with the descriptors reported
    /// by the store.
    async fn on_region_stale(
        &self,
        ctx: &RpcContext,
        new_regions: Vec<Region>,
    ) -> anyhow::Result<()>;

    /// Drops the cached entry for `region` so the next use re-resolves it.
    fn drop_region(&self, region: &RegionVerId);
}

// ---------------------------------------------------------------------------
// TransportClient
// ---------------------------------------------------------------------------

/// Deadline used when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Bounded sub-context of a single send attempt.
///
/// `cancel` is a child of the caller's retry context token, so cancelling
/// the whole operation also cancels the attempt.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub cancel: CancellationToken,
    pub deadline: Instant,
}

impl CallContext {
    /// Derives an attempt context from `parent` that expires after `timeout`.
    ///
    /// Timeouts too large to represent (such as `Duration::MAX`) are clamped
    /// to a deadline decades away.
    #[must_use]
    pub fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            cancel: parent.child_token(),
            deadline: now.checked_add(timeout).unwrap_or(now + FAR_FUTURE),
        }
    }

    /// Time left before the attempt deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Performs the actual RPC against a store address.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Sends `req` to the store at `addr`.
    ///
    /// Must return `TransportError::Canceled` when the attempt was cancelled,
    /// and any other variant for faults worth retrying.
    async fn send_request(
        &self,
        ctx: &CallContext,
        addr: &str,
        req: &Request,
    ) -> Result<Response, TransportError>;
}

// ---------------------------------------------------------------------------
// Backoffer
// ---------------------------------------------------------------------------

/// Retry context of one logical operation.
///
/// Carries the cumulative backoff budget and the operation's cancellation
/// signal. Created once per operation by the caller, never per attempt.
#[async_trait]
pub trait Backoffer: Send {
    /// Cancellation signal of the whole operation.
    fn cancel_token(&self) -> &CancellationToken;

    /// Waits according to the policy for `kind`.
    ///
    /// `Ok` means try again. `Err` means stop: the budget is exhausted or
    /// the operation was cancelled while waiting.
    async fn backoff(&mut self, kind: BackoffKind, reason: anyhow::Error) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// ErrorReporter
// ---------------------------------------------------------------------------

/// Fire-and-forget sink for region errors seen by the sender.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, err: &RegionError);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn call_context_deadline_counts_down() {
        let parent = CancellationToken::new();
        let call = CallContext::new(&parent, Duration::from_millis(500));
        assert_eq!(call.remaining(), Duration::from_millis(500));

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(call.remaining(), Duration::from_millis(300));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(call.remaining(), Duration::ZERO);
    }

    #[test]
    fn unbounded_timeout_clamps_deadline() {
        let parent = CancellationToken::new();
        let call = CallContext::new(&parent, Duration::MAX);
        assert!(call.remaining() > Duration::from_secs(86_400 * 365));
        assert!(call.remaining() <= FAR_FUTURE);
    }

    #[test]
    fn parent_cancel_reaches_attempt() {
        let parent = CancellationToken::new();
        let call = CallContext::new(&parent, Duration::from_secs(1));
        assert!(!call.cancel.is_cancelled());
        parent.cancel();
        assert!(call.cancel.is_cancelled());
    }

    #[test]
    fn attempt_cancel_does_not_reach_parent() {
        let parent = CancellationToken::new();
        let call = CallContext::new(&parent, Duration::from_secs(1));
        call.cancel.cancel();
        assert!(!parent.is_cancelled());
    }
}
