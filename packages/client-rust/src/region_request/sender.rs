//! Region request sender: resolve, transmit, classify, and retry.
//!
//! One `send` call delivers one request to the leader of one region. Leader
//! changes, unavailable stores, busy stores and stale commands are absorbed
//! here by retrying. Errors that change the shape of the request (stale
//! epoch, unknown region errors) are handed back inside the response so the
//! caller can re-split it against the refreshed topology.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use regionkv_core::{RegionError, RegionVerId, Request, Response, RpcContext};
use tracing::{debug, warn, Instrument};

use super::classify::{decide, Decision};
use crate::backoff::BackoffKind;
use crate::config::SenderConfig;
use crate::error::{SendError, TransportError};
use crate::reporter::MetricsErrorReporter;
use crate::traits::{Backoffer, CallContext, ErrorReporter, TopologyCache, TransportClient};

// ---------------------------------------------------------------------------
// Loop states
// ---------------------------------------------------------------------------

/// Result of one transmission.
enum Transmit {
    Response(Response),
    Retry,
}

/// Result of handling a region error.
enum Step {
    Retry,
    Terminal,
    Fatal(SendError),
}

/// Successful outcome of a send, with diagnostics about how it got there.
#[derive(Debug)]
pub struct SendOutcome {
    /// Final response. May still carry a region error the caller must act on.
    pub response: Response,
    /// Address of the store the last attempt went to. `None` if no attempt
    /// reached the transport.
    pub store_addr: Option<String>,
    /// Number of resolve-and-send iterations.
    pub attempts: u32,
}

// ---------------------------------------------------------------------------
// RegionRequestSender
// ---------------------------------------------------------------------------

/// Sends requests to the leader of a region, retrying through topology churn.
///
/// Holds no per-call state, so one sender can be cloned and shared across
/// any number of concurrent calls.
#[derive(Clone)]
pub struct RegionRequestSender {
    cache: Arc<dyn TopologyCache>,
    client: Arc<dyn TransportClient>,
    reporter: Arc<dyn ErrorReporter>,
    config: Arc<SenderConfig>,
}

impl RegionRequestSender {
    /// Creates a sender that reports region errors as metrics.
    #[must_use]
    pub fn new(cache: Arc<dyn TopologyCache>, client: Arc<dyn TransportClient>) -> Self {
        Self {
            cache,
            client,
            reporter: Arc::new(MetricsErrorReporter),
            config: Arc::new(SenderConfig::default()),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SenderConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Sends `req` to the leader of `region`.
    ///
    /// On `Ok`, the response either carries no region error (success) or a
    /// region error the caller must handle by re-deriving the request.
    ///
    /// # Errors
    ///
    /// Returns `SendError` when resolution fails, the operation is cancelled,
    /// the backoff budget runs out, the response is malformed, the request is
    /// too large to replicate, or refreshing a stale region fails.
    pub async fn send(
        &self,
        bo: &mut dyn Backoffer,
        req: &mut Request,
        region: RegionVerId,
        timeout: Duration,
    ) -> Result<Response, SendError> {
        self.send_detailed(bo, req, region, timeout)
            .await
            .map(|outcome| outcome.response)
    }

    /// Like [`send`](Self::send), using the configured short timeout.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_default(
        &self,
        bo: &mut dyn Backoffer,
        req: &mut Request,
        region: RegionVerId,
    ) -> Result<Response, SendError> {
        let timeout = self.config.read_timeout_short();
        self.send(bo, req, region, timeout).await
    }

    /// Like [`send`](Self::send), also returning the last store address and
    /// the number of attempts.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_detailed(
        &self,
        bo: &mut dyn Backoffer,
        req: &mut Request,
        region: RegionVerId,
        timeout: Duration,
    ) -> Result<SendOutcome, SendError> {
        let span = tracing::debug_span!(
            "region_request",
            region = %region,
            cmd = %req.cmd_type(),
        );
        self.send_loop(bo, req, region, timeout)
            .instrument(span)
            .await
    }

    async fn send_loop(
        &self,
        bo: &mut dyn Backoffer,
        req: &mut Request,
        region: RegionVerId,
        timeout: Duration,
    ) -> Result<SendOutcome, SendError> {
        let mut attempts = 0;
        let mut store_addr = None;

        loop {
            attempts += 1;

            let ctx = self
                .cache
                .get_rpc_context(bo, &region)
                .await
                .map_err(|source| SendError::Resolve { region, source })?;

            let Some(ctx) = ctx else {
                // A missing entry means the handle is outdated and the region
                // was cleaned up. Retrying without new topology cannot help.
                debug!(region = %region, "region not in cache, returning stale epoch");
                return Ok(SendOutcome {
                    response: Response::region_error_for(req, RegionError::stale_epoch()),
                    store_addr,
                    attempts,
                });
            };

            store_addr = Some(ctx.addr.clone());

            let resp = match self.send_to_region(bo, &ctx, req, timeout).await? {
                Transmit::Response(resp) => resp,
                Transmit::Retry => continue,
            };

            let region_err = match resp.region_error() {
                Ok(err) => err.cloned(),
                Err(source) => {
                    return Err(SendError::MalformedResponse {
                        ctx: Box::new(ctx),
                        source,
                    })
                }
            };

            if let Some(region_err) = region_err {
                match self.on_region_error(bo, &ctx, &region_err).await {
                    Step::Retry => continue,
                    Step::Terminal => {}
                    Step::Fatal(err) => return Err(err),
                }
            }

            return Ok(SendOutcome {
                response: resp,
                store_addr,
                attempts,
            });
        }
    }

    async fn send_to_region(
        &self,
        bo: &mut dyn Backoffer,
        ctx: &RpcContext,
        req: &mut Request,
        timeout: Duration,
    ) -> Result<Transmit, SendError> {
        req.set_context(ctx.kv_context());

        let parent = bo.cancel_token().clone();
        let call = CallContext::new(&parent, timeout);
        let result = {
            // Cancels the attempt context on every exit path.
            let _guard = call.cancel.clone().drop_guard();
            tokio::select! {
                biased;
                () = parent.cancelled() => Err(TransportError::Canceled),
                res = tokio::time::timeout(timeout, self.client.send_request(&call, &ctx.addr, req)) => {
                    res.unwrap_or_else(|_elapsed| {
                        Err(TransportError::Timeout {
                            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                        })
                    })
                }
            }
        };

        match result {
            Ok(resp) => Ok(Transmit::Response(resp)),
            Err(err) => {
                // A transport that noticed the parent cancellation may report
                // it as a generic failure; cancellation still wins.
                let err = if parent.is_cancelled() {
                    TransportError::Canceled
                } else {
                    err
                };
                self.on_send_fail(bo, ctx, err).await?;
                Ok(Transmit::Retry)
            }
        }
    }

    async fn on_send_fail(
        &self,
        bo: &mut dyn Backoffer,
        ctx: &RpcContext,
        err: TransportError,
    ) -> Result<(), SendError> {
        if err.is_canceled() {
            return Err(SendError::Canceled {
                ctx: Box::new(ctx.clone()),
                source: err,
            });
        }

        self.cache.on_request_fail(ctx);

        warn!(ctx = %ctx, error = %err, "send request failed, try next peer later");
        let reason = anyhow!(
            "send request error: {err}, ctx: {}, try next peer later",
            ctx.kv_context()
        );
        match bo.backoff(BackoffKind::StoreRpc, reason).await {
            Ok(()) => Ok(()),
            Err(source) => Err(backoff_failed(&*bo, BackoffKind::StoreRpc, ctx, source)),
        }
    }

    async fn on_region_error(
        &self,
        bo: &mut dyn Backoffer,
        ctx: &RpcContext,
        err: &RegionError,
    ) -> Step {
        self.reporter.report(err);

        match decide(err) {
            Decision::UpdateLeader { store_id } => {
                debug!(ctx = %ctx, error = %err, "store reports `NotLeader`, retry later");
                self.cache.update_leader(&ctx.region, store_id);
                Step::Retry
            }
            Decision::Backoff(kind) => {
                if kind == BackoffKind::ServerBusy {
                    warn!(ctx = %ctx, error = %err, "store reports `ServerIsBusy`, retry later");
                } else {
                    debug!(ctx = %ctx, error = %err, "store reports region error, retry later");
                }
                match bo.backoff(kind, anyhow!("{err}, ctx: {ctx}")).await {
                    Ok(()) => Step::Retry,
                    Err(source) => Step::Fatal(backoff_failed(&*bo, kind, ctx, source)),
                }
            }
            Decision::ClearStore => {
                warn!(ctx = %ctx, error = %err, "store reports `StoreNotMatch`, retry later");
                self.cache.clear_store_by_id(ctx.store_id());
                Step::Retry
            }
            Decision::RefreshTopology { new_regions } => {
                debug!(ctx = %ctx, error = %err, "store reports `StaleEpoch`");
                match self.cache.on_region_stale(ctx, new_regions.to_vec()).await {
                    Ok(()) => Step::Terminal,
                    Err(source) => Step::Fatal(SendError::StaleTopology {
                        ctx: Box::new(ctx.clone()),
                        source,
                    }),
                }
            }
            Decision::RetryNow => {
                debug!(ctx = %ctx, "store reports `StaleCommand`");
                Step::Retry
            }
            Decision::Fail => {
                warn!(ctx = %ctx, error = %err, "store reports `RaftEntryTooLarge`");
                Step::Fatal(SendError::RaftEntryTooLarge {
                    ctx: Box::new(ctx.clone()),
                    description: err.to_string(),
                })
            }
            Decision::DropRegion => {
                // The region range may have changed; the caller re-splits.
                debug!(ctx = %ctx, error = %err, "store reports region error");
                self.cache.drop_region(&ctx.region);
                Step::Terminal
            }
        }
    }
}

/// Wraps a backoff refusal. A refusal caused by cancelling the retry context
/// is reported as cancellation.
fn backoff_failed(
    bo: &dyn Backoffer,
    kind: BackoffKind,
    ctx: &RpcContext,
    source: anyhow::Error,
) -> SendError {
    let ctx = Box::new(ctx.clone());
    if bo.cancel_token().is_cancelled() {
        SendError::BackoffCanceled { kind, ctx, source }
    } else {
        SendError::Backoff { kind, ctx, source }
    }
}

impl std::fmt::Debug for RegionRequestSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionRequestSender")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
