//! `RegionKV` Client — delivers requests to region leaders, retrying through
//! leader changes, store failures, and topology churn.

pub mod backoff;
pub mod config;
pub mod error;
pub mod region_request;
pub mod reporter;
pub mod traits;

pub use backoff::BackoffKind;
pub use config::SenderConfig;
pub use error::{SendError, TransportError};
pub use region_request::{RegionRequestSender, SendOutcome};
pub use reporter::{MetricsErrorReporter, NoopErrorReporter};
pub use traits::{Backoffer, CallContext, ErrorReporter, TopologyCache, TransportClient};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
