//! Region request sending.
//!
//! - [`classify`]: region error decision table
//! - [`sender`]: the resolve / transmit / classify retry loop

pub(crate) mod classify;
pub mod sender;

pub use sender::{RegionRequestSender, SendOutcome};

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
