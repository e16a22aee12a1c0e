//! `ErrorReporter` implementations.
//!
//! - [`MetricsErrorReporter`]: counts region errors by kind via the `metrics` facade
//! - [`NoopErrorReporter`]: discards everything

use regionkv_core::RegionError;

use crate::traits::ErrorReporter;

/// Counter incremented once per region error, labelled with the error kind.
pub const REGION_ERRORS_TOTAL: &str = "regionkv_region_errors_total";

/// Reports region errors to whatever `metrics` recorder is installed.
///
/// Without an installed recorder the counter is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsErrorReporter;

impl ErrorReporter for MetricsErrorReporter {
    fn report(&self, err: &RegionError) {
        metrics::counter!(REGION_ERRORS_TOTAL, "type" => err.kind()).increment(1);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopErrorReporter;

impl ErrorReporter for NoopErrorReporter {
    fn report(&self, _err: &RegionError) {}
}
