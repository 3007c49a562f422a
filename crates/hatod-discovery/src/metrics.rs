//! Per-query performance metrics.
//!
//! Every top-level discovery operation returns this block alongside its
//! payload; it is a required output field, not optional instrumentation.
//! Callers use it to detect degraded-latency conditions and to see when a
//! result set was narrowed by per-merchant resolution failures.

use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SearchMetrics {
    pub query_time_ms: u64,
    /// Candidate rows inspected before distance filtering.
    pub scanned: usize,
    /// Rows that survived distance (and zone) filtering.
    pub matched: usize,
    /// Identifier of the distance strategy that produced the result.
    pub strategy: &'static str,
}

impl SearchMetrics {
    #[must_use]
    pub fn since(started: Instant, scanned: usize, matched: usize, strategy: &'static str) -> Self {
        Self {
            query_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            scanned,
            matched,
            strategy,
        }
    }
}
