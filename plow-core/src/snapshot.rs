//! # Snapshot
//!
//! Purpose: An immutable, point-in-time, value-copied projection of
//! [`crate::aggregator::StreamReport`], safe to read from any execution
//! context concurrently with ongoing aggregation.

use std::time::Duration;

use plow_common::ErrorKind;

/// Latency statistics computed from the cumulative histogram, never from
/// raw samples (spec.md sS4.3, "Quantiles come from the cumulative
/// histogram").
#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    pub min: Duration,
    pub mean: Duration,
    pub stdev: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p75: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub p999: Duration,
}

/// One point in the rolling-series view exposed to the printer/charts.
#[derive(Debug, Clone, Copy)]
pub struct SeriesPoint {
    pub index: u64,
    pub count: u64,
    pub errors: u64,
    pub min: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p99: Duration,
}

/// An immutable projection of the aggregator's state at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub elapsed: Duration,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rps: f64,
    pub error_rate: f64,
    pub latency: LatencyStats,
    /// `(status code, count)`, unordered; sorted by the renderer on demand.
    pub status_tally: Vec<(u16, u64)>,
    /// `(error tag, count)`, all eight tags present even when zero.
    pub error_tally: Vec<(ErrorKind, u64)>,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub series: Vec<SeriesPoint>,
    pub done: bool,
}

impl Snapshot {
    /// The top-N status codes by count, descending.
    pub fn top_status_codes(&self, n: usize) -> Vec<(u16, u64)> {
        let mut sorted = self.status_tally.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted.truncate(n);
        sorted
    }
}
