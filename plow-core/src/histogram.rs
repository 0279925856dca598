//! # Latency Histogram
//!
//! Purpose: A fixed-bucket, logarithmically-spaced histogram that records a
//! latency observation in O(1) and extracts an approximate quantile in
//! O(log buckets), bounded relative error, bounded memory regardless of how
//! many billions of requests are recorded.
//!
//! ## Design Principles
//! 1. **Fixed Buckets**: Edges are computed once at construction; `record`
//!    never allocates.
//! 2. **Bounded Precision**: Relative quantile error is at most ~1% at this
//!    bucket density -- acceptable because total request counts can reach
//!    billions and raw-sample storage would not fit in memory.
//! 3. **Single-Owner, No Atomics**: The histogram lives inside the
//!    Aggregator, which is the sole mutator (see `aggregator.rs`), so plain
//!    `u64` counters are correct and cheaper than the atomic counters a
//!    multi-writer histogram would need.
//! 4. **Bucket Lookup by Binary Search**: edges are sorted, so `record`
//!    finds its bucket with `partition_point` rather than a linear scan.

use std::time::Duration;

/// Smallest representable latency: 1 microsecond.
const MIN_NS: u64 = 1_000;
/// Largest representable latency: 60 seconds. Anything beyond clamps here.
const MAX_NS: u64 = 60_000_000_000;
/// Bucket count chosen so adjacent-edge ratio is ~1.01, keeping relative
/// quantile error under ~1% as required by spec.md sS4.1.
const BUCKET_COUNT: usize = 1800;

/// Quantiles the aggregator is required to expose (spec.md sS3 Snapshot).
pub const REPORTED_QUANTILES: [f64; 6] = [0.5, 0.75, 0.9, 0.95, 0.99, 0.999];

/// Fixed-bucket logarithmic latency histogram.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    /// Upper bound (nanoseconds) of each bucket, ascending. Bucket `i`
    /// covers the half-open range `(edges[i-1], edges[i]]` (bucket 0 starts
    /// at 0).
    edges_ns: Vec<u64>,
    /// Per-bucket observation counts; `counts[i]` pairs with `edges_ns[i]`.
    counts: Vec<u64>,
    samples: u64,
    sum_ns: u128,
}

impl LatencyHistogram {
    /// Builds a histogram with the default 1us..60s logarithmic layout.
    pub fn new() -> Self {
        let ratio = (MAX_NS as f64 / MIN_NS as f64).powf(1.0 / (BUCKET_COUNT - 1) as f64);
        let mut edges_ns = Vec::with_capacity(BUCKET_COUNT);
        for i in 0..BUCKET_COUNT {
            let edge = (MIN_NS as f64 * ratio.powi(i as i32)).round() as u64;
            edges_ns.push(edge);
        }
        // Force exact bounds and strict monotonicity after rounding.
        edges_ns[0] = edges_ns[0].max(1);
        for i in 1..edges_ns.len() {
            if edges_ns[i] <= edges_ns[i - 1] {
                edges_ns[i] = edges_ns[i - 1] + 1;
            }
        }
        *edges_ns.last_mut().unwrap() = MAX_NS.max(*edges_ns.last().unwrap());

        LatencyHistogram {
            counts: vec![0; edges_ns.len()],
            edges_ns,
            samples: 0,
            sum_ns: 0,
        }
    }

    /// Bucket index for a latency, clamping anything beyond the last edge
    /// into the overflow (final) bucket.
    fn bucket_index(&self, latency: Duration) -> usize {
        let ns = (latency.as_nanos().min(u128::from(u64::MAX))) as u64;
        let idx = self.edges_ns.partition_point(|&edge| edge < ns);
        idx.min(self.edges_ns.len() - 1)
    }

    /// Records one observation. Out-of-range values clamp to the last
    /// bucket rather than being dropped.
    pub fn record(&mut self, latency: Duration) {
        let idx = self.bucket_index(latency);
        self.counts[idx] += 1;
        self.samples += 1;
        self.sum_ns += latency.as_nanos();
    }

    /// Total recorded observations.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Returns the upper bound of the bucket containing the q-th cumulative
    /// count, for `q` in `(0, 1]`. Returns `Duration::ZERO` when empty.
    pub fn quantile(&self, q: f64) -> Duration {
        if self.samples == 0 {
            return Duration::ZERO;
        }
        let target = ((q * self.samples as f64).ceil() as u64).max(1).min(self.samples);
        let mut cumulative = 0u64;
        for (idx, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return Duration::from_nanos(self.edges_ns[idx]);
            }
        }
        Duration::from_nanos(*self.edges_ns.last().unwrap())
    }

    /// Adds another histogram's buckets into this one. Both histograms must
    /// share the default layout (the only layout this type produces).
    pub fn merge(&mut self, other: &LatencyHistogram) {
        debug_assert_eq!(self.edges_ns, other.edges_ns, "bucket layouts must match");
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        self.samples += other.samples;
        self.sum_ns += other.sum_ns;
    }

    /// Mean latency across all recorded samples, or zero if empty.
    pub fn mean(&self) -> Duration {
        if self.samples == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((self.sum_ns / self.samples as u128) as u64)
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram_quantiles_are_zero() {
        let hist = LatencyHistogram::new();
        assert_eq!(hist.quantile(0.5), Duration::ZERO);
        assert_eq!(hist.samples(), 0);
    }

    #[test]
    fn fixed_latency_has_tight_p99() {
        let mut hist = LatencyHistogram::new();
        for _ in 0..100 {
            hist.record(Duration::from_millis(10));
        }
        assert_eq!(hist.samples(), 100);
        let p99 = hist.quantile(0.99);
        assert!(p99 >= Duration::from_millis(10));
        assert!(p99 <= Duration::from_millis(12), "p99 = {p99:?}");
    }

    #[test]
    fn out_of_range_clamps_to_last_bucket() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::from_secs(3600));
        assert_eq!(hist.quantile(1.0), Duration::from_nanos(MAX_NS));
    }

    #[test]
    fn merge_is_associative_and_commutative() {
        let mut a = LatencyHistogram::new();
        let mut b = LatencyHistogram::new();
        for i in 0..50u64 {
            a.record(Duration::from_micros(100 + i));
        }
        for i in 0..50u64 {
            b.record(Duration::from_micros(200 + i));
        }

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab.counts, ba.counts);
        assert_eq!(ab.samples(), 100);
        assert_eq!(ab.samples(), ba.samples());
    }

    #[test]
    fn quantiles_are_monotonic() {
        let mut hist = LatencyHistogram::new();
        let mut rng_state = 0x1234_5678u64;
        for _ in 0..5000 {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;
            let micros = 10 + (rng_state % 50_000);
            hist.record(Duration::from_micros(micros));
        }
        let p50 = hist.quantile(0.5);
        let p90 = hist.quantile(0.9);
        let p99 = hist.quantile(0.99);
        let p999 = hist.quantile(0.999);
        assert!(p50 <= p90, "{p50:?} <= {p90:?}");
        assert!(p90 <= p99, "{p90:?} <= {p99:?}");
        assert!(p99 <= p999, "{p99:?} <= {p999:?}");
    }
}
