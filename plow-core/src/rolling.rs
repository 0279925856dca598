//! # Rolling Series
//!
//! Purpose: Contiguous per-interval aggregates used for charting and the
//! terminal's live view. Fixed capacity ring buffer; the oldest interval is
//! overwritten once the series grows past it.
//!
//! ## Design Principles
//! 1. **Fixed Capacity**: Bounded memory regardless of run length -- a run
//!    lasting longer than `capacity * interval_width` simply drops its
//!    oldest buckets, matching a live chart's visible window.
//! 2. **Compact Per-Bucket Sketch**: Each bucket carries a coarse histogram,
//!    not raw samples, mirroring the default bucket boundaries the teacher
//!    server used for its own metrics (see `CompactSketch`).
//! 3. **Monotonic Advancement**: The "current" interval index only moves
//!    forward; idle gaps are filled with empty buckets so the series stays
//!    contiguous (spec.md sS4.3, "Rolling interval management").

use std::time::Duration;

/// Default ring buffer capacity: the last hour of one-second intervals.
pub const DEFAULT_CAPACITY: usize = 3600;

/// Coarse latency bucket boundaries in microseconds, one order of magnitude
/// wider than the teacher's own default (1us..60s instead of 1us..5ms) so a
/// per-interval bucket still reflects the full latency range this tool can
/// see, while staying small enough to carry per-interval.
const COMPACT_BOUNDS_US: [u64; 16] = [
    100, 300, 1_000, 3_000, 10_000, 30_000, 100_000, 300_000, 1_000_000, 3_000_000, 10_000_000,
    20_000_000, 30_000_000, 40_000_000, 50_000_000, 60_000_000,
];

/// A small fixed-bucket histogram carried per rolling-series interval.
///
/// Linear bucket scan is fine here: the list is 17 entries and stays hot in
/// cache, same tradeoff the teacher's `LatencyHistogram::record` documented.
#[derive(Debug, Clone)]
pub struct CompactSketch {
    buckets: [u64; COMPACT_BOUNDS_US.len() + 1],
}

impl CompactSketch {
    fn new() -> Self {
        CompactSketch {
            buckets: [0; COMPACT_BOUNDS_US.len() + 1],
        }
    }

    fn record(&mut self, latency: Duration) {
        let micros = latency.as_micros().min(u128::from(u64::MAX)) as u64;
        for (idx, &bound) in COMPACT_BOUNDS_US.iter().enumerate() {
            if micros <= bound {
                self.buckets[idx] += 1;
                return;
            }
        }
        *self.buckets.last_mut().unwrap() += 1;
    }

    /// Approximate quantile within this one interval, for chart rendering.
    pub fn quantile(&self, q: f64) -> Duration {
        let total: u64 = self.buckets.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }
        let target = ((q * total as f64).ceil() as u64).max(1).min(total);
        let mut cumulative = 0u64;
        for (idx, &count) in self.buckets.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let bound_us = COMPACT_BOUNDS_US
                    .get(idx)
                    .copied()
                    .unwrap_or(*COMPACT_BOUNDS_US.last().unwrap());
                return Duration::from_micros(bound_us);
            }
        }
        Duration::from_micros(*COMPACT_BOUNDS_US.last().unwrap())
    }
}

/// One interval's worth of aggregated stats.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub count: u64,
    pub errors: u64,
    pub sum_latency: Duration,
    pub min: Duration,
    pub max: Duration,
    pub sketch: CompactSketch,
}

impl Bucket {
    fn empty() -> Self {
        Bucket {
            count: 0,
            errors: 0,
            sum_latency: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
            sketch: CompactSketch::new(),
        }
    }

    fn record_success(&mut self, latency: Duration) {
        self.count += 1;
        self.sum_latency += latency;
        self.min = self.min.min(latency);
        self.max = self.max.max(latency);
        self.sketch.record(latency);
    }

    fn record_error(&mut self) {
        self.count += 1;
        self.errors += 1;
    }
}

/// Fixed-capacity ring buffer of per-interval [`Bucket`]s.
#[derive(Debug, Clone)]
pub struct RollingSeries {
    interval_width: Duration,
    capacity: usize,
    /// Buckets in chronological order, oldest first. Never longer than
    /// `capacity`; indices here are *not* the same as the logical interval
    /// index once buckets have been evicted.
    buckets: std::collections::VecDeque<Bucket>,
    /// Logical index of the oldest bucket still in `buckets`.
    base_index: u64,
    /// Logical index of the newest (current) bucket.
    current_index: u64,
}

impl RollingSeries {
    pub fn new(interval_width: Duration, capacity: usize) -> Self {
        let mut buckets = std::collections::VecDeque::with_capacity(capacity);
        buckets.push_back(Bucket::empty());
        RollingSeries {
            interval_width,
            capacity,
            buckets,
            base_index: 0,
            current_index: 0,
        }
    }

    /// Advances the current interval to cover `elapsed_since_start`,
    /// inserting empty buckets for any gap, then records the outcome into
    /// the now-current bucket.
    pub fn record(&mut self, elapsed_since_start: Duration, success: bool, latency: Duration) {
        let target_index = if self.interval_width.is_zero() {
            0
        } else {
            (elapsed_since_start.as_secs_f64() / self.interval_width.as_secs_f64()).floor() as u64
        };
        self.advance_to(target_index);

        let bucket = self.buckets.back_mut().expect("at least one bucket");
        if success {
            bucket.record_success(latency);
        } else {
            bucket.record_error();
        }
    }

    fn advance_to(&mut self, target_index: u64) {
        if target_index <= self.current_index {
            return;
        }
        let gap = target_index - self.current_index;
        for _ in 0..gap {
            if self.buckets.len() >= self.capacity {
                self.buckets.pop_front();
                self.base_index += 1;
            }
            self.buckets.push_back(Bucket::empty());
        }
        self.current_index = target_index;
    }

    /// The configured interval width.
    pub fn interval_width(&self) -> Duration {
        self.interval_width
    }

    /// A read-only chronological view of the buckets currently retained.
    pub fn buckets(&self) -> impl Iterator<Item = (u64, &Bucket)> {
        self.buckets
            .iter()
            .enumerate()
            .map(move |(offset, bucket)| (self.base_index + offset as u64, bucket))
    }

    /// Number of buckets currently retained (<= capacity).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_gaps_produce_contiguous_empty_buckets() {
        let mut series = RollingSeries::new(Duration::from_millis(200), DEFAULT_CAPACITY);
        series.record(Duration::ZERO, true, Duration::from_millis(1));
        series.record(Duration::from_millis(800), true, Duration::from_millis(1));

        let indices: Vec<u64> = series.buckets().map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        let counts: Vec<u64> = series.buckets().map(|(_, b)| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn capacity_overwrites_oldest_bucket() {
        let mut series = RollingSeries::new(Duration::from_millis(1), 3);
        for i in 0..10u64 {
            series.record(Duration::from_millis(i), true, Duration::from_micros(5));
        }
        assert_eq!(series.len(), 3);
        let indices: Vec<u64> = series.buckets().map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![7, 8, 9]);
    }
}
