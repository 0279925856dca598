//! # Aggregator (StreamReport)
//!
//! Purpose: The single-consumer owner of all rollup state. Drains the
//! Recorder, updates counters/histogram/rolling-series/tallies in place,
//! and publishes immutable [`Snapshot`]s that are safe to read from any
//! other execution context.
//!
//! ## Design Principles
//! 1. **Single Owner, No Locks on the Hot Path**: `StreamReport` is mutated
//!    by exactly one task; there is nothing to lock.
//! 2. **Seq-Lock-Style Publication**: Snapshots are published through a
//!    `tokio::sync::watch` channel -- readers clone the latest value
//!    without ever blocking the aggregator task (spec.md sS4.3).
//! 3. **Sum-of-Squares, Not Welford**: Mean/stdev are derived from running
//!    sum and sum-of-squares so merging and snapshotting stay constant-time
//!    value copies.

use std::collections::HashMap;
use std::time::Duration;

use plow_common::{ErrorKind, RequestOutcome};

use crate::clock::Clock;
use crate::histogram::{LatencyHistogram, REPORTED_QUANTILES};
use crate::recorder::RecorderReceiver;
use crate::rolling::RollingSeries;
use crate::snapshot::{LatencyStats, SeriesPoint, Snapshot};

/// Exclusively-owned rollup state. Only the Aggregator task touches this.
struct StreamReport {
    clock: Clock,
    total: u64,
    succeeded: u64,
    failed: u64,
    histogram: LatencyHistogram,
    /// Latencies of failed attempts, kept separate from the success
    /// histogram per spec.md sS4.3 ("does NOT enter the success histogram").
    error_latency: LatencyHistogram,
    min: Duration,
    max: Duration,
    sum_ns: u128,
    sum_sq_ns: f64,
    status_tally: HashMap<u16, u64>,
    error_tally: [u64; ErrorKind::ALL.len()],
    bytes_in: u64,
    bytes_out: u64,
    rolling: RollingSeries,
    done_at: Option<Duration>,
}

impl StreamReport {
    fn new(clock: Clock, interval: Duration, rolling_capacity: usize) -> Self {
        StreamReport {
            clock,
            total: 0,
            succeeded: 0,
            failed: 0,
            histogram: LatencyHistogram::new(),
            error_latency: LatencyHistogram::new(),
            min: Duration::MAX,
            max: Duration::ZERO,
            sum_ns: 0,
            sum_sq_ns: 0.0,
            status_tally: HashMap::new(),
            error_tally: [0; ErrorKind::ALL.len()],
            bytes_in: 0,
            bytes_out: 0,
            rolling: RollingSeries::new(interval, rolling_capacity),
            done_at: None,
        }
    }

    /// Applies the update rules from spec.md sS4.3 for one outcome.
    fn apply(&mut self, outcome: RequestOutcome) {
        let elapsed = self.clock.elapsed();
        self.total += 1;
        self.bytes_in += outcome.bytes_read;
        self.bytes_out += outcome.bytes_written;

        if outcome.is_success() {
            self.succeeded += 1;
            self.histogram.record(outcome.latency);
            self.min = self.min.min(outcome.latency);
            self.max = self.max.max(outcome.latency);
            self.sum_ns += outcome.latency.as_nanos();
            let ns = outcome.latency.as_nanos() as f64;
            self.sum_sq_ns += ns * ns;
            *self.status_tally.entry(outcome.status).or_insert(0) += 1;
            self.rolling.record(elapsed, true, outcome.latency);
        } else {
            self.failed += 1;
            let kind = outcome.err.expect("failure outcome carries an ErrorKind");
            self.error_tally[kind.index()] += 1;
            self.error_latency.record(outcome.latency);
            self.rolling.record(elapsed, false, outcome.latency);
        }
    }

    fn mark_done(&mut self) {
        self.done_at = Some(self.clock.elapsed());
    }

    fn mean(&self) -> Duration {
        if self.succeeded == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((self.sum_ns / self.succeeded as u128) as u64)
    }

    fn stdev(&self) -> Duration {
        if self.succeeded == 0 {
            return Duration::ZERO;
        }
        let n = self.succeeded as f64;
        let mean_ns = self.sum_ns as f64 / n;
        let variance = (self.sum_sq_ns / n - mean_ns * mean_ns).max(0.0);
        Duration::from_nanos(variance.sqrt() as u64)
    }

    /// Quantile clamped to the tracked exact maximum, so `p99 <= max` always
    /// holds even though the histogram itself reports a bucket's upper
    /// bound rather than the true observed value (spec.md sS8, invariant 5).
    fn clamped_quantile(&self, q: f64) -> Duration {
        self.histogram.quantile(q).min(self.effective_max())
    }

    fn effective_max(&self) -> Duration {
        if self.succeeded == 0 {
            Duration::ZERO
        } else {
            self.max
        }
    }

    fn effective_min(&self) -> Duration {
        if self.succeeded == 0 {
            Duration::ZERO
        } else {
            self.min
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        let elapsed = self.done_at.unwrap_or_else(|| self.clock.elapsed());
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        let latency = LatencyStats {
            min: self.effective_min(),
            mean: self.mean(),
            stdev: self.stdev(),
            max: self.effective_max(),
            p50: self.clamped_quantile(REPORTED_QUANTILES[0]),
            p75: self.clamped_quantile(REPORTED_QUANTILES[1]),
            p90: self.clamped_quantile(REPORTED_QUANTILES[2]),
            p95: self.clamped_quantile(REPORTED_QUANTILES[3]),
            p99: self.clamped_quantile(REPORTED_QUANTILES[4]),
            p999: self.clamped_quantile(REPORTED_QUANTILES[5]),
        };

        let series = self
            .rolling
            .buckets()
            .map(|(index, bucket)| SeriesPoint {
                index,
                count: bucket.count,
                errors: bucket.errors,
                min: if bucket.count > bucket.errors {
                    bucket.min
                } else {
                    Duration::ZERO
                },
                max: bucket.max,
                p50: bucket.sketch.quantile(0.5),
                p99: bucket.sketch.quantile(0.99),
            })
            .collect();

        Snapshot {
            elapsed,
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            rps: self.total as f64 / secs,
            error_rate: if self.total == 0 {
                0.0
            } else {
                self.failed as f64 / self.total as f64
            },
            latency,
            status_tally: self.status_tally.iter().map(|(&k, &v)| (k, v)).collect(),
            error_tally: ErrorKind::ALL
                .iter()
                .map(|&kind| (kind, self.error_tally[kind.index()]))
                .collect(),
            bytes_in: self.bytes_in,
            bytes_out: self.bytes_out,
            series,
            done: self.done_at.is_some(),
        }
    }
}

/// Handle to a running Aggregator. Cheap to clone; every clone reads the
/// same published state.
#[derive(Clone)]
pub struct AggregatorHandle {
    snapshots: tokio::sync::watch::Receiver<Snapshot>,
}

impl AggregatorHandle {
    /// Produces a Snapshot. Safe to call from any execution context at any
    /// time; never blocks the aggregator task.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// True once the aggregator has drained the Recorder and finalized.
    pub fn is_done(&self) -> bool {
        self.snapshots.borrow().done
    }

    /// Resolves once a snapshot with `done == true` has been published.
    pub async fn wait_done(&mut self) {
        loop {
            if self.snapshots.borrow().done {
                return;
            }
            if self.snapshots.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Spawns the Aggregator task and returns a handle to it.
///
/// Consumes `receiver` until the Recorder closes (every `RecorderSender`
/// dropped and the queue drained), then publishes one final snapshot with
/// `done = true`.
pub fn spawn(
    mut receiver: RecorderReceiver,
    clock: Clock,
    interval: Duration,
    rolling_capacity: usize,
) -> AggregatorHandle {
    let mut report = StreamReport::new(clock, interval, rolling_capacity);
    let (tx, rx) = tokio::sync::watch::channel(report.to_snapshot());

    tokio::spawn(async move {
        // TODO: batch-publish every N outcomes instead of per-outcome once
        // this needs million-rps headroom; per-outcome publication is
        // simplest and is what the boundary-scenario tests exercise.
        while let Some(outcome) = receiver.recv().await {
            report.apply(outcome);
            let _ = tx.send(report.to_snapshot());
        }
        report.mark_done();
        let _ = tx.send(report.to_snapshot());
    });

    AggregatorHandle { snapshots: rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder;
    use plow_common::RequestOutcome;
    use std::time::Duration;

    fn outcome_ok(status: u16, latency_ms: u64) -> RequestOutcome {
        RequestOutcome::success(Duration::from_millis(latency_ms), status, 10, 20)
    }

    fn outcome_err(kind: ErrorKind) -> RequestOutcome {
        RequestOutcome::failure(Duration::from_millis(1), kind, 10, 0)
    }

    #[tokio::test]
    async fn zero_outcomes_still_reaches_done() {
        let (tx, rx) = recorder::channel(8);
        let handle = spawn(rx, Clock::start(), Duration::from_millis(200), 64);
        drop(tx);
        let mut handle = handle;
        handle.wait_done().await;
        let snap = handle.snapshot();
        assert_eq!(snap.total, 0);
        assert!(snap.done);
    }

    #[tokio::test]
    async fn invariants_hold_after_mixed_outcomes() {
        let (tx, rx) = recorder::channel(64);
        let handle = spawn(rx, Clock::start(), Duration::from_millis(100), 64);

        for _ in 0..25 {
            tx.send(outcome_ok(200, 10)).await;
        }
        for _ in 0..25 {
            tx.send(outcome_ok(500, 10)).await;
        }
        for _ in 0..25 {
            tx.send(outcome_err(ErrorKind::Timeout)).await;
        }
        drop(tx);

        let mut handle = handle;
        handle.wait_done().await;
        let snap = handle.snapshot();

        assert_eq!(snap.total, snap.succeeded + snap.failed);
        assert_eq!(snap.total, 75);
        assert_eq!(snap.succeeded, 50);
        assert_eq!(snap.failed, 25);

        let status_sum: u64 = snap.status_tally.iter().map(|(_, c)| c).sum();
        assert_eq!(status_sum, snap.succeeded);

        let error_sum: u64 = snap.error_tally.iter().map(|(_, c)| c).sum();
        assert_eq!(error_sum, snap.failed);

        assert!(snap.latency.min <= snap.latency.mean);
        assert!(snap.latency.mean <= snap.latency.max);
        assert!(snap.latency.p50 <= snap.latency.p90);
        assert!(snap.latency.p90 <= snap.latency.p99);
        assert!(snap.latency.p99 <= snap.latency.max);
    }
}
