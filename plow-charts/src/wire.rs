//! # Wire Protocol
//!
//! Purpose: JSON-shaped mirrors of [`plow_core::snapshot::Snapshot`] and its
//! nested types. Kept separate from the core types so the measurement
//! engine never carries a `serde` dependency on their layout, only on
//! `ErrorKind` (spec.md sS6, "Charts wire protocol shape").

use serde::Serialize;

use plow_common::ErrorKind;
use plow_core::snapshot::{LatencyStats, SeriesPoint, Snapshot};

#[derive(Debug, Serialize)]
pub struct LatencyStatsWire {
    pub min_us: u64,
    pub mean_us: u64,
    pub stdev_us: u64,
    pub max_us: u64,
    pub p50_us: u64,
    pub p75_us: u64,
    pub p90_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub p999_us: u64,
}

impl From<&LatencyStats> for LatencyStatsWire {
    fn from(stats: &LatencyStats) -> Self {
        LatencyStatsWire {
            min_us: stats.min.as_micros() as u64,
            mean_us: stats.mean.as_micros() as u64,
            stdev_us: stats.stdev.as_micros() as u64,
            max_us: stats.max.as_micros() as u64,
            p50_us: stats.p50.as_micros() as u64,
            p75_us: stats.p75.as_micros() as u64,
            p90_us: stats.p90.as_micros() as u64,
            p95_us: stats.p95.as_micros() as u64,
            p99_us: stats.p99.as_micros() as u64,
            p999_us: stats.p999.as_micros() as u64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesPointWire {
    pub t: u64,
    pub count: u64,
    pub errors: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
}

impl From<&SeriesPoint> for SeriesPointWire {
    fn from(point: &SeriesPoint) -> Self {
        SeriesPointWire {
            t: point.index,
            count: point.count,
            errors: point.errors,
            min_us: point.min.as_micros() as u64,
            max_us: point.max.as_micros() as u64,
            p50_us: point.p50.as_micros() as u64,
            p99_us: point.p99.as_micros() as u64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SnapshotWire {
    pub elapsed_ms: u64,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rps: f64,
    pub error_rate: f64,
    pub latency: LatencyStatsWire,
    pub status_tally: Vec<(u16, u64)>,
    pub error_tally: Vec<(ErrorKind, u64)>,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub done: bool,
}

impl From<&Snapshot> for SnapshotWire {
    fn from(snapshot: &Snapshot) -> Self {
        SnapshotWire {
            elapsed_ms: snapshot.elapsed.as_millis() as u64,
            total: snapshot.total,
            succeeded: snapshot.succeeded,
            failed: snapshot.failed,
            rps: snapshot.rps,
            error_rate: snapshot.error_rate,
            latency: LatencyStatsWire::from(&snapshot.latency),
            status_tally: snapshot.status_tally.clone(),
            error_tally: snapshot.error_tally.clone(),
            bytes_in: snapshot.bytes_in,
            bytes_out: snapshot.bytes_out,
            done: snapshot.done,
        }
    }
}

/// Top-level response body for `GET /api/snapshot`.
#[derive(Debug, Serialize)]
pub struct FeedWire {
    pub snapshot: SnapshotWire,
    pub series: Vec<SeriesPointWire>,
}

impl From<&Snapshot> for FeedWire {
    fn from(snapshot: &Snapshot) -> Self {
        FeedWire {
            snapshot: SnapshotWire::from(snapshot),
            series: snapshot.series.iter().map(SeriesPointWire::from).collect(),
        }
    }
}
