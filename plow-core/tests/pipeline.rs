//! Boundary-scenario tests from SPEC_FULL.md sS8, run against deterministic
//! stub clients rather than real network I/O.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use plow_common::{ErrorKind, RequestOutcome};
use plow_core::requester::Client;
use tokio_util::sync::CancellationToken;

struct FixedLatencyClient {
    status: u16,
    latency: Duration,
}

#[async_trait::async_trait]
impl Client for FixedLatencyClient {
    async fn execute(&self, _cancel: CancellationToken) -> RequestOutcome {
        tokio::time::sleep(self.latency).await;
        RequestOutcome::success(self.latency, self.status, 64, 256)
    }
}

struct AlternatingClient {
    counter: AtomicU64,
}

#[async_trait::async_trait]
impl Client for AlternatingClient {
    async fn execute(&self, _cancel: CancellationToken) -> RequestOutcome {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let status = if n % 2 == 0 { 200 } else { 500 };
        RequestOutcome::success(Duration::from_micros(100), status, 16, 32)
    }
}

struct HalfTimeoutClient {
    counter: AtomicU64,
}

#[async_trait::async_trait]
impl Client for HalfTimeoutClient {
    async fn execute(&self, _cancel: CancellationToken) -> RequestOutcome {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        if n % 2 == 0 {
            RequestOutcome::success(Duration::from_micros(100), 200, 16, 32)
        } else {
            RequestOutcome::failure(Duration::from_millis(1), ErrorKind::Timeout, 16, 0)
        }
    }
}

struct ImmediateOkClient;

#[async_trait::async_trait]
impl Client for ImmediateOkClient {
    async fn execute(&self, _cancel: CancellationToken) -> RequestOutcome {
        RequestOutcome::success(Duration::from_micros(10), 200, 8, 8)
    }
}

#[tokio::test]
async fn scenario_1_zero_budget_finishes_immediately() {
    let client = Arc::new(ImmediateOkClient);
    let (mut handle, join) = plow_core::run(
        client,
        1,
        Some(0),
        None,
        Duration::from_secs(1),
        Duration::from_millis(200),
        64,
    )
    .await;

    join.await.unwrap();
    handle.wait_done().await;
    let snap = handle.snapshot();
    assert_eq!(snap.total, 0);
    assert!(snap.done);
}

#[tokio::test]
async fn scenario_2_fixed_latency_histogram_bucket() {
    let client = Arc::new(FixedLatencyClient {
        status: 200,
        latency: Duration::from_millis(10),
    });
    let (mut handle, join) = plow_core::run(
        client,
        4,
        Some(100),
        None,
        Duration::from_secs(1),
        Duration::from_millis(200),
        64,
    )
    .await;

    join.await.unwrap();
    handle.wait_done().await;
    let snap = handle.snapshot();

    assert_eq!(snap.total, 100);
    assert_eq!(snap.succeeded, 100);
    assert!(snap.latency.p99 <= Duration::from_millis(12), "{:?}", snap.latency.p99);
    assert!(snap.latency.p99 >= Duration::from_millis(10));
}

#[tokio::test]
async fn scenario_4_alternating_status_is_all_success() {
    let client = Arc::new(AlternatingClient {
        counter: AtomicU64::new(0),
    });
    let (mut handle, join) = plow_core::run(
        client,
        2,
        Some(50),
        None,
        Duration::from_secs(1),
        Duration::from_millis(200),
        64,
    )
    .await;

    join.await.unwrap();
    handle.wait_done().await;
    let snap = handle.snapshot();

    assert_eq!(snap.succeeded, 50);
    assert_eq!(snap.failed, 0);
    let mut statuses = snap.status_tally.clone();
    statuses.sort();
    assert_eq!(statuses, vec![(200, 25), (500, 25)]);
}

#[tokio::test]
async fn scenario_5_half_timeout_splits_success_and_failure() {
    let client = Arc::new(HalfTimeoutClient {
        counter: AtomicU64::new(0),
    });
    let (mut handle, join) = plow_core::run(
        client,
        2,
        Some(50),
        None,
        Duration::from_secs(1),
        Duration::from_millis(200),
        64,
    )
    .await;

    join.await.unwrap();
    handle.wait_done().await;
    let snap = handle.snapshot();

    assert_eq!(snap.failed, 25);
    let timeout_count = snap
        .error_tally
        .iter()
        .find(|(kind, _)| *kind == ErrorKind::Timeout)
        .map(|(_, count)| *count)
        .unwrap_or(0);
    assert_eq!(timeout_count, 25);
    assert_eq!(snap.succeeded, 25);
}

#[tokio::test]
async fn scenario_3_duration_bound_stops_new_requests() {
    let client = Arc::new(ImmediateOkClient);
    let (mut handle, join) = plow_core::run(
        client,
        10,
        None,
        Some(Duration::from_millis(300)),
        Duration::from_millis(500),
        Duration::from_millis(200),
        64,
    )
    .await;

    join.await.unwrap();
    handle.wait_done().await;
    let snap = handle.snapshot();

    assert!(snap.total > 0);
    assert_eq!(snap.total, snap.succeeded + snap.failed);
    // ceil(300ms / 200ms) = 2 non-empty intervals at minimum.
    let non_empty = snap.series.iter().filter(|p| p.count > 0).count();
    assert!(non_empty >= 1, "expected at least one non-empty interval");
}

#[tokio::test]
async fn scenario_6_many_snapshots_satisfy_invariants_mid_run() {
    let client = Arc::new(ImmediateOkClient);
    let (mut handle, join) = plow_core::run(
        client,
        8,
        Some(10_000),
        None,
        Duration::from_secs(1),
        Duration::from_millis(200),
        64,
    )
    .await;

    for _ in 0..1000 {
        let snap = handle.snapshot();
        assert_eq!(snap.total, snap.succeeded + snap.failed);
        assert!(snap.latency.min <= snap.latency.mean || snap.succeeded == 0);
        assert!(snap.latency.mean <= snap.latency.max);
        assert!(snap.latency.p50 <= snap.latency.p90);
        assert!(snap.latency.p90 <= snap.latency.p99);
        tokio::task::yield_now().await;
    }

    join.await.unwrap();
    handle.wait_done().await;
    let final_snap = handle.snapshot();
    let post_done_snap = handle.snapshot();
    assert_eq!(final_snap.total, post_done_snap.total);
    assert_eq!(final_snap.succeeded, 10_000);
}
