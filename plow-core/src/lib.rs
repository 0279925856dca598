//! plow-core - the measurement engine
//!
//! Owns the request-driving concurrency harness, the metrics-recording
//! pipeline, and the streaming aggregation/snapshot model described in
//! SPEC_FULL.md sS2-sS5. Everything outside this crate (transport, CLI,
//! rendering) is a consumer of what's exposed here.

pub mod aggregator;
pub mod clock;
pub mod histogram;
pub mod recorder;
pub mod requester;
pub mod rolling;
pub mod snapshot;

pub use aggregator::AggregatorHandle;
pub use clock::Clock;
pub use histogram::LatencyHistogram;
pub use recorder::{RecorderReceiver, RecorderSender};
pub use requester::{Client, RequesterConfig};
pub use rolling::RollingSeries;
pub use snapshot::Snapshot;

use std::sync::Arc;
use std::time::Duration;

/// Wires the Recorder, Aggregator, and Requester together and runs one
/// benchmark to completion (budget exhausted and/or deadline fired, all
/// workers drained). Returns the final snapshot.
///
/// This is the `Idle -> Running -> Draining -> Done` state machine from
/// spec.md sS4.4 made concrete: `t0` starts here, the Requester drives
/// workers against `client`, and the Aggregator drains until the Recorder
/// closes.
pub async fn run(
    client: Arc<dyn Client>,
    concurrency: usize,
    requests: Option<u64>,
    duration: Option<Duration>,
    grace_window: Duration,
    interval: Duration,
    rolling_capacity: usize,
) -> (AggregatorHandle, tokio::task::JoinHandle<()>) {
    let clock = Clock::start();
    let capacity = recorder::recommended_capacity(concurrency);
    let (sender, receiver) = recorder::channel(capacity);

    let handle = aggregator::spawn(receiver, clock, interval, rolling_capacity);

    let requester_config = RequesterConfig {
        concurrency,
        requests,
        duration,
        grace_window,
    };
    let join = tokio::spawn(requester::run(client, sender, requester_config, clock));

    (handle, join)
}
