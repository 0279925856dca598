//! # Aggregator Benchmark Harness
//!
//! Purpose: Provide a dependency-free, repeatable benchmark driver for the
//! histogram and aggregator so baseline throughput can be compared over
//! time, independent of any real HTTP transport.
//!
//! ## Design Principles
//! 1. **Deterministic Workload**: Fixed PRNG seed for stable comparisons.
//! 2. **Zero-Cost Dispatch**: Drives `StreamReport` through the real
//!    Recorder/Aggregator pipeline, not a shortcut path.

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use plow_common::{ErrorKind, RequestOutcome};
use plow_core::requester::{Client, RequesterConfig};
use tokio_util::sync::CancellationToken;

const DEFAULT_OP_COUNT: u64 = 200_000;
const DEFAULT_CONCURRENCY: usize = 32;

struct BenchConfig {
    op_count: u64,
    concurrency: usize,
}

impl BenchConfig {
    fn from_args() -> Self {
        let mut args = env::args().skip(1);
        let op_count = parse_u64(args.next(), DEFAULT_OP_COUNT);
        let concurrency = parse_u64(args.next(), DEFAULT_CONCURRENCY as u64) as usize;
        BenchConfig {
            op_count,
            concurrency,
        }
    }
}

fn parse_u64(value: Option<String>, fallback: u64) -> u64 {
    value.and_then(|raw| raw.parse().ok()).unwrap_or(fallback)
}

/// Tiny deterministic PRNG, avoiding an extra dependency for this harness.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

struct SyntheticClient;

#[async_trait::async_trait]
impl Client for SyntheticClient {
    async fn execute(&self, _cancel: CancellationToken) -> RequestOutcome {
        thread_local! {
            static RNG: std::cell::RefCell<XorShift64> =
                std::cell::RefCell::new(XorShift64::new(0xD1CE_D1CE_D1CE_D1CE));
        }
        let roll = RNG.with(|rng| rng.borrow_mut().next_u64());
        let latency = Duration::from_micros(50 + (roll % 5_000));
        if roll % 97 == 0 {
            RequestOutcome::failure(latency, ErrorKind::Timeout, 32, 0)
        } else {
            RequestOutcome::success(latency, 200, 32, 256)
        }
    }
}

fn report(label: &str, ops: u64, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let ops_per_sec = ops as f64 / secs;
    println!("{label}: {ops} ops in {secs:.3}s ({ops_per_sec:.0} ops/s)");
}

#[tokio::main]
async fn main() {
    let config = BenchConfig::from_args();
    println!(
        "ops={}, concurrency={}",
        config.op_count, config.concurrency
    );

    let requester_config = RequesterConfig {
        concurrency: config.concurrency,
        requests: Some(config.op_count),
        duration: None,
        grace_window: Duration::from_secs(5),
    };

    let clock = plow_core::Clock::start();
    let (sender, receiver) = plow_core::recorder::channel(
        plow_core::recorder::recommended_capacity(config.concurrency),
    );
    let mut handle = plow_core::aggregator::spawn(receiver, clock, Duration::from_millis(200), 64);

    let start = Instant::now();
    let requester_join = tokio::spawn(plow_core::requester::run(
        Arc::new(SyntheticClient),
        sender,
        requester_config,
        clock,
    ));
    requester_join.await.expect("requester task panicked");
    handle.wait_done().await;
    let elapsed = start.elapsed();

    let snap = handle.snapshot();
    report("aggregate", snap.total, elapsed);
    println!(
        "p50={:?} p99={:?} errors={}",
        snap.latency.p50, snap.latency.p99, snap.failed
    );
}
