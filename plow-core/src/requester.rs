//! # Requester (worker pool)
//!
//! Purpose: Spawns N concurrent workers, each calling the external
//! `Client` in a tight loop; gates work by request budget and/or deadline;
//! emits outcomes to the Recorder. Owns the run's state machine:
//! `Idle -> Running -> Draining -> Done`.
//!
//! ## Design Principles
//! 1. **Tokio Tasks, Not OS Threads**: Workers are `tokio::spawn`ed
//!    futures so N can scale well past the core count (spec.md sS5).
//! 2. **Single Atomic Budget**: One `AtomicI64` decrement-fetch gates every
//!    worker; ties resolve naturally, no fairness guarantee needed.
//! 3. **Idempotent Stop Signal**: A `CancellationToken` is the stop signal
//!    every worker and the deadline timer observe; triggering it twice is a
//!    no-op by construction.
//! 4. **Sole Closer**: The Requester is the only thing that closes the
//!    Recorder, and only after every worker has returned.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::recorder::RecorderSender;

/// Capability the Requester drives. One call is one request attempt.
///
/// Implementations own transport, TLS, and proxying; the core only needs
/// the ability to run one attempt and produce a [`plow_common::RequestOutcome`],
/// cancellably.
#[async_trait::async_trait]
pub trait Client: Send + Sync {
    async fn execute(&self, cancel: CancellationToken) -> plow_common::RequestOutcome;
}

/// Budget + deadline inputs to a run, plus the shared collaborators.
pub struct RequesterConfig {
    pub concurrency: usize,
    /// Total request budget; `None` means unlimited. At least one of
    /// `requests` or `duration` should be finite in practice (unlimited is
    /// accepted, per spec.md sS6 validation notes).
    pub requests: Option<u64>,
    /// Wall-clock cap; `None` means unlimited.
    pub duration: Option<Duration>,
    /// Grace window for draining in-flight requests after the deadline or
    /// an external stop request (spec.md sS5, sS9 Open Questions).
    pub grace_window: Duration,
}

/// Shared budget counter. A single atomic decrement-fetch; the token is
/// valid iff the pre-decrement value was >= 1. `i64::MAX` models
/// "unlimited" so the unlimited and finite paths share one code path.
struct Budget {
    remaining: AtomicI64,
}

impl Budget {
    fn new(requests: Option<u64>) -> Self {
        let initial = requests.map(|r| r as i64).unwrap_or(i64::MAX);
        Budget {
            remaining: AtomicI64::new(initial),
        }
    }

    /// Attempts to acquire one token. `true` iff a request may start.
    fn acquire(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::Relaxed) >= 1
    }
}

/// Runs the worker pool to completion: spawns `concurrency` workers, waits
/// for the budget or deadline to end the run, drains in-flight workers
/// within the grace window, then closes the Recorder by dropping `sender`.
///
/// Returns once every worker has exited, i.e. at the `Draining -> Done`
/// transition.
pub async fn run(
    client: Arc<dyn Client>,
    sender: RecorderSender,
    config: RequesterConfig,
    clock: Clock,
) {
    let stop = CancellationToken::new();
    let budget = Arc::new(Budget::new(config.requests));

    if let Some(duration) = config.duration {
        let stop_for_timer = stop.clone();
        let deadline = clock.deadline(duration);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline.into()).await;
            stop_for_timer.cancel();
        });
    }

    let mut workers = tokio::task::JoinSet::new();
    for _ in 0..config.concurrency {
        let client = Arc::clone(&client);
        let sender = sender.clone();
        let budget = Arc::clone(&budget);
        let stop = stop.clone();
        let grace = config.grace_window;
        workers.spawn(worker_loop(client, sender, budget, stop, grace));
    }
    drop(sender);

    while workers.join_next().await.is_some() {}
}

/// One worker's tight loop: acquire a token, check the stop signal, run one
/// attempt racing the grace window, record, repeat.
async fn worker_loop(
    client: Arc<dyn Client>,
    sender: RecorderSender,
    budget: Arc<Budget>,
    stop: CancellationToken,
    grace: Duration,
) {
    loop {
        if stop.is_cancelled() {
            return;
        }
        if !budget.acquire() {
            return;
        }

        let attempt_cancel = stop.child_token();
        let exec_fut = client.execute(attempt_cancel.clone());
        tokio::pin!(exec_fut);

        let outcome = tokio::select! {
            outcome = &mut exec_fut => outcome,
            _ = stop.cancelled() => {
                // Stop fired mid-request: tell the in-flight attempt to
                // cancel at the transport layer, then allow it the grace
                // window to unwind before giving up on it entirely.
                attempt_cancel.cancel();
                match tokio::time::timeout(grace, &mut exec_fut).await {
                    Ok(outcome) => outcome,
                    Err(_) => plow_common::RequestOutcome::failure(
                        grace,
                        plow_common::ErrorKind::Cancelled,
                        0,
                        0,
                    ),
                }
            }
        };

        sender.send(outcome).await;
    }
}
