//! # Recorder
//!
//! Purpose: The bounded, multi-producer/single-consumer transport that
//! carries [`RequestOutcome`]s from workers to the Aggregator.
//!
//! ## Design Principles
//! 1. **Bounded-Blocking, Not Dropping**: The default policy is that a full
//!    queue blocks the producer rather than discarding outcomes -- accurate
//!    counts dominate maximum throughput (spec.md sS4.2).
//! 2. **One-Way Closure**: Only the Requester closes the channel, and only
//!    after every worker has returned. It does so implicitly by dropping
//!    its own sender handle once no workers remain.
//! 3. **Send-After-Close Is a Bug**: A worker sending after the channel is
//!    closed is a logic error, not a recoverable condition -- workers must
//!    stop driving requests before the Requester drops the shared sender.

use plow_common::RequestOutcome;

/// Recommended recorder capacity: 8x worker count, per spec.md sS4.2.
pub fn recommended_capacity(concurrency: usize) -> usize {
    (concurrency * 8).max(64)
}

/// Producer handle. Cloned once per worker.
#[derive(Clone)]
pub struct RecorderSender {
    inner: tokio::sync::mpsc::Sender<RequestOutcome>,
}

impl RecorderSender {
    /// Sends one outcome, suspending if the bounded queue is full.
    ///
    /// Panics if the Aggregator has already closed its receiver -- per the
    /// Recorder's contract this can only happen if a worker kept running
    /// after the Requester decided the run was over, which is a logic bug.
    pub async fn send(&self, outcome: RequestOutcome) {
        self.inner
            .send(outcome)
            .await
            .expect("send after Recorder close: workers must stop before the channel closes");
    }
}

/// Consumer handle. Owned exclusively by the Aggregator.
pub struct RecorderReceiver {
    inner: tokio::sync::mpsc::Receiver<RequestOutcome>,
}

impl RecorderReceiver {
    /// Receives the next outcome, or `None` once every `RecorderSender` has
    /// been dropped and the queue has drained.
    pub async fn recv(&mut self) -> Option<RequestOutcome> {
        self.inner.recv().await
    }
}

/// Creates a bounded Recorder channel. `capacity` should be
/// [`recommended_capacity`] unless a caller has a specific reason to tune
/// it (e.g. deterministic tests).
pub fn channel(capacity: usize) -> (RecorderSender, RecorderReceiver) {
    let (tx, rx) = tokio::sync::mpsc::channel(capacity.max(1));
    (RecorderSender { inner: tx }, RecorderReceiver { inner: rx })
}
