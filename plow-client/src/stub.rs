//! # Stub Client
//!
//! Purpose: A deterministic `Client` double for tests, grounded on the same
//! "feed a scripted sequence of responses" pattern real network stubs use
//! in this pack's other test suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use plow_common::{ErrorKind, RequestOutcome};
use tokio_util::sync::CancellationToken;

/// One scripted outcome for [`StubClient`].
#[derive(Debug, Clone, Copy)]
pub enum StubOutcome {
    Status(u16, Duration),
    Error(ErrorKind, Duration),
}

/// Replays a fixed, looping sequence of outcomes. Useful for exercising the
/// boundary scenarios in spec.md sS8 without a real server.
pub struct StubClient {
    script: Vec<StubOutcome>,
    cursor: AtomicUsize,
}

impl StubClient {
    pub fn new(script: Vec<StubOutcome>) -> Self {
        assert!(!script.is_empty(), "StubClient script must be non-empty");
        StubClient {
            script,
            cursor: AtomicUsize::new(0),
        }
    }

    /// A client that always returns `200 OK` with a fixed latency.
    pub fn fixed_ok(latency: Duration) -> Self {
        Self::new(vec![StubOutcome::Status(200, latency)])
    }
}

#[async_trait::async_trait]
impl plow_core::requester::Client for StubClient {
    async fn execute(&self, cancel: CancellationToken) -> RequestOutcome {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.script.len();
        match self.script[idx] {
            StubOutcome::Status(status, latency) => {
                tokio::select! {
                    _ = tokio::time::sleep(latency) => {
                        RequestOutcome::success(latency, status, 16, 64)
                    }
                    _ = cancel.cancelled() => {
                        RequestOutcome::failure(latency, ErrorKind::Cancelled, 16, 0)
                    }
                }
            }
            StubOutcome::Error(kind, latency) => {
                tokio::time::sleep(latency).await;
                RequestOutcome::failure(latency, kind, 16, 0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plow_core::requester::Client;

    #[tokio::test]
    async fn cycles_through_script() {
        let stub = StubClient::new(vec![
            StubOutcome::Status(200, Duration::from_micros(1)),
            StubOutcome::Error(ErrorKind::Timeout, Duration::from_micros(1)),
        ]);
        let a = stub.execute(CancellationToken::new()).await;
        let b = stub.execute(CancellationToken::new()).await;
        let c = stub.execute(CancellationToken::new()).await;
        assert!(a.is_success());
        assert!(!b.is_success());
        assert!(c.is_success());
    }
}
