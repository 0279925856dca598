//! # Clock
//!
//! Purpose: A single monotonic reference point (`t0`) shared by the
//! Aggregator and Requester, so every timestamp in the system is expressed
//! as an elapsed `Duration` rather than a wall-clock instant.
//!
//! Using `Instant` instead of `SystemTime` keeps the measurement immune to
//! clock adjustments during a run.

use std::time::{Duration, Instant};

/// Fixed start-of-run reference point. Cheap to copy; clone freely.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    t0: Instant,
}

impl Clock {
    /// Starts the clock now. Call this exactly once, when the Requester
    /// transitions Idle -> Running.
    pub fn start() -> Self {
        Clock { t0: Instant::now() }
    }

    /// Elapsed wall time since `t0`.
    pub fn elapsed(&self) -> Duration {
        self.t0.elapsed()
    }

    /// The deadline `t0 + duration`, if a duration cap is configured.
    pub fn deadline(&self, duration: Duration) -> Instant {
        self.t0 + duration
    }
}
