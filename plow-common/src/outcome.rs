//! # Request Outcome
//!
//! Purpose: The single value type that crosses the worker -> Recorder ->
//! Aggregator boundary. One instance per completed (or cancelled) attempt.

use std::time::Duration;

use crate::error::ErrorKind;

/// The recorded result of one request attempt.
///
/// `status` and `err` are mutually exclusive: a successful attempt carries a
/// status code and `err: None`; a failed attempt carries `status: 0` and
/// `err: Some(_)`.
#[derive(Debug, Clone, Copy)]
pub struct RequestOutcome {
    /// Elapsed wall time from dispatch to response body close (or to
    /// cancellation, for failed attempts).
    pub latency: Duration,
    /// HTTP status code, or zero if no response was obtained.
    pub status: u16,
    /// Error tag, set iff `status == 0`.
    pub err: Option<ErrorKind>,
    /// Octets written to the wire for the request.
    pub bytes_written: u64,
    /// Octets read from the wire for the response.
    pub bytes_read: u64,
}

impl RequestOutcome {
    /// Builds a successful outcome. `status` must be in `100..=599`.
    pub fn success(latency: Duration, status: u16, bytes_written: u64, bytes_read: u64) -> Self {
        debug_assert!((100..=599).contains(&status), "status out of HTTP range");
        RequestOutcome {
            latency,
            status,
            err: None,
            bytes_written,
            bytes_read,
        }
    }

    /// Builds a failed outcome carrying whatever partial bytes were observed
    /// before the transport gave up.
    pub fn failure(
        latency: Duration,
        err: ErrorKind,
        bytes_written: u64,
        bytes_read: u64,
    ) -> Self {
        RequestOutcome {
            latency,
            status: 0,
            err: Some(err),
            bytes_written,
            bytes_read,
        }
    }

    /// True when the response was received (status in `100..=599` and no
    /// error tag) -- "success" per this implementation's fixed convention.
    pub fn is_success(&self) -> bool {
        self.err.is_none() && (100..=599).contains(&self.status)
    }
}
