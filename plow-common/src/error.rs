//! # Error Taxonomy
//!
//! Purpose: Define the closed set of transport failure tags that a
//! `RequestOutcome` can carry, plus the crate-wide setup error type.
//!
//! ## Design Principles
//! 1. **Closed Taxonomy**: Surface names are stable; new tags are a breaking
//!    change, not a silent addition.
//! 2. **Hashable Tags**: `ErrorKind` keys the error tally map, so it derives
//!    the traits that make it usable as a `HashMap` key.
//! 3. **Fail Fast at Setup**: `Error` covers configuration and startup
//!    failures only; per-request transport failures never produce one.

use std::fmt;

/// Tag describing why a request attempt did not succeed.
///
/// Mutually exclusive with a successful status: an outcome carries either a
/// status code or an `ErrorKind`, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Name resolution failed.
    Dns,
    /// TCP/TLS handshake failed or dial timed out.
    Connect,
    /// Request write incomplete or timed out.
    Write,
    /// Response read incomplete or timed out.
    Read,
    /// Overall per-request timeout expired.
    Timeout,
    /// Stop signal fired or the grace window expired mid-request.
    Cancelled,
    /// Response was malformed.
    Proto,
    /// Anything else the transport surfaced.
    Other,
}

impl ErrorKind {
    /// Stable surface name, used as the error-tally key and in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Dns => "dns",
            ErrorKind::Connect => "connect",
            ErrorKind::Write => "write",
            ErrorKind::Read => "read",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Proto => "proto",
            ErrorKind::Other => "other",
        }
    }

    /// All tags, in a stable order, for iterating a zero-filled tally.
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::Dns,
        ErrorKind::Connect,
        ErrorKind::Write,
        ErrorKind::Read,
        ErrorKind::Timeout,
        ErrorKind::Cancelled,
        ErrorKind::Proto,
        ErrorKind::Other,
    ];

    /// Dense index into a `[_; 8]` tally array, matching [`ErrorKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            ErrorKind::Dns => 0,
            ErrorKind::Connect => 1,
            ErrorKind::Write => 2,
            ErrorKind::Read => 3,
            ErrorKind::Timeout => 4,
            ErrorKind::Cancelled => 5,
            ErrorKind::Proto => 6,
            ErrorKind::Other => 7,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result alias for fallible setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Setup/configuration errors. Never produced on the per-request hot path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required option was missing or two options conflicted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The body file named by `@file` could not be read.
    #[error("failed to read body file {path}: {source}")]
    BodyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The charts listener could not bind to the requested address.
    #[error("failed to bind charts listener on {addr}: {source}")]
    ListenerBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
