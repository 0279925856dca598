//! # Run Configuration
//!
//! Purpose: Immutable, process-wide configuration built once at startup from
//! parsed CLI options (and `PLOW_*` env overrides) and shared read-only by
//! the Requester and Client.
//!
//! ## Design Principles
//! 1. **Immutable Value**: Built once, passed by `Arc`, never mutated.
//! 2. **Validated at the Edge**: Construction is the only place invalid
//!    combinations are rejected; everything downstream trusts it.

use std::time::Duration;

use crate::error::{Error, Result};

/// HTTP method for the fixed request shape the run drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }
}

/// The four independently-configurable timeouts from SS5/SS6.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Overall per-request timeout; bounds dispatch through body close.
    pub overall: Option<Duration>,
    /// Time allowed to establish the connection (TCP/TLS).
    pub connect: Option<Duration>,
    /// Time allowed to write the full request.
    pub write: Option<Duration>,
    /// Time allowed to read the full response.
    pub read: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            overall: Some(Duration::from_secs(30)),
            connect: Some(Duration::from_secs(10)),
            write: None,
            read: None,
        }
    }
}

/// TLS parameters. `cert`/`key` must be both set or both empty.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub cert: Option<String>,
    pub key: Option<String>,
    pub insecure: bool,
}

/// Body source for the fixed request shape.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    None,
    Inline(Vec<u8>),
    /// `@file`, optionally streamed chunked rather than loaded whole.
    File { path: String, stream: bool },
}

/// Immutable run configuration shared by the Requester and Client.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Body,
    pub concurrency: usize,
    /// Total request budget; `None` means unlimited.
    pub requests: Option<u64>,
    /// Wall-clock cap; `None` means unlimited.
    pub duration: Option<Duration>,
    /// Snapshot/print cadence; `None` means "print only the final report".
    pub interval: Option<Duration>,
    pub render_seconds: bool,
    pub timeouts: Timeouts,
    pub tls: TlsConfig,
    pub socks5: Option<String>,
    pub listen: Option<String>,
    pub auto_open_browser: bool,
    pub clean: bool,
    pub summary: bool,
}

impl Config {
    /// Validates cross-field invariants from spec.md sS6.
    ///
    /// `requests >= concurrency` is enforced as a warning by the caller, not
    /// here -- see the Open Questions resolution in SPEC_FULL.md.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be >= 1".into()));
        }
        if self.requests.is_none() && self.duration.is_none() {
            tracing::warn!("neither --requests nor --duration is finite; run will be unbounded");
        }
        if self.tls.cert.is_some() != self.tls.key.is_some() {
            return Err(Error::InvalidConfig(
                "cert and key must be both set or both empty".into(),
            ));
        }
        if let (Some(requests), concurrency) = (self.requests, self.concurrency as u64) {
            if requests < concurrency {
                tracing::warn!(
                    requests,
                    concurrency,
                    "requests is smaller than concurrency; some workers will be idle"
                );
            }
        }
        Ok(())
    }

    /// The grace window for draining in-flight requests after the stop
    /// signal fires: `min(per-request timeout, 5s)` per SPEC_FULL sS9.
    pub fn grace_window(&self) -> Duration {
        match self.timeouts.overall {
            Some(timeout) => timeout.min(Duration::from_secs(5)),
            None => Duration::from_secs(5),
        }
    }
}
