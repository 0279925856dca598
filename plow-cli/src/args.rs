//! # Command-Line Surface
//!
//! Purpose: The option table from spec.md sS6, as a `clap` derive struct.
//! Every option doubles as a `PLOW_`-prefixed environment variable (clap's
//! built-in `env` resolution covers the "case-folded, dashes to
//! underscores" rule directly -- each field just names its own variable).

use std::time::Duration;

use clap::Parser;

use plow_common::config::{Body, Config, Method, TlsConfig, Timeouts};

#[derive(Debug, Parser)]
#[command(name = "plow", about = "A concurrent HTTP benchmarking tool")]
pub struct Args {
    /// Target URL.
    pub url: String,

    /// Number of concurrent workers.
    #[arg(long, env = "PLOW_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// Total request budget; negative means unlimited.
    #[arg(long, env = "PLOW_REQUESTS", allow_hyphen_values = true)]
    pub requests: Option<i64>,

    /// Wall-clock cap in seconds; zero or absent means unlimited.
    #[arg(long, env = "PLOW_DURATION")]
    pub duration: Option<f64>,

    /// Snapshot/print cadence in seconds; zero means "final report only".
    #[arg(long, env = "PLOW_INTERVAL", default_value_t = 1.0)]
    pub interval: f64,

    /// Render times in seconds rather than milliseconds (display only).
    #[arg(long, env = "PLOW_SECONDS")]
    pub seconds: bool,

    /// Request body: inline text, or `@path` to read from a file.
    #[arg(long, env = "PLOW_BODY")]
    pub body: Option<String>,

    /// Stream the body file instead of loading it whole.
    #[arg(long, env = "PLOW_STREAM")]
    pub stream: bool,

    /// HTTP method.
    #[arg(long, env = "PLOW_METHOD", default_value = "GET")]
    pub method: String,

    /// Extra headers as `Name: value`, semicolon-separated.
    #[arg(long, env = "PLOW_HEADERS")]
    pub headers: Option<String>,

    /// Convenience override for the `Host` header.
    #[arg(long, env = "PLOW_HOST")]
    pub host: Option<String>,

    /// Convenience override for the `Content-Type` header.
    #[arg(long, env = "PLOW_CONTENT")]
    pub content: Option<String>,

    /// Client certificate path (PEM).
    #[arg(long, env = "PLOW_CERT")]
    pub cert: Option<String>,

    /// Client key path (PEM).
    #[arg(long, env = "PLOW_KEY")]
    pub key: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long, env = "PLOW_INSECURE")]
    pub insecure: bool,

    /// Overall per-request timeout in seconds.
    #[arg(long, env = "PLOW_TIMEOUT")]
    pub timeout: Option<f64>,

    /// Connect (dial) timeout in seconds.
    #[arg(long = "dial-timeout", env = "PLOW_DIAL_TIMEOUT")]
    pub dial_timeout: Option<f64>,

    /// Request-write timeout in seconds.
    #[arg(long = "req-timeout", env = "PLOW_REQ_TIMEOUT")]
    pub req_timeout: Option<f64>,

    /// Response-read timeout in seconds.
    #[arg(long = "resp-timeout", env = "PLOW_RESP_TIMEOUT")]
    pub resp_timeout: Option<f64>,

    /// SOCKS5 proxy address.
    #[arg(long, env = "PLOW_SOCKS5")]
    pub socks5: Option<String>,

    /// Charts HTTP listen address; absent disables the charts server.
    #[arg(long, env = "PLOW_LISTEN")]
    pub listen: Option<String>,

    /// Launch a browser once the charts listener is live.
    #[arg(long = "auto-open-browser", env = "PLOW_AUTO_OPEN_BROWSER")]
    pub auto_open_browser: bool,

    /// Remove the histogram bar from the final report.
    #[arg(long, env = "PLOW_CLEAN")]
    pub clean: bool,

    /// Suppress real-time output; print only the final summary.
    #[arg(long, env = "PLOW_SUMMARY")]
    pub summary: bool,
}

fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let (name, value) = entry.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_duration_secs(secs: Option<f64>) -> Option<Duration> {
    let secs = secs?;
    if secs <= 0.0 {
        None
    } else {
        Some(Duration::from_secs_f64(secs))
    }
}

impl Args {
    /// Builds the immutable run [`Config`] from the parsed option table.
    pub fn into_config(self) -> Config {
        let mut headers = self.headers.as_deref().map(parse_headers).unwrap_or_default();
        if let Some(host) = self.host {
            headers.push(("Host".to_string(), host));
        }
        if let Some(content_type) = self.content {
            headers.push(("Content-Type".to_string(), content_type));
        }

        let body = match self.body {
            None => Body::None,
            Some(spec) => match spec.strip_prefix('@') {
                Some(path) => Body::File {
                    path: path.to_string(),
                    stream: self.stream,
                },
                None => Body::Inline(spec.into_bytes()),
            },
        };

        let requests = self.requests.and_then(|n| if n < 0 { None } else { Some(n as u64) });

        Config {
            url: self.url,
            method: Method::from(self.method.as_str()),
            headers,
            body,
            concurrency: self.concurrency,
            requests,
            duration: parse_duration_secs(self.duration),
            interval: parse_duration_secs(Some(self.interval)),
            render_seconds: self.seconds,
            timeouts: Timeouts {
                overall: parse_duration_secs(self.timeout).or(Timeouts::default().overall),
                connect: parse_duration_secs(self.dial_timeout).or(Timeouts::default().connect),
                write: parse_duration_secs(self.req_timeout),
                read: parse_duration_secs(self.resp_timeout),
            },
            tls: TlsConfig {
                cert: self.cert,
                key: self.key,
                insecure: self.insecure,
            },
            socks5: self.socks5,
            listen: self.listen,
            auto_open_browser: self.auto_open_browser,
            clean: self.clean,
            summary: self.summary,
        }
    }
}
