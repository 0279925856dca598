//! # Reqwest-backed Client
//!
//! Purpose: Drive the fixed request shape (method/url/headers/body) over a
//! single pooled `reqwest::Client`, classifying every failure into the
//! closed taxonomy from spec.md sS7.

use std::time::{Duration, Instant};

use bytes::Bytes;
use plow_common::{Config, Error, ErrorKind, Result, RequestOutcome};
use tokio_util::sync::CancellationToken;

/// Facade over a pooled `reqwest::Client` configured from a [`Config`].
///
/// Connection reuse is `reqwest`'s job (it pools internally), so unlike
/// `hkv-client`'s `ConnectionPool` this facade does not need to manage
/// connections itself -- only to build the one shared client and issue one
/// request per `execute` call.
pub struct ReqwestClient {
    http: reqwest::Client,
    method: reqwest::Method,
    url: reqwest::Url,
    headers: reqwest::header::HeaderMap,
    body: Option<Bytes>,
    /// Bounds the request-write phase (`--req-timeout`); spec.md sS5.
    write_timeout: Option<Duration>,
    /// Bounds the response-read phase (`--resp-timeout`); spec.md sS5.
    read_timeout: Option<Duration>,
}

impl ReqwestClient {
    /// Builds the shared transport from the run configuration. Called once
    /// at startup; the result is shared read-only by every worker.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = config.timeouts.overall {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.timeouts.connect {
            builder = builder.connect_timeout(timeout);
        }
        if config.tls.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let (Some(cert_path), Some(key_path)) = (&config.tls.cert, &config.tls.key) {
            let mut pem = std::fs::read(cert_path).map_err(|source| Error::BodyFile {
                path: cert_path.clone(),
                source,
            })?;
            let mut key_pem = std::fs::read(key_path).map_err(|source| Error::BodyFile {
                path: key_path.clone(),
                source,
            })?;
            pem.append(&mut key_pem);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|source| {
                Error::InvalidConfig(format!("invalid client certificate/key: {source}"))
            })?;
            builder = builder.identity(identity);
        }
        if let Some(proxy_addr) = &config.socks5 {
            let proxy = reqwest::Proxy::all(format!("socks5://{proxy_addr}"))
                .map_err(|source| Error::InvalidConfig(format!("invalid socks5 proxy: {source}")))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|source| Error::InvalidConfig(format!("failed to build HTTP client: {source}")))?;

        let url = reqwest::Url::parse(&config.url)
            .map_err(|source| Error::InvalidConfig(format!("invalid url {}: {source}", config.url)))?;

        let method = config
            .method
            .as_str()
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("invalid method {}", config.method.as_str())))?;

        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|source| Error::InvalidConfig(format!("invalid header name {name}: {source}")))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|source| Error::InvalidConfig(format!("invalid header value {value}: {source}")))?;
            headers.insert(name, value);
        }

        let body = match &config.body {
            plow_common::config::Body::None => None,
            plow_common::config::Body::Inline(data) => Some(Bytes::from(data.clone())),
            plow_common::config::Body::File { path, .. } => {
                let data = std::fs::read(path).map_err(|source| Error::BodyFile {
                    path: path.clone(),
                    source,
                })?;
                Some(Bytes::from(data))
            }
        };

        Ok(ReqwestClient {
            http,
            method,
            url,
            headers,
            body,
            write_timeout: config.timeouts.write,
            read_timeout: config.timeouts.read,
        })
    }
}

fn classify(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        ErrorKind::Connect
    } else if err.is_body() || err.is_request() {
        ErrorKind::Write
    } else if err.is_decode() {
        ErrorKind::Proto
    } else {
        ErrorKind::Other
    }
}

fn classify_send_err(err: &reqwest::Error) -> ErrorKind {
    if err.is_connect() {
        ErrorKind::Connect
    } else if err.url().is_some() && err.to_string().contains("dns") {
        ErrorKind::Dns
    } else {
        classify(err)
    }
}

/// The outcome of racing a future against cancellation and an optional
/// per-phase deadline.
enum Raced<T> {
    Ready(T),
    Cancelled,
    TimedOut,
}

/// Races `fut` against the stop/cancel signal and, if set, `deadline`.
/// Shared by the write phase (`request.send()`) and the read phase
/// (`response.bytes()`) so both honor the same cancellation contract as
/// the outer attempt-level race in [`execute`].
async fn race<F: std::future::Future>(
    fut: F,
    cancel: &CancellationToken,
    deadline: Option<Duration>,
) -> Raced<F::Output> {
    tokio::pin!(fut);
    match deadline {
        Some(deadline) => {
            tokio::select! {
                result = &mut fut => Raced::Ready(result),
                _ = cancel.cancelled() => Raced::Cancelled,
                _ = tokio::time::sleep(deadline) => Raced::TimedOut,
            }
        }
        None => {
            tokio::select! {
                result = &mut fut => Raced::Ready(result),
                _ = cancel.cancelled() => Raced::Cancelled,
            }
        }
    }
}

#[async_trait::async_trait]
impl plow_core::requester::Client for ReqwestClient {
    async fn execute(&self, cancel: CancellationToken) -> RequestOutcome {
        let start = Instant::now();
        let bytes_written = self.body.as_ref().map(|b| b.len() as u64).unwrap_or(0);

        let mut request = self.http.request(self.method.clone(), self.url.clone());
        request = request.headers(self.headers.clone());
        if let Some(body) = self.body.clone() {
            request = request.body(body);
        }

        let response = match race(request.send(), &cancel, self.write_timeout).await {
            Raced::Ready(Ok(response)) => response,
            Raced::Ready(Err(err)) => {
                return RequestOutcome::failure(start.elapsed(), classify_send_err(&err), bytes_written, 0)
            }
            Raced::Cancelled => {
                return RequestOutcome::failure(start.elapsed(), ErrorKind::Cancelled, bytes_written, 0)
            }
            Raced::TimedOut => {
                return RequestOutcome::failure(start.elapsed(), ErrorKind::Write, bytes_written, 0)
            }
        };

        let status = response.status().as_u16();
        match race(response.bytes(), &cancel, self.read_timeout).await {
            Raced::Ready(Ok(body)) => {
                RequestOutcome::success(start.elapsed(), status, bytes_written, body.len() as u64)
            }
            Raced::Ready(Err(err)) => {
                RequestOutcome::failure(start.elapsed(), classify(&err), bytes_written, 0)
            }
            Raced::Cancelled => RequestOutcome::failure(start.elapsed(), ErrorKind::Cancelled, bytes_written, 0),
            Raced::TimedOut => RequestOutcome::failure(start.elapsed(), ErrorKind::Read, bytes_written, 0),
        }
    }
}
