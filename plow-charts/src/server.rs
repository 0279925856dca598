//! # Charts Server
//!
//! Purpose: An Axum router that exposes the live snapshot over HTTP --
//! a static page at `/` and the JSON feed it polls at `/api/snapshot`.
//! Bound and started before the Requester so an auto-opened browser always
//! lands on a live listener (spec.md sS4.6).

use std::net::SocketAddr;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;

use plow_common::{Error, Result};
use plow_core::AggregatorHandle;

use crate::wire::FeedWire;

const INDEX_HTML: &str = include_str!("index.html");

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn api_snapshot(State(handle): State<AggregatorHandle>) -> Json<FeedWire> {
    let snapshot = handle.snapshot();
    Json(FeedWire::from(&snapshot))
}

fn router(handle: AggregatorHandle) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/snapshot", get(api_snapshot))
        .with_state(handle)
}

/// Binds `listen` and spawns the server in the background, returning the
/// address actually bound (useful when `listen` ends in `:0`).
pub async fn spawn(listen: &str, handle: AggregatorHandle) -> Result<SocketAddr> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|source| Error::ListenerBind {
            addr: listen.to_string(),
            source,
        })?;
    let addr = listener
        .local_addr()
        .map_err(|source| Error::ListenerBind {
            addr: listen.to_string(),
            source,
        })?;

    let app = router(handle);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::warn!(%err, "charts server stopped");
        }
    });

    tracing::info!(%addr, "charts server listening");
    Ok(addr)
}
