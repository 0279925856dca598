//! plow-charts - the live HTTP feed over a running snapshot
//!
//! Purpose: An optional Axum server exposing the current [`Snapshot`] (and
//! its rolling series) as JSON, plus a small static page that polls it.
//! A pure read-only consumer of [`AggregatorHandle`]; it never touches the
//! Requester or Recorder.
//!
//! [`Snapshot`]: plow_core::Snapshot

pub mod server;
pub mod wire;

pub use server::spawn;
