//! plow-client - the external `Client` capability
//!
//! Purpose: Concrete implementations of [`plow_core::requester::Client`],
//! the capability the core measurement engine consumes but does not
//! specify. `ReqwestClient` is the real HTTP transport; `StubClient` is a
//! deterministic double for tests that don't want real network I/O.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: Each client hides its transport/pooling details
//!    behind the one `execute` method the core needs, the same shape
//!    `hkv-client`'s `KVClient` used to hide its connection pool.
//! 2. **Shared, Read-Only**: A client is built once and shared across every
//!    worker via `Arc`; its own concurrency safety is its contract
//!    (spec.md sS5).

pub mod reqwest_client;
pub mod stub;

pub use reqwest_client::ReqwestClient;
pub use stub::{StubClient, StubOutcome};
