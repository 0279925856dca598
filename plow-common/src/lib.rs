// plow-common - Shared types for the plow HTTP benchmarking engine
//
// This crate defines the value types and error taxonomy that flow between
// the client, the core measurement engine, and the CLI shell.

pub mod config;
pub mod error;
pub mod outcome;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use outcome::RequestOutcome;
