//! Quay - run docker-compose services on the `container` CLI
//!
//! Quay reads a `docker-compose.yml` and translates each declared service
//! into invocations of a single-host container runtime binary:
//!
//! - `start` launches every service that is not already running
//! - `status` reports what the runtime says about each service
//! - `stop` stops every service
//! - `run` launches one service in the foreground
//!
//! Port mappings are accepted but cannot be expressed by the runtime; they
//! are reported as warnings rather than applied.

pub mod compose;
pub mod error;
pub mod runtime;

pub use error::{QuayError, Result};
