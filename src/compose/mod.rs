//! Docker Compose compatible orchestration
//!
//! This module reads a compose file into an ordered set of services and
//! drives their lifecycle through the `container` CLI.

pub mod config;
pub mod orchestrator;
pub mod parser;
pub mod service;

pub use config::{ComposeConfig, ServiceConfig};
pub use orchestrator::{BatchOutcome, ComposeOrchestrator, ServiceOutcome};
pub use parser::ComposeParser;
pub use service::{CommandSpec, ComposeProject, ServiceSpec};
