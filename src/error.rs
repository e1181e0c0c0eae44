//! Error types for Quay

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Quay operations
pub type Result<T> = std::result::Result<T, QuayError>;

/// Quay error types
#[derive(Error, Debug)]
pub enum QuayError {
    #[error("Compose file not found: {}", .0.display())]
    ComposeNotFound(PathBuf),

    #[error("Compose file parse error: {0}")]
    ComposeParse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Failed to inspect service {service}: {reason}")]
    Inspection { service: String, reason: String },

    #[error("Failed to start service {service}: {reason}")]
    Launch { service: String, reason: String },

    #[error("Failed to stop service {service}: {reason}")]
    Stop { service: String, reason: String },

    #[error("{failed} of {total} services failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

