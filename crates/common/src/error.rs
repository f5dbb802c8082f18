//! Error types for workflow documents

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the document Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating a workflow document
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse workflow: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workflow file not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("Invalid workflow configuration: {0}")]
    InvalidDocument(String),

    #[error("Missing required parameters for {action}: {}", .names.join(", "))]
    MissingParameters { action: String, names: Vec<String> },

    #[error("Invalid parameter '{name}' for {action}: {reason}")]
    InvalidParameter {
        action: String,
        name: String,
        reason: String,
    },
}
