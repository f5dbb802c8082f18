//! Error types for workflow execution

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    /// Document loading, validation and parameter schema errors
    #[error(transparent)]
    Document(#[from] stitch_common::Error),

    #[error("Block '{block}' not found in registry. Available: {}", .available.join(", "))]
    UnknownBlock {
        block: String,
        available: Vec<String>,
    },

    #[error("Workflow '{0}' not found")]
    UnknownWorkflow(String),

    #[error("Circular workflow dependency detected: {}", .chain.join(" -> "))]
    CircularWorkflow { chain: Vec<String> },

    #[error("{0}")]
    ActionFailed(String),

    #[error("Custom block failed: {0}")]
    CustomBlockFailed(String),

    /// Failure reported by the browser session
    #[error("{0}")]
    Session(String),

    #[error("Playwright driver not available: {0}")]
    DriverUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type RunnerResult<T> = Result<T, RunnerError>;

impl RunnerError {
    /// Wrap a lower-level failure with the action's context
    pub fn action(context: impl std::fmt::Display, cause: impl std::fmt::Display) -> Self {
        RunnerError::ActionFailed(format!("{}: {}", context, cause))
    }
}
