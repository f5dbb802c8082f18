//! Stitch Common Library
//!
//! Workflow document model, step parameter bags and run result types shared
//! by the runner and the CLI.

pub mod document;
pub mod error;
pub mod params;
pub mod result;

pub use document::{CustomBlock, Step, Workflow, WorkflowDocument, CALL_WORKFLOW};
pub use error::{Error, Result};
pub use params::Parameters;
pub use result::{StepResult, StepStatus, TestResult};

/// Stitch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
