//! Stitch workflow runner
//!
//! Executes declarative JSON workflows against a live browser session.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  TestRunner                                                  │
//! │    ├── initialize()      -> SessionLauncher::launch         │
//! │    ├── run_workflow(src) -> TestResult (never errors)       │
//! │    └── cleanup()         -> BrowserSession::close           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  WorkflowEngine (one per run)                                │
//! │    for each step:                                            │
//! │      callWorkflow   -> recurse, same session + results      │
//! │      customBlocks   -> CustomBlockExecutor (sandboxed Lua)   │
//! │      built-in       -> ActionRegistry                        │
//! │      otherwise      -> UnknownBlock                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BrowserSession                                              │
//! │    └── PlaywrightSession (node driver, JSON lines)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod actions;
pub mod config;
pub mod custom;
pub mod engine;
pub mod error;
pub mod lint;
pub mod playwright;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod session;

pub use config::{Browser, RunnerConfig, Viewport};
pub use custom::CustomBlockExecutor;
pub use engine::WorkflowEngine;
pub use error::{RunnerError, RunnerResult};
pub use playwright::{PlaywrightLauncher, PlaywrightSession};
pub use registry::{Action, ActionRegistry};
pub use reporter::{Progress, Reporter, RunCallbacks};
pub use runner::{run_workflow, TestRunner, WorkflowSource};
pub use session::{
    BrowserSession, ElementState, LoadState, NetworkEvent, ScreenshotOptions, SessionLauncher,
    TabTarget,
};
