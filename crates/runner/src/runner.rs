//! Test runner: owns the browser session and turns runs into results

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use stitch_common::{StepResult, TestResult, WorkflowDocument};

use crate::config::RunnerConfig;
use crate::engine::WorkflowEngine;
use crate::error::{RunnerError, RunnerResult};
use crate::playwright::PlaywrightLauncher;
use crate::registry::ActionRegistry;
use crate::reporter::RunCallbacks;
use crate::session::{BrowserSession, ScreenshotOptions, SessionLauncher};

/// Where a run's document comes from
#[derive(Debug, Clone)]
pub enum WorkflowSource {
    Document(WorkflowDocument),
    Path(PathBuf),
}

impl From<WorkflowDocument> for WorkflowSource {
    fn from(document: WorkflowDocument) -> Self {
        WorkflowSource::Document(document)
    }
}

impl From<PathBuf> for WorkflowSource {
    fn from(path: PathBuf) -> Self {
        WorkflowSource::Path(path)
    }
}

impl From<&Path> for WorkflowSource {
    fn from(path: &Path) -> Self {
        WorkflowSource::Path(path.to_path_buf())
    }
}

/// Runs workflow documents against a lazily launched session
pub struct TestRunner {
    config: RunnerConfig,
    launcher: Arc<dyn SessionLauncher>,
    registry: ActionRegistry,
    callbacks: RunCallbacks,
    session: Option<Arc<dyn BrowserSession>>,
    step_results: Vec<StepResult>,
}

impl TestRunner {
    /// Runner backed by Playwright
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_launcher(config, PlaywrightLauncher)
    }

    /// Runner backed by any session launcher
    pub fn with_launcher(config: RunnerConfig, launcher: impl SessionLauncher + 'static) -> Self {
        Self {
            config,
            launcher: Arc::new(launcher),
            registry: ActionRegistry::builtin(),
            callbacks: RunCallbacks::default(),
            session: None,
            step_results: Vec::new(),
        }
    }

    /// Replace the built-in action registry
    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_callbacks(mut self, callbacks: RunCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Launch the session if it is not running yet
    pub async fn initialize(&mut self) -> RunnerResult<()> {
        if self.session.is_some() {
            return Ok(());
        }

        info!("🚀 Launching {} (headless: {})", self.config.browser, self.config.headless);
        let session = self.launcher.launch(&self.config).await?;
        self.session = Some(session);
        Ok(())
    }

    /// Load the document if needed and run its main workflow
    pub async fn run_workflow(&mut self, source: impl Into<WorkflowSource>) -> TestResult {
        let started = Instant::now();
        self.step_results.clear();

        let loaded = match source.into() {
            WorkflowSource::Document(document) => document.validate().map(|_| document),
            WorkflowSource::Path(path) => WorkflowDocument::from_file(&path),
        };

        match loaded {
            Ok(document) => {
                let entry = document.main_workflow.clone();
                self.run(&document, &entry, started).await
            }
            Err(e) => self.finish(started, Err(e.into())),
        }
    }

    /// Run `entry` from an already loaded document
    pub async fn execute(&mut self, document: &WorkflowDocument, entry: &str) -> TestResult {
        let started = Instant::now();
        self.step_results.clear();
        self.run(document, entry, started).await
    }

    async fn run(&mut self, document: &WorkflowDocument, entry: &str, started: Instant) -> TestResult {
        if let Some(workflow) = document.workflow(entry) {
            info!("📋 Running workflow: {}", workflow.name);
        }
        if !document.custom_blocks.is_empty() {
            let names: Vec<&str> = document.custom_blocks.keys().map(String::as_str).collect();
            info!("🎨 Custom blocks available: {}", names.join(", "));
        }

        let session = match self.session().await {
            Ok(session) => session,
            Err(e) => return self.finish(started, Err(e)),
        };

        let mut engine = WorkflowEngine::new(document, &self.registry, session)
            .with_callbacks(self.callbacks.clone())
            .with_settle_delay(self.config.settle_delay());
        let outcome = engine.execute(entry).await;
        self.step_results = engine.into_results();

        self.finish(started, outcome)
    }

    fn finish(&self, started: Instant, outcome: RunnerResult<()>) -> TestResult {
        let duration = started.elapsed();
        match outcome {
            Ok(()) => {
                info!("🎉 All tests passed!");
                TestResult::passed(duration, self.step_results.clone())
            }
            Err(e) => {
                let message = e.to_string();
                error!("❌ Test failed: {}", message);
                TestResult::failed(duration, message, self.step_results.clone())
            }
        }
    }

    async fn session(&mut self) -> RunnerResult<Arc<dyn BrowserSession>> {
        self.initialize().await?;
        self.active_session()
    }

    fn active_session(&self) -> RunnerResult<Arc<dyn BrowserSession>> {
        self.session
            .clone()
            .ok_or_else(|| RunnerError::Session("Page not initialized".to_string()))
    }

    /// Close the session; the next run launches a new one
    pub async fn cleanup(&mut self) -> RunnerResult<()> {
        if let Some(session) = self.session.take() {
            session.close().await?;
            info!("🧹 Browser closed");
        }
        Ok(())
    }

    /// Results of the most recent run
    pub fn step_results(&self) -> &[StepResult] {
        &self.step_results
    }

    /// Capture the current page; defaults to `screenshots/screenshot-<millis>.png`
    pub async fn take_screenshot(&self, path: Option<&Path>) -> RunnerResult<PathBuf> {
        let session = self.active_session()?;
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from("screenshots").join(format!(
                "screenshot-{}.png",
                chrono::Utc::now().timestamp_millis()
            )),
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        session
            .screenshot(&ScreenshotOptions {
                path: path.clone(),
                full_page: true,
                quality: None,
            })
            .await?;
        Ok(path)
    }

    pub async fn current_url(&self) -> RunnerResult<String> {
        self.active_session()?.url().await
    }

    pub async fn page_title(&self) -> RunnerResult<String> {
        self.active_session()?.title().await
    }
}

/// Launch a Playwright session, run one document, and close the session
pub async fn run_workflow(source: impl Into<WorkflowSource>, config: RunnerConfig) -> TestResult {
    let mut runner = TestRunner::new(config);
    let result = runner.run_workflow(source).await;
    if let Err(e) = runner.cleanup().await {
        warn!("Failed to close browser: {}", e);
    }
    result
}
