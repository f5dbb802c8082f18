//! Workflow execution engine
//!
//! Walks a workflow step by step against one shared session. Each step is
//! resolved in a fixed order: `callWorkflow`, then the document's custom
//! blocks, then the built-in registry. Nested workflows share the session
//! and append to the same result list; the first failure aborts the run.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

use stitch_common::{Step, StepResult, WorkflowDocument, CALL_WORKFLOW};

use crate::config::RunnerConfig;
use crate::custom::CustomBlockExecutor;
use crate::error::{RunnerError, RunnerResult};
use crate::registry::ActionRegistry;
use crate::reporter::{Progress, Reporter, RunCallbacks};
use crate::session::{BrowserSession, LoadState};

/// Executes one document against one session
pub struct WorkflowEngine<'a> {
    document: &'a WorkflowDocument,
    registry: &'a ActionRegistry,
    session: Arc<dyn BrowserSession>,
    custom: CustomBlockExecutor,
    reporter: Reporter,
    settle_delay: Duration,
    /// Workflows currently executing, outermost first
    call_stack: Vec<String>,
}

impl<'a> WorkflowEngine<'a> {
    pub fn new(
        document: &'a WorkflowDocument,
        registry: &'a ActionRegistry,
        session: Arc<dyn BrowserSession>,
    ) -> Self {
        Self {
            document,
            registry,
            custom: CustomBlockExecutor::new(session.clone()),
            session,
            reporter: Reporter::default(),
            settle_delay: RunnerConfig::default().settle_delay(),
            call_stack: Vec::new(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: RunCallbacks) -> Self {
        self.reporter = Reporter::new(callbacks);
        self
    }

    /// Pause after each successful step; not counted in its duration
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Navigate to the document's base URL, then run `entry`
    pub async fn execute(&mut self, entry: &str) -> RunnerResult<()> {
        if let Some(base_url) = self.document.base_url.as_deref() {
            info!("🌐 Base URL: {}", base_url);
            self.session.goto(base_url).await?;
            self.session
                .wait_for_load_state(LoadState::NetworkIdle, None)
                .await?;
        }
        self.run_workflow(entry, 0).await
    }

    pub fn results(&self) -> &[StepResult] {
        self.reporter.results()
    }

    pub fn into_results(self) -> Vec<StepResult> {
        self.reporter.into_results()
    }

    fn run_workflow<'s>(&'s mut self, id: &'s str, depth: usize) -> BoxFuture<'s, RunnerResult<()>> {
        Box::pin(async move {
            let document: &'a WorkflowDocument = self.document;
            let workflow = document
                .workflow(id)
                .ok_or_else(|| RunnerError::UnknownWorkflow(id.to_string()))?;

            if self.call_stack.iter().any(|active| active == id) {
                let mut chain = self.call_stack.clone();
                chain.push(id.to_string());
                return Err(RunnerError::CircularWorkflow { chain });
            }

            let indent = "  ".repeat(depth);
            info!(
                "{}🔄 Executing: {} ({} steps)",
                indent,
                workflow.name,
                workflow.workflow.len()
            );

            self.call_stack.push(id.to_string());
            let total = workflow.workflow.len();
            let mut outcome = Ok(());
            for (index, step) in workflow.workflow.iter().enumerate() {
                if let Err(e) = self.run_step(step, index + 1, total, depth).await {
                    outcome = Err(e);
                    break;
                }
            }
            self.call_stack.pop();
            outcome?;

            info!("{}✅ Workflow completed: {}", indent, workflow.name);
            Ok(())
        })
    }

    async fn run_step(
        &mut self,
        step: &'a Step,
        number: usize,
        total: usize,
        depth: usize,
    ) -> RunnerResult<()> {
        let indent = "  ".repeat(depth);
        let running = StepResult::running(number, step.block.as_str());
        self.reporter.step_started(
            &running,
            Progress {
                current: number,
                total,
            },
        );
        info!("{}  {}. {}", indent, number, step.block);

        let started = Instant::now();
        let outcome = self.dispatch(step, depth, &indent).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(()) => {
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                self.reporter.step_finished(running.succeeded(elapsed));
                info!("{}     ✅ Completed ({}ms)", indent, elapsed.as_millis());
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                error!("{}     ❌ Failed: {} ({}ms)", indent, message, elapsed.as_millis());
                self.reporter.step_finished(running.failed(elapsed, message));
                Err(e)
            }
        }
    }

    async fn dispatch(&mut self, step: &'a Step, depth: usize, indent: &str) -> RunnerResult<()> {
        if step.block == CALL_WORKFLOW {
            let target = step.called_workflow().ok_or_else(|| {
                stitch_common::Error::MissingParameters {
                    action: CALL_WORKFLOW.to_string(),
                    names: vec!["workflowId".to_string()],
                }
            })?;
            info!("{}     🔗 Calling workflow: {}", indent, target);
            return self.run_workflow(&target, depth + 1).await;
        }

        if let Some(block) = self.document.custom_block(&step.block) {
            info!("{}     🎨 Executing custom block: {}", indent, block.name);
            debug!("{}     📋 Step parameters: {:?}", indent, step.parameters.as_map());
            return self.custom.run(block, &step.parameters).await;
        }

        match self.registry.get(&step.block) {
            Some(action) => action.run(self.session.as_ref(), &step.parameters).await,
            None => {
                error!("{}     ❌ Block '{}' not found", indent, step.block);
                debug!(
                    "{}     📋 Available built-in blocks: {}",
                    indent,
                    self.registry.names().join(", ")
                );
                Err(RunnerError::UnknownBlock {
                    block: step.block.clone(),
                    available: self.available_blocks(),
                })
            }
        }
    }

    /// Built-in names followed by the document's custom block names
    fn available_blocks(&self) -> Vec<String> {
        self.registry
            .names()
            .into_iter()
            .map(str::to_string)
            .chain(self.document.custom_blocks.keys().cloned())
            .collect()
    }
}
