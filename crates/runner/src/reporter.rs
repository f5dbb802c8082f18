//! Step result recording and run observers

use std::fmt;
use std::sync::Arc;

use stitch_common::StepResult;

/// Position of the running step within the active workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based step number
    pub current: usize,
    /// Step count of the workflow the step belongs to
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.current * 100) / self.total).min(100) as u8
    }
}

pub type StepCallback = Arc<dyn Fn(&StepResult) + Send + Sync>;
pub type ProgressCallback = Arc<dyn Fn(Progress, &StepResult) + Send + Sync>;

/// Optional observers of a run. Missing slots are no-ops.
#[derive(Clone, Default)]
pub struct RunCallbacks {
    on_step_start: Option<StepCallback>,
    on_step_complete: Option<StepCallback>,
    on_progress: Option<ProgressCallback>,
}

impl RunCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with a `running` result before each step starts
    pub fn on_step_start(mut self, f: impl Fn(&StepResult) + Send + Sync + 'static) -> Self {
        self.on_step_start = Some(Arc::new(f));
        self
    }

    /// Called with the final `success`/`failed` result of each step
    pub fn on_step_complete(mut self, f: impl Fn(&StepResult) + Send + Sync + 'static) -> Self {
        self.on_step_complete = Some(Arc::new(f));
        self
    }

    /// Called before each step with its position and its `running` result
    pub fn on_progress(
        mut self,
        f: impl Fn(Progress, &StepResult) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for RunCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunCallbacks")
            .field("on_step_start", &self.on_step_start.is_some())
            .field("on_step_complete", &self.on_step_complete.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Ordered list of finished steps plus observer fan-out
#[derive(Debug, Default)]
pub struct Reporter {
    results: Vec<StepResult>,
    callbacks: RunCallbacks,
}

impl Reporter {
    pub fn new(callbacks: RunCallbacks) -> Self {
        Self {
            results: Vec::new(),
            callbacks,
        }
    }

    pub fn step_started(&self, running: &StepResult, progress: Progress) {
        if let Some(cb) = &self.callbacks.on_step_start {
            cb(running);
        }
        if let Some(cb) = &self.callbacks.on_progress {
            cb(progress, running);
        }
    }

    /// Append a finished step and notify observers
    pub fn step_finished(&mut self, result: StepResult) {
        if let Some(cb) = &self.callbacks.on_step_complete {
            cb(&result);
        }
        self.results.push(result);
    }

    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<StepResult> {
        self.results
    }
}
