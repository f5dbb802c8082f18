//! In-memory session used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stitch_common::WorkflowDocument;
use stitch_runner::{
    BrowserSession, ElementState, LoadState, NetworkEvent, RunnerConfig, RunnerError,
    RunnerResult, ScreenshotOptions, SessionLauncher, TabTarget,
};

/// Records every session call as a line like `click #go`
#[derive(Default)]
pub struct RecordingSession {
    ops: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    texts: Mutex<HashMap<String, String>>,
    title: Mutex<String>,
    url: Mutex<String>,
    tabs: AtomicUsize,
}

impl RecordingSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::blank())
    }

    pub fn blank() -> Self {
        let session = Self::default();
        *session.url.lock() = "about:blank".to_string();
        session.tabs.store(1, Ordering::SeqCst);
        session
    }

    /// Operations on `selector` time out
    pub fn failing(self, selector: &str) -> Self {
        self.failing.lock().insert(selector.to_string());
        self
    }

    pub fn titled(self, title: &str) -> Self {
        *self.title.lock() = title.to_string();
        self
    }

    pub fn at(self, url: &str) -> Self {
        *self.url.lock() = url.to_string();
        self
    }

    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.texts.lock().insert(selector.to_string(), text.to_string());
        self
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }

    fn record(&self, op: String) {
        self.ops.lock().push(op);
    }

    fn check(&self, selector: &str, timeout: Option<Duration>) -> RunnerResult<()> {
        if self.failing.lock().contains(selector) {
            return Err(RunnerError::Session(format!(
                "Timeout {} exceeded waiting for {}",
                ms(timeout),
                selector
            )));
        }
        Ok(())
    }
}

fn ms(timeout: Option<Duration>) -> String {
    match timeout {
        Some(t) => format!("{}ms", t.as_millis()),
        None => "default".to_string(),
    }
}

#[async_trait]
impl BrowserSession for RecordingSession {
    async fn goto(&self, url: &str) -> RunnerResult<()> {
        self.record(format!("goto {}", url));
        *self.url.lock() = url.to_string();
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Option<Duration>) -> RunnerResult<()> {
        self.record(format!("wait_for_load_state {} {}", state, ms(timeout)));
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Option<Duration>,
    ) -> RunnerResult<()> {
        self.record(format!("wait_for_selector {} {} {}", selector, state, ms(timeout)));
        self.check(selector, timeout)
    }

    async fn click(&self, selector: &str, timeout: Option<Duration>) -> RunnerResult<()> {
        self.record(format!("click {}", selector));
        self.check(selector, timeout)
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Option<Duration>) -> RunnerResult<()> {
        self.record(format!("fill {} {}", selector, value));
        self.check(selector, timeout)
    }

    async fn type_text(&self, selector: &str, text: &str, delay: Duration) -> RunnerResult<()> {
        self.record(format!("type_text {} {} {}ms", selector, text, delay.as_millis()));
        self.check(selector, None)
    }

    async fn press(&self, selector: Option<&str>, key: &str) -> RunnerResult<()> {
        self.record(format!("press {} {}", selector.unwrap_or("page"), key));
        Ok(())
    }

    async fn hover(&self, selector: &str) -> RunnerResult<()> {
        self.record(format!("hover {}", selector));
        self.check(selector, None)
    }

    async fn title(&self) -> RunnerResult<String> {
        self.record("title".to_string());
        Ok(self.title.lock().clone())
    }

    async fn url(&self) -> RunnerResult<String> {
        self.record("url".to_string());
        Ok(self.url.lock().clone())
    }

    async fn text_content(&self, selector: &str) -> RunnerResult<Option<String>> {
        self.record(format!("text_content {}", selector));
        self.check(selector, None)?;
        Ok(self.texts.lock().get(selector).cloned())
    }

    async fn screenshot(&self, options: &ScreenshotOptions) -> RunnerResult<()> {
        self.record(format!(
            "screenshot {} {} fullPage={}",
            options.path.display(),
            options.format(),
            options.full_page
        ));
        Ok(())
    }

    async fn evaluate(&self, script: &str, arg: Value) -> RunnerResult<Value> {
        self.record(format!("evaluate {} {}", script, arg));
        Ok(Value::Null)
    }

    async fn open_tab(&self, url: Option<&str>) -> RunnerResult<usize> {
        self.record(format!("open_tab {}", url.unwrap_or("blank")));
        Ok(self.tabs.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn switch_tab(&self, target: &TabTarget) -> RunnerResult<()> {
        self.record(format!("switch_tab {:?}", target));
        Ok(())
    }

    async fn close_tab(&self, index: Option<usize>) -> RunnerResult<usize> {
        match index {
            Some(i) => self.record(format!("close_tab {}", i)),
            None => self.record("close_tab current".to_string()),
        }
        Ok(self.tabs.fetch_sub(1, Ordering::SeqCst).saturating_sub(1))
    }

    async fn save_storage_state(&self, path: &Path) -> RunnerResult<()> {
        self.record(format!("save_storage_state {}", path.display()));
        Ok(())
    }

    async fn load_storage_state(&self, path: &Path) -> RunnerResult<()> {
        self.record(format!("load_storage_state {}", path.display()));
        Ok(())
    }

    async fn wait_for_network(
        &self,
        event: NetworkEvent,
        pattern: &str,
        timeout: Option<Duration>,
    ) -> RunnerResult<()> {
        self.record(format!("wait_for_network {:?} {} {}", event, pattern, ms(timeout)));
        Ok(())
    }

    async fn close(&self) -> RunnerResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Hands out the same recording session on every launch
pub struct FixedLauncher {
    pub session: Arc<RecordingSession>,
    pub launches: Arc<AtomicUsize>,
}

impl FixedLauncher {
    pub fn new(session: Arc<RecordingSession>) -> Self {
        Self {
            session,
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SessionLauncher for FixedLauncher {
    async fn launch(&self, _config: &RunnerConfig) -> RunnerResult<Arc<dyn BrowserSession>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let session: Arc<dyn BrowserSession> = self.session.clone();
        Ok(session)
    }
}

/// Launcher standing in for a machine without Node.js
pub struct UnavailableLauncher;

#[async_trait]
impl SessionLauncher for UnavailableLauncher {
    async fn launch(&self, _config: &RunnerConfig) -> RunnerResult<Arc<dyn BrowserSession>> {
        Err(RunnerError::DriverUnavailable("node not found".to_string()))
    }
}

/// Runner config without the per-step settle pause
pub fn fast_config() -> RunnerConfig {
    RunnerConfig {
        settle_delay_ms: 0,
        ..Default::default()
    }
}

pub fn document(value: Value) -> WorkflowDocument {
    serde_json::from_value(value).expect("valid test document")
}
