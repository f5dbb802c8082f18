//! Explicit waits

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use stitch_common::Parameters;

use super::WAIT_TIMEOUT_MS;
use crate::error::{RunnerError, RunnerResult};
use crate::registry::Action;
use crate::session::{parse_state, BrowserSession, ElementState, LoadState, NetworkEvent};

pub struct Wait;

#[async_trait]
impl Action for Wait {
    fn name(&self) -> &'static str {
        "wait"
    }

    fn description(&self) -> &'static str {
        "Pause for a fixed number of milliseconds"
    }

    async fn run(&self, _session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        params.require(self.name(), &["ms"])?;
        let ms = params.i64(self.name(), "ms")?.unwrap_or_default();
        if ms < 0 {
            return Err(RunnerError::ActionFailed(
                "Wait time must be positive".to_string(),
            ));
        }

        info!("⏱️ Waiting for {}ms", ms);
        tokio::time::sleep(Duration::from_millis(ms as u64)).await;
        info!("✅ Wait completed");
        Ok(())
    }
}

pub struct WaitForSelector;

#[async_trait]
impl Action for WaitForSelector {
    fn name(&self) -> &'static str {
        "waitForSelector"
    }

    fn description(&self) -> &'static str {
        "Wait for an element to reach a state (visible, hidden, attached, detached)"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let selector = params.required_str(self.name(), "selector")?;
        let state: ElementState = match params.str("state").filter(|s| !s.is_empty()) {
            Some(state) => parse_state(self.name(), &state)?,
            None => ElementState::default(),
        };
        let timeout = params.duration_ms(self.name(), "timeout", WAIT_TIMEOUT_MS)?;

        info!("⏳ Waiting for selector \"{}\" to be {}", selector, state);
        session
            .wait_for_selector(&selector, state, Some(timeout))
            .await
            .map_err(|e| {
                RunnerError::action(format!("Wait for selector failed \"{}\"", selector), e)
            })?;
        info!("✅ Selector \"{}\" is {}", selector, state);
        Ok(())
    }
}

pub struct WaitForLoadState;

#[async_trait]
impl Action for WaitForLoadState {
    fn name(&self) -> &'static str {
        "waitForLoadState"
    }

    fn description(&self) -> &'static str {
        "Wait for load, domcontentloaded or networkidle"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let state: LoadState = match params.str("state").filter(|s| !s.is_empty()) {
            Some(state) => parse_state(self.name(), &state)?,
            None => LoadState::default(),
        };
        let timeout = params.duration_ms(self.name(), "timeout", WAIT_TIMEOUT_MS)?;

        info!("⏳ Waiting for load state: {}", state);
        session
            .wait_for_load_state(state, Some(timeout))
            .await
            .map_err(|e| RunnerError::action("Wait for load state failed", e))?;
        info!("✅ Load state reached: {}", state);
        Ok(())
    }
}

/// `waitForRequest` / `waitForResponse`
pub struct WaitForNetwork {
    event: NetworkEvent,
}

impl WaitForNetwork {
    pub fn request() -> Self {
        Self {
            event: NetworkEvent::Request,
        }
    }

    pub fn response() -> Self {
        Self {
            event: NetworkEvent::Response,
        }
    }
}

#[async_trait]
impl Action for WaitForNetwork {
    fn name(&self) -> &'static str {
        match self.event {
            NetworkEvent::Request => "waitForRequest",
            NetworkEvent::Response => "waitForResponse",
        }
    }

    fn description(&self) -> &'static str {
        match self.event {
            NetworkEvent::Request => "Wait for a request whose URL contains a pattern",
            NetworkEvent::Response => "Wait for a response whose URL contains a pattern",
        }
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let pattern = params.required_str(self.name(), "urlOrPredicate")?;
        let timeout = params.duration_ms(self.name(), "timeout", WAIT_TIMEOUT_MS)?;
        let kind = match self.event {
            NetworkEvent::Request => "request",
            NetworkEvent::Response => "response",
        };

        info!("⏳ Waiting for {}: {}", kind, pattern);
        session
            .wait_for_network(self.event, &pattern, Some(timeout))
            .await
            .map_err(|e| RunnerError::action(format!("Wait for {} failed", kind), e))?;
        info!("✅ {} matched: {}", kind, pattern);
        Ok(())
    }
}
