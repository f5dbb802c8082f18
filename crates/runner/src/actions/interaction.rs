//! Element interaction: click, fill, type, press, hover

use async_trait::async_trait;
use tracing::info;

use stitch_common::Parameters;

use super::ELEMENT_TIMEOUT_MS;
use crate::error::{RunnerError, RunnerResult};
use crate::registry::Action;
use crate::session::{BrowserSession, ElementState};

/// Default delay between keystrokes for `type`
const TYPE_DELAY_MS: u64 = 100;

pub struct Click;

#[async_trait]
impl Action for Click {
    fn name(&self) -> &'static str {
        "click"
    }

    fn description(&self) -> &'static str {
        "Wait for an element to be visible, then click it"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let selector = params.required_str(self.name(), "selector")?;
        let timeout = params.duration_ms(self.name(), "timeout", ELEMENT_TIMEOUT_MS)?;

        info!("🖱️ Clicking: {}", selector);
        async {
            session
                .wait_for_selector(&selector, ElementState::Visible, Some(timeout))
                .await?;
            session.click(&selector, Some(timeout)).await
        }
        .await
        .map_err(|e| RunnerError::action(format!("Failed to click \"{}\"", selector), e))?;
        info!("✅ Successfully clicked: {}", selector);
        Ok(())
    }
}

pub struct Fill;

#[async_trait]
impl Action for Fill {
    fn name(&self) -> &'static str {
        "fill"
    }

    fn description(&self) -> &'static str {
        "Replace the value of an input field"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        params.require(self.name(), &["selector", "value"])?;
        let selector = params.required_str(self.name(), "selector")?;
        let value = params.required_str(self.name(), "value")?;
        let timeout = params.duration_ms(self.name(), "timeout", ELEMENT_TIMEOUT_MS)?;

        info!("📝 Filling \"{}\" with: {}", selector, value);
        async {
            session
                .wait_for_selector(&selector, ElementState::Visible, Some(timeout))
                .await?;
            session.fill(&selector, &value, Some(timeout)).await
        }
        .await
        .map_err(|e| RunnerError::action(format!("Failed to fill \"{}\"", selector), e))?;
        info!("✅ Successfully filled: {}", selector);
        Ok(())
    }
}

pub struct Type;

#[async_trait]
impl Action for Type {
    fn name(&self) -> &'static str {
        "type"
    }

    fn description(&self) -> &'static str {
        "Type text into an element one key at a time"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        params.require(self.name(), &["selector", "text"])?;
        let selector = params.required_str(self.name(), "selector")?;
        let text = params.required_str(self.name(), "text")?;
        let delay = params.duration_ms(self.name(), "delay", TYPE_DELAY_MS)?;
        let timeout = params.duration_ms(self.name(), "timeout", ELEMENT_TIMEOUT_MS)?;

        info!("⌨️ Typing in \"{}\": {}", selector, text);
        async {
            session
                .wait_for_selector(&selector, ElementState::Visible, Some(timeout))
                .await?;
            session.type_text(&selector, &text, delay).await
        }
        .await
        .map_err(|e| RunnerError::action(format!("Failed to type in \"{}\"", selector), e))?;
        info!("✅ Successfully typed in: {}", selector);
        Ok(())
    }
}

pub struct Press;

#[async_trait]
impl Action for Press {
    fn name(&self) -> &'static str {
        "press"
    }

    fn description(&self) -> &'static str {
        "Press a key on an element or on the page"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let key = params.required_str(self.name(), "key")?;
        let selector = params.str("selector").filter(|s| !s.trim().is_empty());

        info!("⌨️ Pressing {}", key);
        session
            .press(selector.as_deref(), &key)
            .await
            .map_err(|e| RunnerError::action(format!("Failed to press \"{}\"", key), e))
    }
}

pub struct Hover;

#[async_trait]
impl Action for Hover {
    fn name(&self) -> &'static str {
        "hover"
    }

    fn description(&self) -> &'static str {
        "Move the mouse over an element"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let selector = params.required_str(self.name(), "selector")?;

        session
            .hover(&selector)
            .await
            .map_err(|e| RunnerError::action(format!("Failed to hover \"{}\"", selector), e))
    }
}
