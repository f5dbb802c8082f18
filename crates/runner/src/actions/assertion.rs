//! Page assertions

use async_trait::async_trait;
use tracing::info;

use stitch_common::Parameters;

use super::ELEMENT_TIMEOUT_MS;
use crate::error::{RunnerError, RunnerResult};
use crate::registry::Action;
use crate::session::{BrowserSession, ElementState};

pub struct ExpectTitle;

#[async_trait]
impl Action for ExpectTitle {
    fn name(&self) -> &'static str {
        "expectTitle"
    }

    fn description(&self) -> &'static str {
        "Assert the page title (exact by default)"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let expected = params.required_str(self.name(), "title")?;
        let exact = params.bool(self.name(), "exact")?.unwrap_or(true);

        let check = async {
            let actual = session.title().await?;
            info!("📋 Checking page title: \"{}\"", actual);

            let matches = if exact {
                actual == expected
            } else {
                actual.contains(&expected)
            };
            if !matches {
                return Err(RunnerError::ActionFailed(format!(
                    "Title mismatch. Expected: \"{}\", Actual: \"{}\"",
                    expected, actual
                )));
            }
            Ok(actual)
        };

        let actual = check
            .await
            .map_err(|e| RunnerError::action("Title assertion failed", e))?;
        info!("✅ Page title verified: \"{}\"", actual);
        Ok(())
    }
}

pub struct ExpectVisible;

#[async_trait]
impl Action for ExpectVisible {
    fn name(&self) -> &'static str {
        "expectVisible"
    }

    fn description(&self) -> &'static str {
        "Assert that an element becomes visible"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let selector = params.required_str(self.name(), "selector")?;
        let timeout = params.duration_ms(self.name(), "timeout", ELEMENT_TIMEOUT_MS)?;

        info!("👀 Checking visibility: {}", selector);
        session
            .wait_for_selector(&selector, ElementState::Visible, Some(timeout))
            .await
            .map_err(|e| RunnerError::action(format!("Element not visible \"{}\"", selector), e))?;
        info!("✅ Element is visible: {}", selector);
        Ok(())
    }
}

pub struct ExpectHidden;

#[async_trait]
impl Action for ExpectHidden {
    fn name(&self) -> &'static str {
        "expectHidden"
    }

    fn description(&self) -> &'static str {
        "Assert that an element is hidden or absent"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let selector = params.required_str(self.name(), "selector")?;
        let timeout = params.duration_ms(self.name(), "timeout", ELEMENT_TIMEOUT_MS)?;

        info!("🙈 Checking element is hidden: {}", selector);
        session
            .wait_for_selector(&selector, ElementState::Hidden, Some(timeout))
            .await
            .map_err(|e| RunnerError::action(format!("Element not hidden \"{}\"", selector), e))?;
        info!("✅ Element is hidden: {}", selector);
        Ok(())
    }
}

pub struct ExpectText;

#[async_trait]
impl Action for ExpectText {
    fn name(&self) -> &'static str {
        "expectText"
    }

    fn description(&self) -> &'static str {
        "Assert an element's text (substring by default)"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        params.require(self.name(), &["selector", "text"])?;
        let selector = params.required_str(self.name(), "selector")?;
        let expected = params.required_str(self.name(), "text")?;
        let exact = params.bool(self.name(), "exact")?.unwrap_or(false);

        info!("📝 Checking text in \"{}\": {}", selector, expected);
        let check = async {
            let actual = session
                .text_content(&selector)
                .await?
                .filter(|text| !text.is_empty())
                .ok_or_else(|| {
                    RunnerError::ActionFailed(format!(
                        "No text content found in element: {}",
                        selector
                    ))
                })?;

            let matches = if exact {
                actual.trim() == expected
            } else {
                actual.contains(&expected)
            };
            if matches {
                Ok(())
            } else {
                Err(RunnerError::ActionFailed(format!(
                    "Text mismatch in \"{}\". Expected: \"{}\", Actual: \"{}\"",
                    selector, expected, actual
                )))
            }
        };

        check
            .await
            .map_err(|e| RunnerError::action("Text assertion failed", e))?;
        info!("✅ Text verified in \"{}\": {}", selector, expected);
        Ok(())
    }
}

pub struct ExpectUrl;

#[async_trait]
impl Action for ExpectUrl {
    fn name(&self) -> &'static str {
        "expectUrl"
    }

    fn description(&self) -> &'static str {
        "Assert the current URL equals `url` or contains `pattern`"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let url = params.str("url").filter(|u| !u.is_empty());
        let pattern = params.str("pattern").filter(|p| !p.is_empty());
        if url.is_none() && pattern.is_none() {
            return Err(RunnerError::ActionFailed(
                "Either url or pattern parameter is required for expectUrl".to_string(),
            ));
        }

        let current = session
            .url()
            .await
            .map_err(|e| RunnerError::action("URL assertion failed", e))?;
        info!("🌐 Checking current URL: {}", current);

        let mismatch = match (url, pattern) {
            (Some(url), _) if current != url => Some(format!(
                "URL mismatch. Expected: \"{}\", Actual: \"{}\"",
                url, current
            )),
            (None, Some(pattern)) if !current.contains(&pattern) => Some(format!(
                "URL pattern not found. Pattern: \"{}\", Actual: \"{}\"",
                pattern, current
            )),
            _ => None,
        };

        if let Some(reason) = mismatch {
            return Err(RunnerError::action("URL assertion failed", reason));
        }
        info!("✅ URL verified: {}", current);
        Ok(())
    }
}
