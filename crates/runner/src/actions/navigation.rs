//! Page navigation

use async_trait::async_trait;
use tracing::info;

use stitch_common::Parameters;

use crate::error::{RunnerError, RunnerResult};
use crate::registry::Action;
use crate::session::{BrowserSession, LoadState};

/// Navigate and wait for the network to go quiet
async fn navigate(session: &dyn BrowserSession, url: &str) -> RunnerResult<()> {
    session.goto(url).await?;
    session.wait_for_load_state(LoadState::NetworkIdle, None).await
}

pub struct Goto;

#[async_trait]
impl Action for Goto {
    fn name(&self) -> &'static str {
        "goto"
    }

    fn description(&self) -> &'static str {
        "Navigate to a URL and wait for network idle"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let url = params.required_str(self.name(), "url")?;

        info!("🌐 Navigating to: {}", url);
        navigate(session, &url)
            .await
            .map_err(|e| RunnerError::action(format!("Failed to navigate to \"{}\"", url), e))?;
        info!("✅ Successfully navigated to: {}", url);
        Ok(())
    }
}

pub struct NavigateToPage;

#[async_trait]
impl Action for NavigateToPage {
    fn name(&self) -> &'static str {
        "navigateToPage"
    }

    fn description(&self) -> &'static str {
        "Navigate to a path on the current origin"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let path = params
            .str("path")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string());

        let url = if path.starts_with("http") {
            path
        } else {
            let base = match params.str("baseUrl").filter(|b| !b.is_empty()) {
                Some(base) => base,
                None => origin(&session.url().await?),
            };
            format!("{}{}", base, path)
        };

        navigate(session, &url)
            .await
            .map_err(|e| RunnerError::action(format!("Failed to navigate to \"{}\"", url), e))?;
        info!("✅ Successfully navigated to: {}", url);
        Ok(())
    }
}

/// `scheme://host[:port]` part of a URL
fn origin(url: &str) -> String {
    url.splitn(4, '/').take(3).collect::<Vec<_>>().join("/")
}
