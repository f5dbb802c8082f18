//! Tab management

use async_trait::async_trait;
use tracing::info;

use stitch_common::Parameters;

use crate::error::{RunnerError, RunnerResult};
use crate::registry::Action;
use crate::session::{BrowserSession, TabTarget};

pub struct OpenNewTab;

#[async_trait]
impl Action for OpenNewTab {
    fn name(&self) -> &'static str {
        "openNewTab"
    }

    fn description(&self) -> &'static str {
        "Open a tab, optionally at a URL, and make it current"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let url = params.str("url").filter(|u| !u.is_empty());

        match &url {
            Some(url) => info!("🗂️ Opening new tab with URL: {}", url),
            None => info!("🗂️ Opening new tab"),
        }
        let total = session
            .open_tab(url.as_deref())
            .await
            .map_err(|e| RunnerError::action("Failed to open new tab", e))?;
        info!("✅ New tab opened (Total tabs: {})", total);
        Ok(())
    }
}

pub struct SwitchToTab;

#[async_trait]
impl Action for SwitchToTab {
    fn name(&self) -> &'static str {
        "switchToTab"
    }

    fn description(&self) -> &'static str {
        "Bring a tab to the front by index, URL or title"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let target = if let Some(index) = params.u64(self.name(), "index")? {
            TabTarget::Index(index as usize)
        } else if let Some(url) = params.str("url").filter(|u| !u.is_empty()) {
            TabTarget::Url(url)
        } else if let Some(title) = params.str("title").filter(|t| !t.is_empty()) {
            TabTarget::Title(title)
        } else {
            return Err(RunnerError::ActionFailed(
                "Either index, url, or title is required for switchToTab".to_string(),
            ));
        };

        info!("🗂️ Switching to tab: {:?}", target);
        session
            .switch_tab(&target)
            .await
            .map_err(|e| RunnerError::action("Failed to switch tab", e))?;
        info!("✅ Successfully switched to tab");
        Ok(())
    }
}

pub struct CloseTab;

#[async_trait]
impl Action for CloseTab {
    fn name(&self) -> &'static str {
        "closeTab"
    }

    fn description(&self) -> &'static str {
        "Close the current tab or the tab at an index"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let current = params.bool(self.name(), "current")?.unwrap_or(false);
        let index = if current {
            None
        } else {
            params.u64(self.name(), "index")?.map(|i| i as usize)
        };

        match index {
            Some(i) => info!("🗂️ Closing tab at index: {}", i),
            None => info!("🗂️ Closing current tab"),
        }
        let remaining = session
            .close_tab(index)
            .await
            .map_err(|e| RunnerError::action("Failed to close tab", e))?;
        info!("✅ Tab closed (Remaining tabs: {})", remaining);
        Ok(())
    }
}
