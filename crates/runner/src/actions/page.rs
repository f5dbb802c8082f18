//! Whole-page actions: screenshots, script evaluation, auth state

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

use stitch_common::Parameters;

use crate::error::{RunnerError, RunnerResult};
use crate::registry::Action;
use crate::session::{BrowserSession, ScreenshotOptions};

const DEFAULT_AUTH_STATE_PATH: &str = "./auth-state.json";

pub struct Screenshot;

#[async_trait]
impl Action for Screenshot {
    fn name(&self) -> &'static str {
        "screenshot"
    }

    fn description(&self) -> &'static str {
        "Capture the page to a PNG or JPEG file"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let path = params
            .str("path")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                PathBuf::from(format!("screenshot-{}.png", chrono::Utc::now().timestamp_millis()))
            });
        let full_page = params.bool(self.name(), "fullPage")?.unwrap_or(true);
        let quality = params
            .u64(self.name(), "quality")?
            .map(|q| q.min(100) as u8);

        let options = ScreenshotOptions {
            path,
            full_page,
            quality,
        };

        info!("📸 Taking screenshot: {}", options.path.display());
        async {
            if let Some(dir) = options.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir).await?;
            }
            session.screenshot(&options).await
        }
        .await
        .map_err(|e| RunnerError::action("Failed to take screenshot", e))?;
        info!("✅ Screenshot saved: {}", options.path.display());
        Ok(())
    }
}

pub struct ExecuteJavaScript;

#[async_trait]
impl Action for ExecuteJavaScript {
    fn name(&self) -> &'static str {
        "executeJavaScript"
    }

    fn description(&self) -> &'static str {
        "Evaluate a JavaScript expression in the page and log its result"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let code = params.required_str(self.name(), "code")?;
        let args = params.value("args").cloned().unwrap_or(Value::Null);

        info!("🔧 Executing JavaScript");
        debug!("Script: {}", code);
        let result = session
            .evaluate(&code, args)
            .await
            .map_err(|e| RunnerError::action("Failed to execute JavaScript", e))?;
        info!("🔧 JavaScript result: {}", result);
        Ok(())
    }
}

pub struct SaveAuthState;

#[async_trait]
impl Action for SaveAuthState {
    fn name(&self) -> &'static str {
        "saveAuthState"
    }

    fn description(&self) -> &'static str {
        "Save cookies and local storage to a JSON file"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let path = PathBuf::from(
            params
                .str("path")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_AUTH_STATE_PATH.to_string()),
        );

        info!("🔐 Saving authentication state to: {}", path.display());
        session
            .save_storage_state(&path)
            .await
            .map_err(|e| RunnerError::action("Failed to save auth state", e))?;
        info!("✅ Authentication state saved");
        Ok(())
    }
}

pub struct LoadAuthState;

#[async_trait]
impl Action for LoadAuthState {
    fn name(&self) -> &'static str {
        "loadAuthState"
    }

    fn description(&self) -> &'static str {
        "Restore cookies and local storage from a saved JSON file"
    }

    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()> {
        let path = PathBuf::from(params.required_str(self.name(), "path")?);

        info!("🔐 Loading authentication state from: {}", path.display());
        session
            .load_storage_state(&path)
            .await
            .map_err(|e| RunnerError::action("Failed to load auth state", e))?;
        info!("✅ Authentication state loaded");
        Ok(())
    }
}
