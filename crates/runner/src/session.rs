//! Browser session abstraction
//!
//! A session is one live browser with exactly one current page. Actions and
//! custom blocks only ever talk to the browser through this trait; the
//! runner decides which implementation backs it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};

/// Element state to wait for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// Page load state to wait for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

/// Network event kinds a session can wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkEvent {
    Request,
    Response,
}

/// How to pick a tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabTarget {
    Index(usize),
    /// First tab whose URL contains the string
    Url(String),
    /// First tab whose title contains the string
    Title(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOptions {
    pub path: PathBuf,
    pub full_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

impl ScreenshotOptions {
    /// JPEG when the path ends in `.jpg`/`.jpeg`, PNG otherwise
    pub fn format(&self) -> &'static str {
        match self.path.extension().and_then(|e| e.to_str()) {
            Some("jpg") | Some("jpeg") => "jpeg",
            _ => "png",
        }
    }
}

impl ElementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
            ElementState::Attached => "attached",
            ElementState::Detached => "detached",
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visible" => Ok(ElementState::Visible),
            "hidden" => Ok(ElementState::Hidden),
            "attached" => Ok(ElementState::Attached),
            "detached" => Ok(ElementState::Detached),
            other => Err(format!(
                "unknown state '{}' (expected one of: visible, hidden, attached, detached)",
                other
            )),
        }
    }
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(LoadState::Load),
            "domcontentloaded" => Ok(LoadState::DomContentLoaded),
            "networkidle" => Ok(LoadState::NetworkIdle),
            other => Err(format!(
                "unknown state '{}' (expected one of: load, domcontentloaded, networkidle)",
                other
            )),
        }
    }
}

/// One live browser session.
///
/// `timeout: None` means the session-wide default configured at launch.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the current page; relative URLs resolve against the current page
    async fn goto(&self, url: &str) -> RunnerResult<()>;

    async fn wait_for_load_state(&self, state: LoadState, timeout: Option<Duration>) -> RunnerResult<()>;

    async fn wait_for_selector(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Option<Duration>,
    ) -> RunnerResult<()>;

    async fn click(&self, selector: &str, timeout: Option<Duration>) -> RunnerResult<()>;

    async fn fill(&self, selector: &str, value: &str, timeout: Option<Duration>) -> RunnerResult<()>;

    /// Type character by character with a delay between keys
    async fn type_text(&self, selector: &str, text: &str, delay: Duration) -> RunnerResult<()>;

    /// Press a key on an element, or on the page when no selector is given
    async fn press(&self, selector: Option<&str>, key: &str) -> RunnerResult<()>;

    async fn hover(&self, selector: &str) -> RunnerResult<()>;

    async fn title(&self) -> RunnerResult<String>;

    async fn url(&self) -> RunnerResult<String>;

    async fn text_content(&self, selector: &str) -> RunnerResult<Option<String>>;

    async fn screenshot(&self, options: &ScreenshotOptions) -> RunnerResult<()>;

    /// Evaluate a script in the current page and return its JSON result
    async fn evaluate(&self, script: &str, arg: Value) -> RunnerResult<Value>;

    /// Open a tab, make it current, and return the number of open tabs
    async fn open_tab(&self, url: Option<&str>) -> RunnerResult<usize>;

    async fn switch_tab(&self, target: &TabTarget) -> RunnerResult<()>;

    /// Close a tab (the current one when `None`) and return the remaining count
    async fn close_tab(&self, index: Option<usize>) -> RunnerResult<usize>;

    async fn save_storage_state(&self, path: &Path) -> RunnerResult<()>;

    async fn load_storage_state(&self, path: &Path) -> RunnerResult<()>;

    /// Wait for a request or response whose URL contains `pattern`
    async fn wait_for_network(
        &self,
        event: NetworkEvent,
        pattern: &str,
        timeout: Option<Duration>,
    ) -> RunnerResult<()>;

    /// Tear the browser down; further calls fail
    async fn close(&self) -> RunnerResult<()>;
}

/// Creates sessions for a runner
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, config: &RunnerConfig) -> RunnerResult<Arc<dyn BrowserSession>>;
}

/// Parse a state name parameter into an [`ElementState`] or [`LoadState`]
pub(crate) fn parse_state<T: FromStr<Err = String>>(action: &str, value: &str) -> RunnerResult<T> {
    value.parse::<T>().map_err(|reason| {
        RunnerError::Document(stitch_common::Error::InvalidParameter {
            action: action.to_string(),
            name: "state".to_string(),
            reason,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names_round_trip_serde() {
        assert_eq!(
            serde_json::to_string(&LoadState::NetworkIdle).unwrap(),
            "\"networkidle\""
        );
        assert_eq!("networkidle".parse::<LoadState>().unwrap(), LoadState::NetworkIdle);
        assert_eq!(ElementState::Detached.to_string(), "detached");
    }

    #[test]
    fn test_parse_state_error_names_action() {
        let err = parse_state::<ElementState>("waitForSelector", "shiny").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("waitForSelector"));
        assert!(msg.contains("visible, hidden, attached, detached"));
    }

    #[test]
    fn test_screenshot_format() {
        let opts = ScreenshotOptions {
            path: PathBuf::from("shots/home.jpg"),
            full_page: true,
            quality: Some(80),
        };
        assert_eq!(opts.format(), "jpeg");
    }
}
