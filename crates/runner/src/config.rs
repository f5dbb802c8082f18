//! Runner configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RunnerError, RunnerResult};

/// Browser engine to launch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(RunnerError::InvalidConfig(format!(
                "unknown browser '{}' (expected chromium, firefox or webkit)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Configuration for a test runner and the session it launches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Launch the browser without a window
    pub headless: bool,

    /// Browser engine
    pub browser: Browser,

    /// Default timeout for session operations, in milliseconds
    pub timeout_ms: u64,

    /// Accept invalid TLS certificates
    pub ignore_https_errors: bool,

    /// Verbose logging; opens devtools when not headless
    pub debug: bool,

    /// Pause after each successful step, in milliseconds
    pub settle_delay_ms: u64,

    /// Page viewport
    pub viewport: Viewport,

    /// Node.js executable used to host the Playwright driver
    pub node_binary: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            headless: true,
            browser: Browser::Chromium,
            timeout_ms: 30_000,
            ignore_https_errors: false,
            debug: false,
            settle_delay_ms: 200,
            viewport: Viewport::default(),
            node_binary: PathBuf::from("node"),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> RunnerResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `HEADLESS`, `IGNORE_HTTPS_ERRORS` and `DEBUG` from the environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if lookup("HEADLESS").as_deref() == Some("false") {
            self.headless = false;
        }
        if lookup("IGNORE_HTTPS_ERRORS").as_deref() == Some("true") {
            self.ignore_https_errors = true;
        }
        if lookup("DEBUG").as_deref() == Some("true") {
            self.debug = true;
        }
        self
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if self.timeout_ms == 0 {
            return Err(RunnerError::InvalidConfig(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(RunnerError::InvalidConfig(
                "viewport dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
