//! Runner settings assembled from the config file, environment and flags

use std::path::Path;

use anyhow::{Context, Result};
use stitch_runner::{Browser, RunnerConfig};

/// Values given on the command line; unset fields keep the file/env value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub headless: Option<bool>,
    pub debug: bool,
    pub ignore_https_errors: bool,
    pub timeout_ms: Option<u64>,
    pub browser: Option<Browser>,
    pub settle_delay_ms: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, mut config: RunnerConfig) -> RunnerConfig {
        if let Some(headless) = self.headless {
            config.headless = headless;
        }
        if self.debug {
            config.debug = true;
        }
        if self.ignore_https_errors {
            config.ignore_https_errors = true;
        }
        if let Some(timeout) = self.timeout_ms {
            config.timeout_ms = timeout;
        }
        if let Some(browser) = self.browser {
            config.browser = browser;
        }
        if let Some(delay) = self.settle_delay_ms {
            config.settle_delay_ms = delay;
        }
        config
    }
}

/// File, then `HEADLESS`/`DEBUG`/`IGNORE_HTTPS_ERRORS`, then flags
pub fn resolve(config_path: &Path, overrides: &Overrides) -> Result<RunnerConfig> {
    let config = RunnerConfig::load(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let config = overrides.apply(config.with_env_overrides());
    config.validate().context("Invalid runner settings")?;
    Ok(config)
}
