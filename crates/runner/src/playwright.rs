//! Playwright browser automation
//!
//! The session is hosted by a long-lived Node.js driver process. The runner
//! writes the driver script to a temp dir, spawns `node` on it, and talks to
//! it with one JSON object per line:
//!
//! ```text
//! runner -> driver   {"id":3,"op":"click","args":{"selector":"#go","timeout":10000}}
//! driver -> runner   {"id":3,"ok":true,"value":null}
//!                    {"id":3,"ok":false,"error":"Timeout 10000ms exceeded"}
//! ```
//!
//! `playwright` is resolved from the working directory, so it must be
//! installed in the project the runner is started from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::session::{
    BrowserSession, ElementState, LoadState, NetworkEvent, ScreenshotOptions, SessionLauncher,
    TabTarget,
};

/// Grace period for the driver to exit after `close`
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct DriverRequest<'a> {
    id: u64,
    op: &'a str,
    args: Value,
}

#[derive(Debug, Deserialize)]
struct DriverResponse {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

impl DriverResponse {
    fn into_result(self) -> RunnerResult<Value> {
        if self.ok {
            Ok(self.value)
        } else {
            Err(RunnerError::Session(
                self.error
                    .unwrap_or_else(|| "unknown Playwright error".to_string()),
            ))
        }
    }
}

struct DriverIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// Browser session backed by the Playwright driver process
pub struct PlaywrightSession {
    io: Mutex<DriverIo>,
    child: Mutex<Child>,
    next_id: AtomicU64,
    /// Keeps the driver script on disk for the lifetime of the process
    _script_dir: TempDir,
}

impl PlaywrightSession {
    /// Spawn the driver and launch a browser as configured
    pub async fn launch(config: &RunnerConfig) -> RunnerResult<Self> {
        Self::check_node_installed(config).await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("stitch-driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        debug!("Starting Playwright driver: {}", script_path.display());

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RunnerError::DriverUnavailable(format!(
                    "failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RunnerError::DriverUnavailable("driver stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::DriverUnavailable("driver stdout unavailable".into()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[driver] {}", line);
                }
            });
        }

        let session = Self {
            io: Mutex::new(DriverIo {
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            child: Mutex::new(child),
            next_id: AtomicU64::new(1),
            _script_dir: script_dir,
        };

        session
            .request("launch", launch_args(config))
            .await
            .map_err(|e| RunnerError::DriverUnavailable(e.to_string()))?;

        info!(
            "✅ Browser ready ({}, headless: {}, ignoreHTTPSErrors: {})",
            config.browser, config.headless, config.ignore_https_errors
        );
        Ok(session)
    }

    /// Check that the configured Node.js executable runs
    async fn check_node_installed(config: &RunnerConfig) -> RunnerResult<()> {
        let status = Command::new(&config.node_binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(RunnerError::DriverUnavailable(format!(
                "{} not found. Install Node.js and run: npm install playwright && npx playwright install",
                config.node_binary.display()
            ))),
        }
    }

    /// Send one operation and wait for its reply
    async fn request(&self, op: &str, args: Value) -> RunnerResult<Value> {
        let mut io = self.io.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut line = serde_json::to_string(&DriverRequest { id, op, args })?;
        line.push('\n');
        io.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RunnerError::Session(format!("Playwright driver is gone: {}", e)))?;
        io.stdin.flush().await?;

        loop {
            let reply = io.stdout.next_line().await?.ok_or_else(|| {
                RunnerError::Session("Playwright driver exited unexpectedly".to_string())
            })?;

            match serde_json::from_str::<DriverResponse>(&reply) {
                Ok(response) if response.id == id => return response.into_result(),
                Ok(response) => {
                    warn!("Discarding stale driver reply {} (waiting for {})", response.id, id);
                }
                Err(_) => debug!("[driver] {}", reply),
            }
        }
    }

    async fn command(&self, op: &str, args: Value) -> RunnerResult<()> {
        self.request(op, args).await.map(|_| ())
    }
}

fn launch_args(config: &RunnerConfig) -> Value {
    json!({
        "browser": config.browser.as_str(),
        "headless": config.headless,
        "devtools": config.debug && !config.headless,
        "timeout": config.timeout_ms,
        "ignoreHTTPSErrors": config.ignore_https_errors,
        "viewport": { "width": config.viewport.width, "height": config.viewport.height },
    })
}

fn millis(timeout: Option<Duration>) -> Option<u64> {
    timeout.map(|t| t.as_millis() as u64)
}

#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn goto(&self, url: &str) -> RunnerResult<()> {
        self.command("goto", json!({ "url": url })).await
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Option<Duration>) -> RunnerResult<()> {
        self.command(
            "waitForLoadState",
            json!({ "state": state.as_str(), "timeout": millis(timeout) }),
        )
        .await
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Option<Duration>,
    ) -> RunnerResult<()> {
        self.command(
            "waitForSelector",
            json!({ "selector": selector, "state": state.as_str(), "timeout": millis(timeout) }),
        )
        .await
    }

    async fn click(&self, selector: &str, timeout: Option<Duration>) -> RunnerResult<()> {
        self.command("click", json!({ "selector": selector, "timeout": millis(timeout) }))
            .await
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Option<Duration>) -> RunnerResult<()> {
        self.command(
            "fill",
            json!({ "selector": selector, "value": value, "timeout": millis(timeout) }),
        )
        .await
    }

    async fn type_text(&self, selector: &str, text: &str, delay: Duration) -> RunnerResult<()> {
        self.command(
            "type",
            json!({ "selector": selector, "text": text, "delay": delay.as_millis() as u64 }),
        )
        .await
    }

    async fn press(&self, selector: Option<&str>, key: &str) -> RunnerResult<()> {
        self.command("press", json!({ "selector": selector, "key": key })).await
    }

    async fn hover(&self, selector: &str) -> RunnerResult<()> {
        self.command("hover", json!({ "selector": selector })).await
    }

    async fn title(&self) -> RunnerResult<String> {
        let value = self.request("title", json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn url(&self) -> RunnerResult<String> {
        let value = self.request("url", json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn text_content(&self, selector: &str) -> RunnerResult<Option<String>> {
        let value = self.request("textContent", json!({ "selector": selector })).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn screenshot(&self, options: &ScreenshotOptions) -> RunnerResult<()> {
        let format = options.format();
        // Playwright rejects a quality setting for PNG output
        let quality = if format == "jpeg" { options.quality } else { None };
        self.command(
            "screenshot",
            json!({
                "path": options.path,
                "fullPage": options.full_page,
                "quality": quality,
                "type": format,
            }),
        )
        .await
    }

    async fn evaluate(&self, script: &str, arg: Value) -> RunnerResult<Value> {
        self.request("evaluate", json!({ "script": script, "arg": arg })).await
    }

    async fn open_tab(&self, url: Option<&str>) -> RunnerResult<usize> {
        let value = self.request("openTab", json!({ "url": url })).await?;
        Ok(value.as_u64().unwrap_or_default() as usize)
    }

    async fn switch_tab(&self, target: &TabTarget) -> RunnerResult<()> {
        self.command("switchTab", serde_json::to_value(target)?).await
    }

    async fn close_tab(&self, index: Option<usize>) -> RunnerResult<usize> {
        let value = self.request("closeTab", json!({ "index": index })).await?;
        Ok(value.as_u64().unwrap_or_default() as usize)
    }

    async fn save_storage_state(&self, path: &Path) -> RunnerResult<()> {
        self.command("saveStorageState", json!({ "path": path })).await
    }

    async fn load_storage_state(&self, path: &Path) -> RunnerResult<()> {
        self.command("loadStorageState", json!({ "path": path })).await
    }

    async fn wait_for_network(
        &self,
        event: NetworkEvent,
        pattern: &str,
        timeout: Option<Duration>,
    ) -> RunnerResult<()> {
        self.command(
            "waitForNetwork",
            json!({ "event": event, "pattern": pattern, "timeout": millis(timeout) }),
        )
        .await
    }

    async fn close(&self) -> RunnerResult<()> {
        let closed = self.command("close", json!({})).await;

        let mut child = self.child.lock().await;
        {
            // EOF on stdin lets the driver exit on its own
            let mut io = self.io.lock().await;
            let _ = io.stdin.shutdown().await;
        }
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!("Playwright driver exited with {}", status),
            _ => {
                warn!("Playwright driver did not exit in time; killing it");
                let _ = child.kill().await;
            }
        }

        closed
    }
}

/// Launches [`PlaywrightSession`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaywrightLauncher;

#[async_trait]
impl SessionLauncher for PlaywrightLauncher {
    async fn launch(&self, config: &RunnerConfig) -> RunnerResult<Arc<dyn BrowserSession>> {
        let session = PlaywrightSession::launch(config).await?;
        Ok(Arc::new(session))
    }
}

/// Node.js side of the protocol
const DRIVER_SCRIPT: &str = r##"
const { createRequire } = require('module');
const fs = require('fs');
const path = require('path');
const readline = require('readline');

// stdout carries protocol replies only
console.log = (...args) => console.error(...args);

const requireFromCwd = createRequire(path.join(process.cwd(), 'package.json'));

let browser = null;
let context = null;
let page = null;
let defaultTimeout = 30000;

function send(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

function current() {
  if (!page || page.isClosed()) {
    throw new Error('No active page');
  }
  return page;
}

function track(p) {
  p.setDefaultTimeout(defaultTimeout);
  return p;
}

function opts(timeout) {
  return timeout == null ? {} : { timeout };
}

function resolveUrl(url) {
  if (/^[a-z][a-z0-9+.-]*:/i.test(url)) {
    return url;
  }
  return new URL(url, current().url()).toString();
}

const ops = {
  async launch(args) {
    const playwright = requireFromCwd('playwright');
    const engine = playwright[args.browser];
    if (!engine) {
      throw new Error(`Unsupported browser: ${args.browser}`);
    }
    defaultTimeout = args.timeout;
    browser = await engine.launch({ headless: args.headless, devtools: args.devtools });
    context = await browser.newContext({
      viewport: args.viewport,
      ignoreHTTPSErrors: args.ignoreHTTPSErrors,
    });
    page = track(await context.newPage());
    return null;
  },

  async goto({ url }) {
    await current().goto(resolveUrl(url));
    return null;
  },

  async waitForLoadState({ state, timeout }) {
    await current().waitForLoadState(state, opts(timeout));
    return null;
  },

  async waitForSelector({ selector, state, timeout }) {
    await current().waitForSelector(selector, { state, ...opts(timeout) });
    return null;
  },

  async click({ selector, timeout }) {
    await current().click(selector, opts(timeout));
    return null;
  },

  async fill({ selector, value, timeout }) {
    await current().fill(selector, value, opts(timeout));
    return null;
  },

  async type({ selector, text, delay }) {
    await current().type(selector, text, { delay });
    return null;
  },

  async press({ selector, key }) {
    if (selector) {
      await current().press(selector, key);
    } else {
      await current().keyboard.press(key);
    }
    return null;
  },

  async hover({ selector }) {
    await current().hover(selector);
    return null;
  },

  async title() {
    return await current().title();
  },

  async url() {
    return current().url();
  },

  async textContent({ selector }) {
    return await current().locator(selector).first().textContent();
  },

  async screenshot({ path: file, fullPage, quality, type }) {
    await current().screenshot({ path: file, fullPage, quality: quality ?? undefined, type });
    return null;
  },

  async evaluate({ script, arg }) {
    const result = await current().evaluate(script, arg);
    return result === undefined ? null : result;
  },

  async openTab({ url }) {
    page = track(await context.newPage());
    if (url) {
      await page.goto(url);
      await page.waitForLoadState('networkidle');
    }
    await page.bringToFront();
    return context.pages().length;
  },

  async switchTab(target) {
    const pages = context.pages();
    let found = null;
    if (target.index !== undefined) {
      if (target.index >= pages.length) {
        throw new Error(`Tab index ${target.index} out of range (0-${pages.length - 1})`);
      }
      found = pages[target.index];
    } else if (target.url !== undefined) {
      found = pages.find((p) => p.url().includes(target.url));
      if (!found) {
        throw new Error(`Tab with URL "${target.url}" not found`);
      }
    } else if (target.title !== undefined) {
      for (const p of pages) {
        if ((await p.title()).includes(target.title)) {
          found = p;
          break;
        }
      }
      if (!found) {
        throw new Error(`Tab with title "${target.title}" not found`);
      }
    }
    await found.bringToFront();
    page = found;
    return null;
  },

  async closeTab({ index }) {
    const pages = context.pages();
    const target = index == null ? current() : pages[index];
    if (!target) {
      throw new Error(`Tab index ${index} out of range`);
    }
    await target.close();
    const remaining = context.pages();
    if (target === page) {
      page = remaining.length > 0 ? remaining[remaining.length - 1] : null;
    }
    return remaining.length;
  },

  async saveStorageState({ path: file }) {
    fs.mkdirSync(path.dirname(path.resolve(file)), { recursive: true });
    await context.storageState({ path: file });
    return null;
  },

  async loadStorageState({ path: file }) {
    const state = JSON.parse(fs.readFileSync(file, 'utf8'));
    if (state.cookies) {
      await context.addCookies(state.cookies);
    }
    for (const origin of state.origins || []) {
      if (origin.localStorage) {
        await current().evaluate((items) => {
          for (const item of items) {
            window.localStorage.setItem(item.name, item.value);
          }
        }, origin.localStorage);
      }
    }
    return null;
  },

  async waitForNetwork({ event, pattern, timeout }) {
    const matches = (r) => r.url().includes(pattern);
    if (event === 'request') {
      await current().waitForRequest(matches, opts(timeout));
    } else {
      await current().waitForResponse(matches, opts(timeout));
    }
    return null;
  },

  async close() {
    if (browser) {
      await browser.close();
    }
    browser = null;
    context = null;
    page = null;
    return null;
  },
};

const input = readline.createInterface({ input: process.stdin });
let queue = Promise.resolve();

input.on('line', (line) => {
  queue = queue.then(async () => {
    let request;
    try {
      request = JSON.parse(line);
    } catch (err) {
      console.error(`unparseable request: ${line}`);
      return;
    }
    try {
      const handler = ops[request.op];
      if (!handler) {
        throw new Error(`Unknown driver operation: ${request.op}`);
      }
      const value = await handler(request.args || {});
      send({ id: request.id, ok: true, value: value === undefined ? null : value });
    } catch (err) {
      send({ id: request.id, ok: false, error: err && err.message ? err.message : String(err) });
    }
  });
});

input.on('close', async () => {
  await queue;
  if (browser) {
    await browser.close().catch(() => {});
  }
  process.exit(0);
});
"##;
