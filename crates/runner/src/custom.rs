//! Custom blocks defined in the workflow document
//!
//! A custom block is a Lua 5.4 chunk. Every invocation gets a fresh,
//! restricted interpreter whose only way out is a small set of globals:
//!
//! | Global | Meaning |
//! |---|---|
//! | `parameters` | the step's parameters as a table |
//! | `console.log/warn/error`, `print` | log through the runner |
//! | `wait(ms)` | sleep |
//! | `click(sel)`, `fill(sel, text)`, `navigate(url)`, `waitForSelector(sel)` | session calls |
//!
//! `goto` is a Lua keyword, so the navigate helper is also reachable as
//! `_G["goto"](url)`.
//! | `page.url()`, `page.title()` | current page info |

use mlua::{Lua, LuaOptions, LuaSerdeExt, SerializeOptions, StdLib, Variadic};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use stitch_common::{CustomBlock, Parameters};

use crate::error::{RunnerError, RunnerResult};
use crate::session::{BrowserSession, ElementState};

/// Memory ceiling for one custom block interpreter
const MEMORY_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Base functions that reach the filesystem or load code
const REMOVED_GLOBALS: &[&str] = &["dofile", "loadfile", "load", "require", "collectgarbage"];

/// Runs custom blocks against a session
pub struct CustomBlockExecutor {
    session: Arc<dyn BrowserSession>,
}

impl CustomBlockExecutor {
    pub fn new(session: Arc<dyn BrowserSession>) -> Self {
        Self { session }
    }

    pub async fn run(&self, block: &CustomBlock, params: &Parameters) -> RunnerResult<()> {
        if block.code.trim().is_empty() {
            return Err(RunnerError::CustomBlockFailed(
                "No custom code provided".to_string(),
            ));
        }

        debug!("Executing custom block: {}", block.name);

        let result = async {
            let lua = self.sandbox(&block.name, params)?;
            lua.load(block.code.as_str())
                .set_name(block.name.as_str())
                .exec_async()
                .await
        }
        .await;

        result.map_err(|e| {
            let message = root_message(&e);
            error!("Custom block '{}' failed: {}", block.name, message);
            RunnerError::CustomBlockFailed(message)
        })
    }

    fn sandbox(&self, name: &str, params: &Parameters) -> mlua::Result<Lua> {
        let lua = Lua::new_with(
            StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8,
            LuaOptions::default(),
        )?;
        lua.set_memory_limit(MEMORY_LIMIT_BYTES)?;

        let globals = lua.globals();
        for global in REMOVED_GLOBALS {
            globals.set(*global, mlua::Value::Nil)?;
        }

        // JSON null becomes nil, so null parameters are falsy like absent ones
        let options = SerializeOptions::new()
            .serialize_none_to_null(false)
            .serialize_unit_to_null(false);
        globals.set("parameters", lua.to_value_with(params.as_map(), options)?)?;

        let console = lua.create_table()?;
        let log = {
            let block = name.to_string();
            lua.create_function(move |_, args: Variadic<mlua::Value>| {
                info!("[{}] {}", block, render(&args));
                Ok(())
            })?
        };
        let warn_fn = {
            let block = name.to_string();
            lua.create_function(move |_, args: Variadic<mlua::Value>| {
                warn!("[{}] {}", block, render(&args));
                Ok(())
            })?
        };
        let error_fn = {
            let block = name.to_string();
            lua.create_function(move |_, args: Variadic<mlua::Value>| {
                error!("[{}] {}", block, render(&args));
                Ok(())
            })?
        };
        console.set("log", log.clone())?;
        console.set("warn", warn_fn)?;
        console.set("error", error_fn)?;
        globals.set("console", console)?;
        globals.set("print", log)?;

        globals.set(
            "wait",
            lua.create_async_function(|_, ms: u64| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(())
            })?,
        )?;

        let session = self.session.clone();
        globals.set(
            "click",
            lua.create_async_function(move |_, selector: String| {
                let session = session.clone();
                async move {
                    session
                        .click(&selector, None)
                        .await
                        .map_err(mlua::Error::external)
                }
            })?,
        )?;

        let session = self.session.clone();
        globals.set(
            "fill",
            lua.create_async_function(move |_, (selector, text): (String, String)| {
                let session = session.clone();
                async move {
                    session
                        .fill(&selector, &text, None)
                        .await
                        .map_err(mlua::Error::external)
                }
            })?,
        )?;

        let session = self.session.clone();
        let navigate = lua.create_async_function(move |_, url: String| {
            let session = session.clone();
            async move { session.goto(&url).await.map_err(mlua::Error::external) }
        })?;
        globals.set("goto", navigate.clone())?;
        globals.set("navigate", navigate)?;

        let session = self.session.clone();
        globals.set(
            "waitForSelector",
            lua.create_async_function(move |_, selector: String| {
                let session = session.clone();
                async move {
                    session
                        .wait_for_selector(&selector, ElementState::Visible, None)
                        .await
                        .map_err(mlua::Error::external)
                }
            })?,
        )?;

        let page = lua.create_table()?;
        let session = self.session.clone();
        page.set(
            "url",
            lua.create_async_function(move |_, ()| {
                let session = session.clone();
                async move { session.url().await.map_err(mlua::Error::external) }
            })?,
        )?;
        let session = self.session.clone();
        page.set(
            "title",
            lua.create_async_function(move |_, ()| {
                let session = session.clone();
                async move { session.title().await.map_err(mlua::Error::external) }
            })?,
        )?;
        globals.set("page", page)?;

        Ok(lua)
    }
}

/// Join console arguments the way a JS console would
fn render(args: &[mlua::Value]) -> String {
    args.iter()
        .map(|value| match value {
            mlua::Value::Nil => "nil".to_string(),
            mlua::Value::Boolean(b) => b.to_string(),
            mlua::Value::Integer(i) => i.to_string(),
            mlua::Value::Number(n) => n.to_string(),
            mlua::Value::String(s) => s.to_string_lossy().to_string(),
            other => format!("{:?}", other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Innermost message of a Lua error, without callback wrapping
fn root_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::CallbackError { cause, .. } => root_message(cause),
        mlua::Error::WithContext { cause, .. } => root_message(cause),
        mlua::Error::ExternalError(e) => e.to_string(),
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
