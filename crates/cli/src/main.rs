//! Stitch CLI - Main Entry Point
//!
//! Runs a JSON workflow document in a Playwright-driven browser. Human
//! output goes to stderr; stdout carries the `BLOCK_STATUS:` stream and the
//! `FINAL_RESULTS` block for tools that drive the CLI.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::{debug, warn};

use stitch_cli::discover::{self, DEFAULT_WORKFLOW};
use stitch_cli::output::{self, BlockInfo, OutputFormat};
use stitch_cli::settings::{self, Overrides};
use stitch_common::{StepResult, WorkflowDocument};
use stitch_runner::{lint, ActionRegistry, Browser, RunCallbacks, RunnerConfig, TestRunner};

/// Stitch - declarative browser workflows
#[derive(Parser)]
#[command(name = "stitch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workflow document to run
    #[arg(default_value = DEFAULT_WORKFLOW)]
    workflow: PathBuf,

    /// Runner settings file
    #[arg(long, env = "STITCH_CONFIG", default_value = "stitch.toml")]
    config: PathBuf,

    /// Launch the browser without a window
    #[arg(long, value_name = "BOOL")]
    headless: Option<bool>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<Browser>,

    /// Default timeout for browser operations
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Pause after each successful step
    #[arg(long, value_name = "MS")]
    settle_delay: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    ignore_https_errors: bool,

    /// Verbose logging; opens devtools when not headless
    #[arg(short, long)]
    debug: bool,

    /// Print a BLOCK_STATUS line as each step starts and finishes
    #[arg(long)]
    stream_status: bool,

    /// Check the workflow without launching a browser
    #[arg(long)]
    check: bool,

    /// List the built-in blocks and exit
    #[arg(long)]
    list_blocks: bool,

    /// Output format for --list-blocks and --check
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            headless: self.headless,
            debug: self.debug,
            ignore_https_errors: self.ignore_https_errors,
            timeout_ms: self.timeout,
            browser: self.browser,
            settle_delay_ms: self.settle_delay,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = settings::resolve(&cli.config, &cli.overrides())?;

    // Initialize logging
    let log_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.list_blocks {
        output::print_list(&BlockInfo::from_registry(&ActionRegistry::builtin()), cli.format);
        return Ok(());
    }

    if !cli.workflow.exists() {
        report_missing(&cli.workflow);
        process::exit(1);
    }

    let passed = if cli.check {
        check(&cli.workflow, cli.format)?
    } else {
        run(&cli, config).await?
    };

    if !passed {
        process::exit(1);
    }
    Ok(())
}

fn report_missing(workflow: &Path) {
    output::print_error(&format!("Workflow file not found: {}", workflow.display()));

    let files = discover::workflow_files(&discover::search_dir(workflow));
    if !files.is_empty() {
        eprintln!("\n{}", "📋 Available workflows:".yellow());
        for file in files {
            eprintln!("  - {}", file.display());
        }
    }
    eprintln!(
        "\n{} stitch [WORKFLOW] [--headless <BOOL>] [--debug]",
        "Usage:".bold()
    );
}

fn check(path: &Path, format: OutputFormat) -> Result<bool> {
    let document = WorkflowDocument::from_file(path)?;
    let issues = lint::check_document(&document, &ActionRegistry::builtin());

    if issues.is_empty() && format == OutputFormat::Table {
        output::print_success(&format!("{} is valid", path.display()));
    } else {
        output::print_list(&issues, format);
    }
    Ok(issues.is_empty())
}

async fn run(cli: &Cli, config: RunnerConfig) -> Result<bool> {
    let mut callbacks = RunCallbacks::new().on_progress(|progress, step| {
        debug!(
            "[{}/{} {}%] {}",
            progress.current,
            progress.total,
            progress.percent(),
            step.block_id
        )
    });
    if cli.stream_status {
        callbacks = callbacks
            .on_step_start(stream_status)
            .on_step_complete(stream_status);
    }

    let mut runner = TestRunner::new(config).with_callbacks(callbacks);
    let result = runner.run_workflow(cli.workflow.as_path()).await;
    if let Err(e) = runner.cleanup().await {
        warn!("Cleanup failed: {}", e);
    }

    output::print_summary(&result);
    println!("{}", output::results_block(&result.step_results)?);

    if result.success {
        output::print_success("TESTS PASSED");
    } else {
        println!("❌ TESTS FAILED");
        if let Some(error) = &result.error {
            eprintln!("Error: {}", error);
        }
    }
    Ok(result.success)
}

fn stream_status(step: &StepResult) {
    match output::block_status_line(step) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Failed to encode step status: {}", e),
    }
}
