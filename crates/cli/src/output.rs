//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use stitch_common::{StepResult, TestResult};
use stitch_runner::lint::Issue;
use stitch_runner::ActionRegistry;

/// Marks the start of the machine-readable results on stdout
pub const RESULTS_START: &str = "=== FINAL_RESULTS ===";
pub const RESULTS_END: &str = "=== END_RESULTS ===";

/// Prefix of the per-step status lines streamed with `--stream-status`
pub const BLOCK_STATUS_PREFIX: &str = "BLOCK_STATUS:";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for StepResult {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Block", "Status", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.step_number.to_string(),
            self.block_id.clone(),
            self.status.to_string(),
            self.duration
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string()),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

impl TableDisplay for Issue {
    fn headers() -> Vec<&'static str> {
        vec!["Workflow", "Step", "Problem"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.workflow.clone(),
            self.step.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            self.message.clone(),
        ]
    }
}

/// A built-in block as listed by `--list-blocks`
#[derive(Debug, Clone, Serialize)]
pub struct BlockInfo {
    pub name: &'static str,
    pub description: &'static str,
}

impl BlockInfo {
    pub fn from_registry(registry: &ActionRegistry) -> Vec<Self> {
        registry
            .iter()
            .map(|action| BlockInfo {
                name: action.name(),
                description: action.description(),
            })
            .collect()
    }
}

impl TableDisplay for BlockInfo {
    fn headers() -> Vec<&'static str> {
        vec!["Block", "Description"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.to_string(), self.description.to_string()]
    }
}

pub fn render_table<T: TableDisplay>(items: &[T]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }

    table.to_string()
}

/// Render a list of items in the requested format
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table if items.is_empty() => "No items found.".to_string(),
        OutputFormat::Table => render_table(items),
        OutputFormat::Json => serde_json::to_string_pretty(items).unwrap_or_default(),
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    println!("{}", render_list(items, format));
}

/// The step results between the FINAL_RESULTS markers, JSON on one line
pub fn results_block(steps: &[StepResult]) -> serde_json::Result<String> {
    Ok(format!(
        "{}\n{}\n{}",
        RESULTS_START,
        serde_json::to_string(steps)?,
        RESULTS_END
    ))
}

pub fn block_status_line(step: &StepResult) -> serde_json::Result<String> {
    Ok(format!("{}{}", BLOCK_STATUS_PREFIX, serde_json::to_string(step)?))
}

/// One-line tally of a finished run
pub fn summary(result: &TestResult) -> String {
    let passed = result
        .step_results
        .iter()
        .filter(|s| s.is_success())
        .count();
    let failed = result.step_results.len() - passed;

    format!(
        "{} steps: {} passed, {} failed in {}ms",
        result.step_results.len(),
        passed,
        failed,
        result.duration
    )
}

/// Step table and tally, written to stderr so stdout stays parseable
pub fn print_summary(result: &TestResult) {
    if !result.step_results.is_empty() {
        eprintln!("{}", render_table(&result.step_results));
    }
    let line = summary(result);
    if result.success {
        eprintln!("{}", line.green());
    } else {
        eprintln!("{}", line.red());
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
