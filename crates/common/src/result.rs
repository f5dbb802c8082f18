//! Step and run outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lifecycle of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Emitted to observers before the action runs; never stored
    Running,
    Success,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Running => write!(f, "running"),
            StepStatus::Success => write!(f, "success"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Recorded outcome of one step invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// 1-based position within the step's own workflow
    pub step_number: usize,
    pub block_id: String,
    pub status: StepStatus,
    /// Milliseconds spent in the action itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StepResult {
    /// Marker for a step that is about to run
    pub fn running(step_number: usize, block_id: impl Into<String>) -> Self {
        Self {
            step_number,
            block_id: block_id.into(),
            status: StepStatus::Running,
            duration: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn succeeded(self, duration: Duration) -> Self {
        Self {
            status: StepStatus::Success,
            duration: Some(duration.as_millis() as u64),
            ..self
        }
    }

    pub fn failed(self, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            duration: Some(duration.as_millis() as u64),
            error: Some(error.into()),
            ..self
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Aggregate outcome of one top-level run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub success: bool,
    /// Total wall-clock milliseconds
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub step_results: Vec<StepResult>,
}

impl TestResult {
    pub fn passed(duration: Duration, step_results: Vec<StepResult>) -> Self {
        Self {
            success: true,
            duration: duration.as_millis() as u64,
            error: None,
            step_results,
        }
    }

    pub fn failed(duration: Duration, error: impl Into<String>, step_results: Vec<StepResult>) -> Self {
        Self {
            success: false,
            duration: duration.as_millis() as u64,
            error: Some(error.into()),
            step_results,
        }
    }

    /// First step that did not succeed
    pub fn first_failure(&self) -> Option<&StepResult> {
        self.step_results.iter().find(|s| !s.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_result_wire_format() {
        let step = StepResult::running(2, "click").failed(Duration::from_millis(42), "boom");
        let value = serde_json::to_value(&step).unwrap();

        assert_eq!(value["stepNumber"], json!(2));
        assert_eq!(value["blockId"], json!("click"));
        assert_eq!(value["status"], json!("failed"));
        assert_eq!(value["duration"], json!(42));
        assert_eq!(value["error"], json!("boom"));
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_running_marker_omits_outcome_fields() {
        let value = serde_json::to_value(StepResult::running(1, "goto")).unwrap();
        assert_eq!(value["status"], json!("running"));
        assert!(value.get("duration").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_success_keeps_timestamp() {
        let running = StepResult::running(1, "goto");
        let stamp = running.timestamp;
        let done = running.succeeded(Duration::from_millis(5));
        assert_eq!(done.timestamp, stamp);
        assert!(done.is_success());
    }

    #[test]
    fn test_test_result_wire_format() {
        let result = TestResult::failed(
            Duration::from_millis(1500),
            "nope",
            vec![StepResult::running(1, "goto").failed(Duration::ZERO, "nope")],
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["duration"], json!(1500));
        assert_eq!(value["stepResults"].as_array().unwrap().len(), 1);
        assert_eq!(result.first_failure().unwrap().block_id, "goto");
    }
}
