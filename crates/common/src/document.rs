//! Declarative JSON workflow documents

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::Parameters;

/// Reserved block name that invokes another workflow of the same document
pub const CALL_WORKFLOW: &str = "callWorkflow";

/// A complete workflow document parsed from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    /// Navigated to once before the main workflow starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Named workflows, keyed by workflow id
    pub workflows: BTreeMap<String, Workflow>,

    /// Id of the entry workflow
    pub main_workflow: String,

    /// Document-scoped actions, keyed by block name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_blocks: BTreeMap<String, CustomBlock>,
}

/// A named, ordered list of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Steps to execute in order
    pub workflow: Vec<Step>,
}

/// One action invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub block: String,

    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Parameters::is_empty"
    )]
    pub parameters: Parameters,
}

/// `"parameters": null` reads as an empty bag
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Parameters, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Parameters>::deserialize(deserializer)?.unwrap_or_default())
}

/// User-supplied action whose logic ships inside the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomBlock {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Lua source executed once per step invocation
    pub code: String,
}

impl WorkflowDocument {
    /// Parse and validate a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                Error::InvalidDocument(e.to_string())
            } else {
                Error::Json(e)
            }
        })?;
        document.validate()?;
        Ok(document)
    }

    /// Parse and validate a document from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DocumentNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let document = Self::from_json(&content)?;
        debug!(
            "Loaded workflow document {} ({} workflows, {} custom blocks)",
            path.display(),
            document.workflows.len(),
            document.custom_blocks.len()
        );
        Ok(document)
    }

    /// Structural checks that must hold before anything runs
    pub fn validate(&self) -> Result<()> {
        if self.main_workflow.trim().is_empty() {
            return Err(Error::InvalidDocument("mainWorkflow is empty".to_string()));
        }
        if !self.workflows.contains_key(&self.main_workflow) {
            return Err(Error::InvalidDocument(format!(
                "main workflow '{}' is not defined in workflows",
                self.main_workflow
            )));
        }
        Ok(())
    }

    pub fn workflow(&self, id: &str) -> Option<&Workflow> {
        self.workflows.get(id)
    }

    pub fn main(&self) -> Option<&Workflow> {
        self.workflows.get(&self.main_workflow)
    }

    pub fn custom_block(&self, name: &str) -> Option<&CustomBlock> {
        self.custom_blocks.get(name)
    }
}

impl Step {
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            parameters: Parameters::default(),
        }
    }

    pub fn with_parameters(block: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            block: block.into(),
            parameters,
        }
    }

    /// Target workflow id when this step is a `callWorkflow`
    pub fn called_workflow(&self) -> Option<String> {
        if self.block != CALL_WORKFLOW {
            return None;
        }
        self.parameters
            .str("workflowId")
            .filter(|id| !id.trim().is_empty())
    }
}
