//! Static checks of a workflow document, without a browser

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use stitch_common::{WorkflowDocument, CALL_WORKFLOW};

use crate::registry::ActionRegistry;

/// Something that would make a run fail before or when the step is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub workflow: String,
    /// 1-based step number, when the issue belongs to one step
    pub step: Option<usize>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "{} step {}: {}", self.workflow, step, self.message),
            None => write!(f, "{}: {}", self.workflow, self.message),
        }
    }
}

/// Report unresolvable blocks, broken `callWorkflow` steps and call cycles
pub fn check_document(document: &WorkflowDocument, registry: &ActionRegistry) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (id, workflow) in &document.workflows {
        for (index, step) in workflow.workflow.iter().enumerate() {
            let issue = |message: String| Issue {
                workflow: id.clone(),
                step: Some(index + 1),
                message,
            };

            if step.block == CALL_WORKFLOW {
                match step.called_workflow() {
                    None => issues.push(issue("callWorkflow requires workflowId parameter".into())),
                    Some(target) if document.workflow(&target).is_none() => {
                        issues.push(issue(format!("Workflow '{}' not found", target)))
                    }
                    Some(_) => {}
                }
            } else if document.custom_block(&step.block).is_none()
                && !registry.contains(&step.block)
            {
                issues.push(issue(format!("Unknown block '{}'", step.block)));
            }
        }
    }

    for chain in find_cycles(document) {
        issues.push(Issue {
            workflow: chain[0].clone(),
            step: None,
            message: format!("Circular workflow dependency detected: {}", chain.join(" -> ")),
        });
    }

    issues
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

fn find_cycles(document: &WorkflowDocument) -> Vec<Vec<String>> {
    let mut visits = HashMap::new();
    let mut stack = Vec::new();
    let mut cycles = Vec::new();

    for id in document.workflows.keys() {
        if !visits.contains_key(id.as_str()) {
            visit(document, id, &mut visits, &mut stack, &mut cycles);
        }
    }
    cycles
}

fn visit<'d>(
    document: &'d WorkflowDocument,
    id: &'d str,
    visits: &mut HashMap<&'d str, Visit>,
    stack: &mut Vec<&'d str>,
    cycles: &mut Vec<Vec<String>>,
) {
    visits.insert(id, Visit::Active);
    stack.push(id);

    if let Some(workflow) = document.workflow(id) {
        for step in &workflow.workflow {
            let Some(target) = step.called_workflow() else {
                continue;
            };
            let Some((target, _)) = document.workflows.get_key_value(&target) else {
                continue;
            };

            match visits.get(target.as_str()) {
                Some(Visit::Active) => {
                    let start = stack.iter().position(|w| *w == target).unwrap_or(0);
                    let mut chain: Vec<String> = stack[start..].iter().map(|w| w.to_string()).collect();
                    chain.push(target.clone());
                    cycles.push(chain);
                }
                Some(Visit::Done) => {}
                None => visit(document, target, visits, stack, cycles),
            }
        }
    }

    stack.pop();
    visits.insert(id, Visit::Done);
}
