//! YAML loading and canonical serialization.

use crate::model::Workflow;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse a workflow document from YAML text.
pub fn load_workflow_str(text: &str) -> Result<Workflow, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

/// Read and parse a workflow file.
pub fn load_workflow(path: &Path) -> Result<Workflow> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workflow file {}", path.display()))?;
    load_workflow_str(&text)
        .with_context(|| format!("failed to parse workflow file {}", path.display()))
}

/// Serialize a workflow back to YAML. Loading the output yields an equal
/// in-memory structure.
pub fn to_canonical_yaml(workflow: &Workflow) -> Result<String> {
    serde_yaml::to_string(workflow).context("failed to serialize workflow")
}
