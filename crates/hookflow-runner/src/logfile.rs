//! Denial log files.
//!
//! Written once per denied workflow; the verdict's `logFile` field points
//! at the result so both humans and the agent host can inspect what ran.

use crate::step::StepResult;
use anyhow::{Context, Result};
use hookflow_workflow::Workflow;
use std::path::{Path, PathBuf};

const RULE: &str = "----------------------------------------";

/// Workflow name reduced to a filesystem-safe slug.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "workflow".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write the per-step record for a denied workflow run. File names carry
/// a UTC timestamp plus the workflow slug so concurrent invocations do
/// not collide.
pub fn write_denial_log(
    dir: &Path,
    workflow: &Workflow,
    results: &[StepResult],
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let timestamp = chrono::Utc::now();
    let file_name = format!(
        "{}-{}.log",
        timestamp.format("%Y%m%dT%H%M%S%.3f"),
        slug(&workflow.name)
    );
    let path = dir.join(file_name);

    let mut body = String::new();
    body.push_str(&format!("workflow: {}\n", workflow.name));
    if let Some(description) = &workflow.description {
        body.push_str(&format!("description: {description}\n"));
    }
    body.push_str(&format!("timestamp: {}\n", timestamp.to_rfc3339()));
    body.push_str(&format!("{RULE}\n"));

    for result in results {
        body.push_str(&format!(
            "step: {}\noutcome: {}\nduration: {:.3}s\n",
            result.name,
            result.outcome,
            result.duration.as_secs_f64()
        ));
        if let Some(error) = &result.error {
            body.push_str(&format!("error: {error}\n"));
        }
        if !result.output.is_empty() {
            body.push_str("output:\n");
            body.push_str(result.output.trim_end());
            body.push('\n');
        }
        body.push_str(&format!("{RULE}\n"));
    }

    std::fs::write(&path, body)
        .with_context(|| format!("failed to write denial log {}", path.display()))?;
    Ok(path)
}
