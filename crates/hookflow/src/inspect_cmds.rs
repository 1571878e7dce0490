//! Read-only inspection commands: validate, discover, triggers.

use crate::run_cmd::read_event_bytes;
use anyhow::{Context, Result};
use hookflow_event::CliGitProvider;
use hookflow_gate::{GateOptions, matching_workflows};
use hookflow_workflow::{discover, validate_workflows_in_dir};
use std::path::PathBuf;

fn resolve_root(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("cannot determine current directory"),
    }
}

pub fn handle_validate(dir: Option<PathBuf>) -> Result<i32> {
    let root = resolve_root(dir)?;
    let result = validate_workflows_in_dir(&root)?;

    if result.is_valid() {
        println!("All workflows valid.");
        return Ok(0);
    }

    for error in &result.errors {
        println!("{}: {}", error.file, error.message);
        for detail in &error.details {
            println!("  - {detail}");
        }
    }
    Ok(1)
}

pub fn handle_discover(dir: Option<PathBuf>) -> Result<i32> {
    let root = resolve_root(dir)?;
    let found = discover(&root)?;
    if found.is_empty() {
        println!("No workflows found under .github/hooks.");
        return Ok(0);
    }
    for workflow in &found {
        println!("{}", workflow.rel_path.display());
    }
    Ok(0)
}

pub fn handle_triggers(
    event: Option<String>,
    event_type: Option<String>,
    dir: Option<PathBuf>,
) -> Result<i32> {
    let opts = GateOptions {
        event_bytes: read_event_bytes(event)?,
        event_type,
        dir,
        logs_dir: None,
    };
    let names = matching_workflows(&opts, &CliGitProvider)?;
    if names.is_empty() {
        println!("No matching workflows.");
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(0)
}
