//! End-to-end evaluation of one gate invocation.

use anyhow::Result;
use hookflow_core::{FileAction, Lifecycle, Verdict};
use hookflow_event::{Event, GitProvider, detect_from_raw_input};
use hookflow_glob::{glob_match, normalize_path};
use hookflow_runner::{CancelToken, ConcurrencyGroups, RunOptions, run_with_blocking};
use hookflow_trigger::matches;
use hookflow_workflow::{ValidationError, Workflow, discover, load_workflow, validate};
use std::path::{Path, PathBuf};

/// Inputs for one invocation, as parsed by the CLI.
#[derive(Debug, Clone, Default)]
pub struct GateOptions {
    /// Raw event bytes (already read from the flag or stdin).
    pub event_bytes: Vec<u8>,
    /// Host event-type string (`preToolUse`/`postToolUse`/…).
    pub event_type: Option<String>,
    /// Working-directory override; defaults to the event's `cwd`.
    pub dir: Option<PathBuf>,
    /// Denial log directory; `None` disables log files.
    pub logs_dir: Option<PathBuf>,
}

/// Self-repair probe: is this event an edit/create of a workflow file?
/// Deletions and non-YAML paths do not qualify.
fn is_workflow_file_edit(event: &Event) -> bool {
    let Some(file) = &event.file else {
        return false;
    };
    if !matches!(file.action, FileAction::Create | FileAction::Edit) {
        return false;
    }
    let path = file.path.to_ascii_lowercase();
    glob_match(".github/hooks/**/*.yml", &path) || glob_match(".github/hooks/**/*.yaml", &path)
}

/// Run one invocation end to end and produce the verdict.
///
/// Invocation-level failures (unparseable event JSON, unreadable hooks
/// directory) come back as `Err`; everything else, including invalid
/// workflows and failing steps, folds into the verdict.
pub fn run_gate(opts: &GateOptions, git: &dyn GitProvider) -> Result<Verdict> {
    // Empty input: nothing to judge.
    if opts.event_bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Verdict::allow());
    }

    let mut event = detect_from_raw_input(&opts.event_bytes, git)?;
    stamp_event(&mut event, opts);

    let root = PathBuf::from(&event.cwd);
    let (workflows, errors) = load_all(&root)?;

    if !errors.is_empty() {
        if is_workflow_file_edit(&event) {
            tracing::debug!("invalid workflows present, but the event edits a workflow file");
            return Ok(Verdict::allow_with_reason(
                "Allowing hookflow self-repair (workflows have errors)",
            ));
        }
        let listing: Vec<String> = errors.iter().map(ValidationError::summary).collect();
        return Ok(Verdict::deny(format!(
            "Invalid workflow file(s): {}",
            listing.join("; ")
        )));
    }

    let matched: Vec<&Workflow> = workflows
        .iter()
        .filter(|workflow| matches(workflow, &event))
        .collect();
    if matched.is_empty() {
        return Ok(Verdict::allow());
    }

    let cancel = CancelToken::new();
    let groups = ConcurrencyGroups::new();
    let mut run_opts = RunOptions::new(&root);
    run_opts.cancel = cancel.clone();
    run_opts.logs_dir = opts.logs_dir.as_deref();

    for workflow in matched {
        let _slot = match &workflow.concurrency {
            Some(concurrency) => {
                Some(groups.acquire(&concurrency.group, concurrency.max_parallel, &cancel)?)
            }
            None => None,
        };

        tracing::debug!(workflow = %workflow.name, "running matched workflow");
        let verdict = run_with_blocking(workflow, &event, &run_opts);
        if verdict.is_deny() {
            // First deny wins; later matches stay unrun to keep the
            // agent's critical path short.
            return Ok(verdict);
        }
    }

    Ok(Verdict::allow())
}

/// Apply CLI overrides and normalize the file path. This is the single
/// place normalization happens; trigger patterns always see relative
/// paths.
fn stamp_event(event: &mut Event, opts: &GateOptions) {
    if let Some(dir) = &opts.dir {
        event.cwd = dir.display().to_string();
    }

    let event_type = opts.event_type.as_deref().unwrap_or("preToolUse");
    event.lifecycle = Lifecycle::from_event_type(event_type);
    if let Some(hook) = &mut event.hook {
        hook.hook_type = event_type.to_string();
        if let Some(tool) = &mut hook.tool {
            tool.hook_type = event_type.to_string();
        }
    }
    if let Some(tool) = &mut event.tool {
        tool.hook_type = event_type.to_string();
    }

    if let Some(file) = &mut event.file {
        file.path = normalize_path(&file.path, &event.cwd);
    }
}

/// Load and validate every discovered workflow, collecting valid
/// documents and per-file errors separately.
fn load_all(root: &Path) -> Result<(Vec<Workflow>, Vec<ValidationError>)> {
    let mut workflows = Vec::new();
    let mut errors = Vec::new();

    for found in discover(root)? {
        match load_workflow(&found.path) {
            Ok(workflow) => {
                let problems = validate::validate_model(&workflow);
                if problems.is_empty() {
                    workflows.push(workflow);
                } else {
                    errors.push(ValidationError {
                        file: found.rel_path.display().to_string(),
                        message: "Invalid workflow".to_string(),
                        details: problems,
                    });
                }
            }
            Err(e) => {
                errors.push(ValidationError {
                    file: found.rel_path.display().to_string(),
                    message: "Invalid workflow".to_string(),
                    details: vec![format!("{e:#}")],
                });
            }
        }
    }

    Ok((workflows, errors))
}

/// Which workflows would match this event, without running any steps.
/// Used by the `triggers` subcommand.
pub fn matching_workflows(opts: &GateOptions, git: &dyn GitProvider) -> Result<Vec<String>> {
    if opts.event_bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }
    let mut event = detect_from_raw_input(&opts.event_bytes, git)?;
    stamp_event(&mut event, opts);

    let root = PathBuf::from(&event.cwd);
    let (workflows, _errors) = load_all(&root)?;
    Ok(workflows
        .iter()
        .filter(|workflow| matches(workflow, &event))
        .map(|workflow| workflow.name.clone())
        .collect())
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
