//! Sequencing steps and folding outcomes into a blocking verdict.

use crate::cancel::CancelToken;
use crate::logfile;
use crate::step::{StepResult, StepScope, run_step};
use hookflow_core::{StepOutcome, Verdict};
use hookflow_event::Event;
use hookflow_expr::{EvalContext, Value, evaluate_string};
use hookflow_workflow::Workflow;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

/// Parameters shared by every step of one workflow run.
pub struct RunOptions<'a> {
    pub root: &'a Path,
    pub cancel: CancelToken,
    /// Ambient deadline for the whole invocation.
    pub deadline: Option<Instant>,
    /// Where denial logs go; `None` disables log files.
    pub logs_dir: Option<&'a Path>,
}

impl<'a> RunOptions<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self {
            root,
            cancel: CancelToken::new(),
            deadline: None,
            logs_dir: None,
        }
    }
}

/// Run every step in declaration order.
///
/// After a `failure` or `cancelled` outcome on a step without
/// `continue-on-error`, the remaining steps are `skipped` without
/// touching a subprocess. An ambient cancellation marks the first
/// not-yet-started step `cancelled`; the rest skip.
pub fn run(workflow: &Workflow, event: &Event, opts: &RunOptions<'_>) -> Vec<StepResult> {
    let event_value = event.to_value();
    let env_root = build_env_root(workflow, &event_value);

    let mut results: Vec<StepResult> = Vec::with_capacity(workflow.steps.len());
    let mut steps_map: BTreeMap<String, Value> = BTreeMap::new();
    let mut outcomes: Vec<StepOutcome> = Vec::new();
    let mut halted = false;

    for (index, step) in workflow.steps.iter().enumerate() {
        let name = step.display_name(index);

        let result = if halted {
            StepResult::skipped(name)
        } else if opts.cancel.is_cancelled() {
            StepResult::cancelled(name)
        } else {
            let ctx = EvalContext {
                event: event_value.clone(),
                env: env_root.clone(),
                steps: Value::Map(steps_map.clone()),
                prior_outcomes: outcomes.clone(),
            };
            let scope = StepScope {
                root: opts.root,
                workflow_env: &workflow.env,
                ctx: &ctx,
                cancel: &opts.cancel,
                deadline: opts.deadline,
            };
            run_step(step, index, &scope)
        };

        tracing::debug!(
            workflow = %workflow.name,
            step = %result.name,
            outcome = %result.outcome,
            "step finished"
        );

        if result.outcome.halts_workflow() && !step.continue_on_error {
            halted = true;
        }
        outcomes.push(result.outcome);
        steps_map.insert(result.name.clone(), step_value(&result));
        results.push(result);
    }

    results
}

/// Run the workflow and fold results into a gate verdict.
///
/// Non-blocking workflows always allow. A blocking workflow denies when
/// any step ends in `failure` — including one flagged
/// `continue-on-error`, which changes sequencing but not aggregation.
pub fn run_with_blocking(workflow: &Workflow, event: &Event, opts: &RunOptions<'_>) -> Verdict {
    let results = run(workflow, event, opts);

    if !workflow.is_blocking() {
        let ran = results
            .iter()
            .filter(|r| r.outcome != StepOutcome::Skipped)
            .count();
        return Verdict::allow_with_reason(format!(
            "workflow '{}' is non-blocking; {ran} step(s) ran",
            workflow.name
        ));
    }

    let Some(first_failing) = results
        .iter()
        .find(|r| r.outcome == StepOutcome::Failure)
    else {
        return Verdict::allow();
    };

    let mut reason = format!(
        "workflow '{}' blocked by step '{}'",
        workflow.name, first_failing.name
    );
    if let Some(error) = &first_failing.error {
        reason.push_str(&format!(": {error}"));
    }

    let mut verdict = Verdict::deny(String::new());
    if let Some(dir) = opts.logs_dir {
        match logfile::write_denial_log(dir, workflow, &results) {
            Ok(path) => {
                reason.push_str(&format!("; see {}", path.display()));
                verdict.log_file = Some(path.display().to_string());
            }
            Err(e) => {
                tracing::warn!("failed to write denial log: {e:#}");
            }
        }
    }
    verdict.reason = Some(reason);
    verdict
}

/// The `env` root: the process environment overlaid with the workflow's
/// env block. Values that render cleanly are exposed rendered; a value
/// whose expression fails stays raw here and surfaces its error when the
/// step exports it.
fn build_env_root(workflow: &Workflow, event_value: &Value) -> Value {
    let mut map: BTreeMap<String, Value> = std::env::vars()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    let base_ctx = EvalContext {
        event: event_value.clone(),
        env: Value::Map(map.clone()),
        ..Default::default()
    };
    for (key, value) in &workflow.env {
        let rendered = evaluate_string(value, &base_ctx).unwrap_or_else(|_| value.clone());
        map.insert(key.clone(), Value::String(rendered));
    }
    Value::Map(map)
}

/// What later steps see as `steps.<name>`.
fn step_value(result: &StepResult) -> Value {
    let mut map = BTreeMap::new();
    map.insert(
        "outcome".to_string(),
        Value::String(result.outcome.as_str().to_string()),
    );
    map.insert("output".to_string(), Value::String(result.output.clone()));
    Value::Map(map)
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
