//! Execution of a single step.

use crate::action::{input_env_key, load_action, resolve_action_dir};
use crate::cancel::CancelToken;
use crate::process::{ScriptSpec, Termination, run_script};
use hookflow_core::StepOutcome;
use hookflow_expr::{EvalContext, evaluate_bool, evaluate_string};
use hookflow_workflow::Step;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of one step, fed to the `steps` expression context and the
/// denial log.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub name: String,
    pub outcome: StepOutcome,
    pub output: String,
    pub error: Option<String>,
    pub duration: Duration,
}

impl StepResult {
    fn finished(name: String, start: Instant, outcome: StepOutcome, output: String, error: Option<String>) -> Self {
        Self {
            name,
            outcome,
            output,
            error,
            duration: start.elapsed(),
        }
    }

    pub(crate) fn skipped(name: String) -> Self {
        Self {
            name,
            outcome: StepOutcome::Skipped,
            output: String::new(),
            error: None,
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn cancelled(name: String) -> Self {
        Self {
            name,
            outcome: StepOutcome::Cancelled,
            output: String::new(),
            error: Some("cancelled before start".to_string()),
            duration: Duration::ZERO,
        }
    }
}

/// Everything a step needs from its surrounding workflow run.
pub(crate) struct StepScope<'a> {
    pub root: &'a Path,
    pub workflow_env: &'a BTreeMap<String, String>,
    pub ctx: &'a EvalContext,
    pub cancel: &'a CancelToken,
    /// Ambient deadline for the whole run, when the host set one.
    pub deadline: Option<Instant>,
}

/// Run one step: evaluate its condition, render its expressions, and
/// supervise its subprocess (or resolve its action).
pub(crate) fn run_step(step: &Step, index: usize, scope: &StepScope<'_>) -> StepResult {
    let name = step.display_name(index);
    let start = Instant::now();

    if let Some(condition) = &step.condition {
        match evaluate_bool(condition, scope.ctx) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(step = %name, "condition false, skipping");
                return StepResult::skipped(name);
            }
            // An unevaluable condition is an authoring bug the author must
            // see, not a silent skip.
            Err(e) => {
                return StepResult::finished(
                    name,
                    start,
                    StepOutcome::Failure,
                    String::new(),
                    Some(format!("'if' evaluation failed: {e}")),
                );
            }
        }
    }

    let body = match (&step.run, &step.uses) {
        (Some(run), None) => StepBody::Run(run.clone()),
        (None, Some(uses)) => StepBody::Uses(uses.clone()),
        _ => {
            return StepResult::finished(
                name,
                start,
                StepOutcome::Failure,
                String::new(),
                Some("exactly one of 'run' or 'uses' is required".to_string()),
            );
        }
    };

    let (outcome, output, error) = match body {
        StepBody::Run(script) => exec_rendered_script(
            &script,
            step.shell.as_deref(),
            step,
            &BTreeMap::new(),
            scope,
        ),
        StepBody::Uses(reference) => exec_action(&reference, step, scope),
    };

    StepResult::finished(name, start, outcome, output, error)
}

enum StepBody {
    Run(String),
    Uses(String),
}

type ExecOutcome = (StepOutcome, String, Option<String>);

fn failure(error: impl Into<String>) -> ExecOutcome {
    (StepOutcome::Failure, String::new(), Some(error.into()))
}

/// Render and run one script with the step's env/cwd/timeout.
fn exec_rendered_script(
    script: &str,
    shell: Option<&str>,
    step: &Step,
    extra_env: &BTreeMap<String, String>,
    scope: &StepScope<'_>,
) -> ExecOutcome {
    let script = match evaluate_string(script, scope.ctx) {
        Ok(script) => script,
        Err(e) => return failure(format!("failed to render 'run': {e}")),
    };

    let envs = match render_env(
        &[scope.workflow_env, &step.env, extra_env],
        scope.ctx,
    ) {
        Ok(envs) => envs,
        Err(e) => return failure(e),
    };

    let cwd = match working_dir(step, scope) {
        Ok(cwd) => cwd,
        Err(e) => return failure(e),
    };

    let timeout_secs = effective_timeout(step.timeout, scope.deadline);

    let spec = ScriptSpec {
        script: &script,
        shell,
        cwd: &cwd,
        envs: &envs,
        timeout_secs,
    };

    match run_script(&spec, scope.cancel) {
        Ok(result) => match result.termination {
            Termination::Exited(0) => (StepOutcome::Success, result.output, None),
            Termination::Exited(code) => (
                StepOutcome::Failure,
                result.output,
                Some(format!("exited with code {code}")),
            ),
            Termination::TimedOut(secs) => (
                StepOutcome::Failure,
                result.output,
                Some(format!("timed out after {secs} seconds")),
            ),
            Termination::Cancelled => (
                StepOutcome::Cancelled,
                result.output,
                Some("cancelled".to_string()),
            ),
        },
        Err(e) => failure(format!("{e:#}")),
    }
}

/// Resolve and execute a `uses:` action.
fn exec_action(reference: &str, step: &Step, scope: &StepScope<'_>) -> ExecOutcome {
    let dir = match resolve_action_dir(scope.root, reference) {
        Ok(dir) => dir,
        Err(e) => return failure(format!("{e:#}")),
    };
    let action = match load_action(&dir) {
        Ok(action) => action,
        Err(e) => return failure(format!("{e:#}")),
    };

    // `with:` inputs become INPUT_* variables, rendered like env values.
    let mut inputs = BTreeMap::new();
    for (key, value) in &step.with {
        inputs.insert(input_env_key(key), value.clone());
    }

    match action.runs.using.as_str() {
        "shell" => {
            let Some(run) = &action.runs.run else {
                return failure(format!(
                    "action {} declares 'using: shell' but has no 'run'",
                    dir.display()
                ));
            };
            let shell = action.runs.shell.as_deref().or(step.shell.as_deref());
            exec_rendered_script(run, shell, step, &inputs, scope)
        }
        "composite" => exec_composite(&action.runs.steps, step, &inputs, scope),
        other => failure(format!(
            "unsupported action runtime '{other}' in {} (expected 'shell' or 'composite')",
            dir.display()
        )),
    }
}

/// Inline substeps of a composite action, sharing the step's outcome and
/// output aggregation.
fn exec_composite(
    substeps: &[Step],
    step: &Step,
    inputs: &BTreeMap<String, String>,
    scope: &StepScope<'_>,
) -> ExecOutcome {
    let mut output = String::new();

    for (index, substep) in substeps.iter().enumerate() {
        if scope.cancel.is_cancelled() {
            return (StepOutcome::Cancelled, output, Some("cancelled".to_string()));
        }
        if substep.uses.is_some() {
            return (
                StepOutcome::Failure,
                output,
                Some("nested actions are not supported in composite steps".to_string()),
            );
        }
        let Some(script) = &substep.run else {
            return (
                StepOutcome::Failure,
                output,
                Some(format!("composite step {} has no 'run'", index + 1)),
            );
        };

        // Substep env layers on top of the action inputs.
        let mut layered = inputs.clone();
        layered.extend(substep.env.clone());

        let shell = substep.shell.as_deref().or(step.shell.as_deref());
        let (outcome, sub_output, error) =
            exec_rendered_script(script, shell, step, &layered, scope);
        output.push_str(&sub_output);

        match outcome {
            StepOutcome::Success => {}
            StepOutcome::Failure if substep.continue_on_error => {
                tracing::debug!(substep = index + 1, "composite substep failed, continuing");
            }
            other => return (other, output, error),
        }
    }

    (StepOutcome::Success, output, None)
}

/// Compose and render environment layers, later layers overriding.
fn render_env(
    layers: &[&BTreeMap<String, String>],
    ctx: &EvalContext,
) -> Result<Vec<(String, String)>, String> {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    for layer in layers {
        for (key, value) in *layer {
            let rendered = evaluate_string(value, ctx)
                .map_err(|e| format!("failed to render env '{key}': {e}"))?;
            merged.insert(key.clone(), rendered);
        }
    }
    Ok(merged.into_iter().collect())
}

/// The step's working directory: rendered `working-directory` under the
/// runner root, else the root itself. A missing directory is not
/// pre-checked; the spawn failure surfaces as the step outcome.
fn working_dir(step: &Step, scope: &StepScope<'_>) -> Result<PathBuf, String> {
    match &step.working_directory {
        Some(raw) => {
            let rendered = evaluate_string(raw, scope.ctx)
                .map_err(|e| format!("failed to render 'working-directory': {e}"))?;
            if rendered.is_empty() {
                Ok(scope.root.to_path_buf())
            } else if Path::new(&rendered).is_absolute() {
                Ok(PathBuf::from(rendered))
            } else {
                Ok(scope.root.join(rendered))
            }
        }
        None => Ok(scope.root.to_path_buf()),
    }
}

/// `min(step timeout, remaining ambient deadline)`, in whole seconds.
fn effective_timeout(step_timeout: Option<i64>, deadline: Option<Instant>) -> Option<u64> {
    let step_secs = step_timeout.filter(|t| *t > 0).map(|t| t as u64);
    let ambient_secs = deadline.map(|d| {
        let remaining = d.saturating_duration_since(Instant::now());
        // Whole-second granularity; an expired deadline still gets one
        // second rather than an instant kill loop.
        remaining.as_secs().max(1)
    });
    match (step_secs, ambient_secs) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
