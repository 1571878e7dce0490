//! Structural validation of workflow documents.
//!
//! Failures are collected into [`ValidationError`]s, one per file; the
//! gate folds them into its verdict (or the self-repair exception).

use crate::discover;
use crate::loader::load_workflow_str;
use crate::model::{FILE_TYPES, SHELLS, TriggerSet, Workflow};
use anyhow::Result;
use std::path::Path;

/// Everything wrong with one workflow file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub file: String,
    pub message: String,
    pub details: Vec<String>,
}

impl ValidationError {
    /// One-line rendering used in deny reasons.
    pub fn summary(&self) -> String {
        if self.details.is_empty() {
            format!("{}: {}", self.file, self.message)
        } else {
            format!("{}: {} ({})", self.file, self.message, self.details.join("; "))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn lifecycle_ok(raw: &Option<String>) -> bool {
    match raw.as_deref() {
        None | Some("pre") | Some("post") => true,
        Some(_) => false,
    }
}

/// Structural checks over an already-parsed document. Returns the list of
/// problems; empty means valid.
pub fn validate_model(workflow: &Workflow) -> Vec<String> {
    let mut problems = Vec::new();

    if workflow.name.trim().is_empty() {
        problems.push("'name' is required and must be non-empty".to_string());
    }

    validate_triggers(&workflow.on, &mut problems);

    if workflow.steps.is_empty() {
        problems.push("'steps' must contain at least one step".to_string());
    }

    if let Some(concurrency) = &workflow.concurrency {
        if concurrency.group.trim().is_empty() {
            problems.push("'concurrency.group' must be non-empty".to_string());
        }
        if concurrency.max_parallel < 1 {
            problems.push("'concurrency.max-parallel' must be >= 1".to_string());
        }
    }

    for (index, step) in workflow.steps.iter().enumerate() {
        let label = step.display_name(index);

        match (step.run.is_some(), step.uses.is_some()) {
            (true, true) => {
                problems.push(format!("step '{label}': 'run' and 'uses' are mutually exclusive"))
            }
            (false, false) => {
                problems.push(format!("step '{label}': exactly one of 'run' or 'uses' is required"))
            }
            _ => {}
        }

        if let Some(timeout) = step.timeout {
            if timeout <= 0 {
                problems.push(format!(
                    "step '{label}': 'timeout' must be a positive integer (got {timeout})"
                ));
            }
        }

        if let Some(shell) = step.shell.as_deref() {
            if !SHELLS.contains(&shell) {
                problems.push(format!(
                    "step '{label}': unknown shell '{shell}' (expected one of {SHELLS:?})"
                ));
            }
        }
    }

    problems
}

fn validate_triggers(on: &TriggerSet, problems: &mut Vec<String>) {
    if on.is_empty() {
        problems.push("'on' must declare at least one trigger".to_string());
        return;
    }

    if let Some(hooks) = &on.hooks {
        if !lifecycle_ok(&hooks.lifecycle) {
            problems.push("'on.hooks.lifecycle' must be 'pre' or 'post'".to_string());
        }
    }

    if let Some(tool) = &on.tool {
        if tool.name.trim().is_empty() {
            problems.push("'on.tool.name' is required".to_string());
        }
        if !lifecycle_ok(&tool.lifecycle) {
            problems.push("'on.tool.lifecycle' must be 'pre' or 'post'".to_string());
        }
    }

    if let Some(tools) = &on.tools {
        for (index, tool) in tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                problems.push(format!("'on.tools[{index}].name' is required"));
            }
            if !lifecycle_ok(&tool.lifecycle) {
                problems.push(format!(
                    "'on.tools[{index}].lifecycle' must be 'pre' or 'post'"
                ));
            }
        }
    }

    if let Some(file) = &on.file {
        if !lifecycle_ok(&file.lifecycle) {
            problems.push("'on.file.lifecycle' must be 'pre' or 'post'".to_string());
        }
        for t in &file.types {
            if !FILE_TYPES.contains(&t.as_str()) {
                problems.push(format!(
                    "'on.file.types' entry '{t}' is invalid (expected one of {FILE_TYPES:?})"
                ));
            }
        }
    }

    if let Some(commit) = &on.commit {
        if !lifecycle_ok(&commit.lifecycle) {
            problems.push("'on.commit.lifecycle' must be 'pre' or 'post'".to_string());
        }
    }

    if let Some(push) = &on.push {
        if !lifecycle_ok(&push.lifecycle) {
            problems.push("'on.push.lifecycle' must be 'pre' or 'post'".to_string());
        }
    }
}

/// Load and validate one workflow file. Parse failures and structural
/// problems both land in the result; nothing is thrown.
pub fn validate_workflow_file(path: &Path) -> ValidationResult {
    let file = path.display().to_string();

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            return ValidationResult {
                errors: vec![ValidationError {
                    file,
                    message: "cannot read workflow file".to_string(),
                    details: vec![e.to_string()],
                }],
            };
        }
    };

    match load_workflow_str(&text) {
        Ok(workflow) => {
            let problems = validate_model(&workflow);
            if problems.is_empty() {
                ValidationResult::default()
            } else {
                ValidationResult {
                    errors: vec![ValidationError {
                        file,
                        message: "Invalid workflow".to_string(),
                        details: problems,
                    }],
                }
            }
        }
        Err(e) => ValidationResult {
            errors: vec![ValidationError {
                file,
                message: "Invalid workflow".to_string(),
                details: vec![e.to_string()],
            }],
        },
    }
}

/// Validate every workflow file under `root/.github/hooks`. A missing
/// hooks directory is valid; only discovery I/O failures are errors.
pub fn validate_workflows_in_dir(root: &Path) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();
    for discovered in discover::discover(root)? {
        let file_result = validate_workflow_file(&discovered.path);
        result.errors.extend(file_result.errors);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Concurrency, Step};

    fn valid_workflow() -> Workflow {
        load_workflow_str(
            r#"
name: ok
on:
  file:
    paths: ['**/*.rs']
steps:
  - run: echo hi
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_workflow_has_no_problems() {
        assert!(validate_model(&valid_workflow()).is_empty());
    }

    #[test]
    fn test_missing_name() {
        let mut wf = valid_workflow();
        wf.name = String::new();
        let problems = validate_model(&wf);
        assert!(problems.iter().any(|p| p.contains("'name'")));
    }

    #[test]
    fn test_no_triggers() {
        let mut wf = valid_workflow();
        wf.on = TriggerSet::default();
        let problems = validate_model(&wf);
        assert!(problems.iter().any(|p| p.contains("at least one trigger")));
    }

    #[test]
    fn test_empty_steps() {
        let mut wf = valid_workflow();
        wf.steps.clear();
        let problems = validate_model(&wf);
        assert!(problems.iter().any(|p| p.contains("at least one step")));
    }

    #[test]
    fn test_step_needs_run_or_uses() {
        let mut wf = valid_workflow();
        wf.steps = vec![Step::default()];
        let problems = validate_model(&wf);
        assert!(
            problems
                .iter()
                .any(|p| p.contains("exactly one of 'run' or 'uses'"))
        );

        wf.steps = vec![Step {
            run: Some("echo".into()),
            uses: Some("./action".into()),
            ..Default::default()
        }];
        let problems = validate_model(&wf);
        assert!(problems.iter().any(|p| p.contains("mutually exclusive")));
    }

    #[test]
    fn test_timeout_must_be_positive() {
        let mut wf = valid_workflow();
        wf.steps[0].timeout = Some(0);
        assert!(
            validate_model(&wf)
                .iter()
                .any(|p| p.contains("'timeout' must be a positive integer"))
        );
        wf.steps[0].timeout = Some(-5);
        assert!(!validate_model(&wf).is_empty());
        wf.steps[0].timeout = Some(1);
        assert!(validate_model(&wf).is_empty());
    }

    #[test]
    fn test_unknown_shell() {
        let mut wf = valid_workflow();
        wf.steps[0].shell = Some("zsh".into());
        assert!(
            validate_model(&wf)
                .iter()
                .any(|p| p.contains("unknown shell 'zsh'"))
        );
        wf.steps[0].shell = Some("pwsh".into());
        assert!(validate_model(&wf).is_empty());
    }

    #[test]
    fn test_invalid_file_type() {
        let wf = load_workflow_str(
            r#"
name: x
on:
  file:
    types: [edit, rename]
steps:
  - run: echo
"#,
        )
        .unwrap();
        assert!(
            validate_model(&wf)
                .iter()
                .any(|p| p.contains("'rename' is invalid"))
        );
    }

    #[test]
    fn test_invalid_lifecycle() {
        let wf = load_workflow_str(
            r#"
name: x
on:
  commit:
    lifecycle: during
steps:
  - run: echo
"#,
        )
        .unwrap();
        assert!(
            validate_model(&wf)
                .iter()
                .any(|p| p.contains("'on.commit.lifecycle'"))
        );
    }

    #[test]
    fn test_concurrency_constraints() {
        let mut wf = valid_workflow();
        wf.concurrency = Some(Concurrency {
            group: "  ".into(),
            max_parallel: 0,
        });
        let problems = validate_model(&wf);
        assert!(problems.iter().any(|p| p.contains("concurrency.group")));
        assert!(problems.iter().any(|p| p.contains("max-parallel")));
    }

    #[test]
    fn test_validate_file_collects_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        std::fs::write(&path, "steps: [}").unwrap();

        let result = validate_workflow_file(&path);
        assert!(!result.is_valid());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "Invalid workflow");
        assert!(result.errors[0].file.ends_with("broken.yml"));
    }

    #[test]
    fn test_validate_dir_missing_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_workflows_in_dir(dir.path()).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_dir_mixed_files() {
        let dir = tempfile::tempdir().unwrap();
        let hooks = dir.path().join(".github/hooks");
        std::fs::create_dir_all(&hooks).unwrap();
        std::fs::write(
            hooks.join("good.yml"),
            "name: good\non:\n  commit:\nsteps:\n  - run: echo ok\n",
        )
        .unwrap();
        std::fs::write(hooks.join("bad.yml"), "name: bad\nsteps: []\n").unwrap();
        // Non-YAML files are ignored entirely
        std::fs::write(hooks.join("notes.txt"), "not yaml").unwrap();

        let result = validate_workflows_in_dir(dir.path()).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].file.ends_with("bad.yml"));
    }

    #[test]
    fn test_summary_includes_details() {
        let err = ValidationError {
            file: "x.yml".into(),
            message: "Invalid workflow".into(),
            details: vec!["'name' is required".into()],
        };
        let summary = err.summary();
        assert!(summary.contains("x.yml"));
        assert!(summary.contains("'name' is required"));
    }
}
