//! In-memory workflow document model.
//!
//! Scalar fields that the schema constrains to enums (`shell`,
//! `lifecycle`, `file.types`) deserialize as plain strings so a typo is
//! reported by the validator with a proper message instead of a serde
//! type error.

use hookflow_core::Lifecycle;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

fn default_max_parallel() -> u32 {
    1
}

/// A key that is *present* in the YAML but has a null value (`commit:`
/// with no children) deserializes to a default-constructed trigger. A nil
/// trigger would otherwise be indistinguishable from an absent key and
/// "match-all" semantics would be lost.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(Some(value.unwrap_or_default()))
}

/// A named policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether a failing step denies the gated tool call.
    #[serde(default = "default_true")]
    pub blocking: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<Concurrency>,

    #[serde(default)]
    pub on: TriggerSet,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}

/// Named concurrency group; invocations sharing a group name contend for
/// `max-parallel` slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concurrency {
    pub group: String,

    #[serde(rename = "max-parallel", default = "default_max_parallel")]
    pub max_parallel: u32,
}

/// The `on:` clause. Zero or more trigger variants; a workflow matches an
/// event when any one of them does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerSet {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub hooks: Option<HooksTrigger>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool: Option<ToolTrigger>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub tools: Option<Vec<ToolTrigger>>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<FileTrigger>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub commit: Option<CommitTrigger>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub push: Option<PushTrigger>,
}

impl TriggerSet {
    /// How many trigger variants are declared.
    pub fn declared(&self) -> usize {
        [
            self.hooks.is_some(),
            self.tool.is_some(),
            self.tools.is_some(),
            self.file.is_some(),
            self.commit.is_some(),
            self.push.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.declared() == 0
    }
}

/// Parse an optional lifecycle string; absent means `pre`.
pub(crate) fn parse_lifecycle(raw: Option<&str>) -> Lifecycle {
    match raw {
        Some("post") => Lifecycle::Post,
        _ => Lifecycle::Pre,
    }
}

/// Filter on raw hook events by hook type and tool name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HooksTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

impl HooksTrigger {
    pub fn lifecycle(&self) -> Lifecycle {
        parse_lifecycle(self.lifecycle.as_deref())
    }
}

/// Filter on a named tool invocation; each `args` entry is a glob the
/// stringified argument must match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
}

impl ToolTrigger {
    pub fn lifecycle(&self) -> Lifecycle {
        parse_lifecycle(self.lifecycle.as_deref())
    }
}

/// Filter on file modifications.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,

    /// Subset of {create, edit, delete}; empty matches all actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    #[serde(
        rename = "paths-ignore",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub paths_ignore: Vec<String>,
}

impl FileTrigger {
    pub fn lifecycle(&self) -> Lifecycle {
        parse_lifecycle(self.lifecycle.as_deref())
    }
}

/// Filter on detected `git commit` invocations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommitTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    #[serde(
        rename = "paths-ignore",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub paths_ignore: Vec<String>,
}

impl CommitTrigger {
    pub fn lifecycle(&self) -> Lifecycle {
        parse_lifecycle(self.lifecycle.as_deref())
    }
}

/// Filter on detected `git push` invocations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PushTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    #[serde(
        rename = "branches-ignore",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub branches_ignore: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(rename = "tags-ignore", default, skip_serializing_if = "Vec::is_empty")]
    pub tags_ignore: Vec<String>,
}

impl PushTrigger {
    pub fn lifecycle(&self) -> Lifecycle {
        parse_lifecycle(self.lifecycle.as_deref())
    }
}

/// Shells the schema admits for `steps[].shell`.
pub const SHELLS: &[&str] = &["bash", "sh", "pwsh", "powershell", "cmd"];

/// File actions the schema admits for `on.file.types`.
pub const FILE_TYPES: &[&str] = &["create", "edit", "delete"];

/// One unit of work. Exactly one of `run` or `uses` must be set; the
/// validator enforces it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(
        rename = "working-directory",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub working_directory: Option<String>,

    /// Whole seconds; must be positive when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,

    /// Inputs for `uses:` actions, exported as `INPUT_*` variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub with: BTreeMap<String, String>,

    #[serde(rename = "continue-on-error", default)]
    pub continue_on_error: bool,
}

impl Step {
    /// Display name; unnamed steps get `"Step N"` with a 1-based index.
    pub fn display_name(&self, index: usize) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Step {}", index + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_workflow_parses() {
        let wf: Workflow = serde_yaml::from_str(
            r#"
name: Block env edits
on:
  file:
    paths: ['**/.env']
    types: [edit]
steps:
  - run: exit 1
"#,
        )
        .unwrap();
        assert_eq!(wf.name, "Block env edits");
        assert!(wf.blocking, "blocking defaults to true");
        let file = wf.on.file.expect("file trigger present");
        assert_eq!(file.paths, vec!["**/.env"]);
        assert_eq!(file.types, vec!["edit"]);
        assert_eq!(wf.steps.len(), 1);
        assert_eq!(wf.steps[0].run.as_deref(), Some("exit 1"));
    }

    #[test]
    fn test_bare_trigger_key_is_present_and_default() {
        // `commit:` with no children must preserve match-all semantics.
        let wf: Workflow = serde_yaml::from_str(
            r#"
name: all commits
on:
  commit:
steps:
  - run: echo ok
"#,
        )
        .unwrap();
        let commit = wf.on.commit.expect("bare `commit:` must be present");
        assert_eq!(commit, CommitTrigger::default());
        assert!(commit.paths.is_empty());
    }

    #[test]
    fn test_absent_trigger_key_is_none() {
        let wf: Workflow = serde_yaml::from_str(
            r#"
name: x
on:
  file:
steps:
  - run: echo ok
"#,
        )
        .unwrap();
        assert!(wf.on.file.is_some());
        assert!(wf.on.commit.is_none());
        assert!(wf.on.push.is_none());
        assert_eq!(wf.on.declared(), 1);
    }

    #[test]
    fn test_lifecycle_default_is_pre() {
        let trigger = FileTrigger::default();
        assert_eq!(trigger.lifecycle(), Lifecycle::Pre);
        let trigger = FileTrigger {
            lifecycle: Some("post".into()),
            ..Default::default()
        };
        assert_eq!(trigger.lifecycle(), Lifecycle::Post);
    }

    #[test]
    fn test_step_display_name() {
        let unnamed = Step::default();
        assert_eq!(unnamed.display_name(0), "Step 1");
        assert_eq!(unnamed.display_name(2), "Step 3");
        let named = Step {
            name: Some("Lint".into()),
            ..Default::default()
        };
        assert_eq!(named.display_name(0), "Lint");
    }

    #[test]
    fn test_step_kebab_case_fields() {
        let step: Step = serde_yaml::from_str(
            r#"
name: build
run: make
working-directory: sub
continue-on-error: true
timeout: 30
"#,
        )
        .unwrap();
        assert_eq!(step.working_directory.as_deref(), Some("sub"));
        assert!(step.continue_on_error);
        assert_eq!(step.timeout, Some(30));
    }

    #[test]
    fn test_concurrency_defaults() {
        let c: Concurrency = serde_yaml::from_str("group: deploys").unwrap();
        assert_eq!(c.group, "deploys");
        assert_eq!(c.max_parallel, 1);

        let c: Concurrency =
            serde_yaml::from_str("group: deploys\nmax-parallel: 4").unwrap();
        assert_eq!(c.max_parallel, 4);
    }

    #[test]
    fn test_tools_list_trigger() {
        let wf: Workflow = serde_yaml::from_str(
            r#"
name: multi-tool
on:
  tools:
    - name: edit
      args:
        path: '**/*.rs'
    - name: write
steps:
  - run: echo ok
"#,
        )
        .unwrap();
        let tools = wf.on.tools.expect("tools present");
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "edit");
        assert_eq!(tools[0].args.get("path").unwrap(), "**/*.rs");
    }

    #[test]
    fn test_push_trigger_lists() {
        let wf: Workflow = serde_yaml::from_str(
            r#"
name: push-guard
on:
  push:
    branches: [main, 'release/*']
    tags-ignore: ['v0.*']
steps:
  - run: echo ok
"#,
        )
        .unwrap();
        let push = wf.on.push.unwrap();
        assert_eq!(push.branches, vec!["main", "release/*"]);
        assert_eq!(push.tags_ignore, vec!["v0.*"]);
    }
}
