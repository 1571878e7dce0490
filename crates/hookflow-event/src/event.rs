//! The runtime fact being judged.

use hookflow_core::{FileAction, Lifecycle};
use hookflow_expr::Value;
use std::collections::BTreeMap;

/// One detected hook event. At most one of the sub-variants beyond `tool`
/// is populated; `tool` always carries the raw invocation.
///
/// Constructed once by the detector, adjusted by the gate (path
/// normalization, lifecycle stamping), then read-only for matching and
/// step execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub hook: Option<HookInfo>,
    pub tool: Option<ToolInfo>,
    pub file: Option<FileInfo>,
    pub commit: Option<CommitInfo>,
    pub push: Option<PushInfo>,
    /// Absolute working directory of the gated tool call.
    pub cwd: String,
    pub timestamp: Option<String>,
    pub lifecycle: Lifecycle,
}

/// The raw hook envelope: which lifecycle fired and for which tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookInfo {
    /// Host event-type string (`preToolUse`, `postToolUse`, …); stamped
    /// by the gate from its `--event-type` flag.
    pub hook_type: String,
    pub tool: Option<ToolInfo>,
    pub cwd: String,
}

/// The tool invocation as the host reported it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    /// Raw argument object, untouched.
    pub args: serde_json::Map<String, serde_json::Value>,
    pub hook_type: String,
}

/// A file modification synthesized from a file-modifying tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    /// Raw at detection time; the gate normalizes it against `cwd`
    /// before trigger matching.
    pub path: String,
    pub action: FileAction,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub files: Vec<CommitFile>,
}

/// One staged file in a detected commit, with its git status letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFile {
    pub path: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushInfo {
    /// Fully-qualified ref (`refs/heads/<b>` or `refs/tags/<t>`).
    pub git_ref: String,
    pub before: String,
    pub after: String,
}

impl Event {
    /// The dynamic tree the expression engine sees as `event`.
    pub fn to_value(&self) -> Value {
        let mut root = BTreeMap::new();
        root.insert("cwd".to_string(), Value::String(self.cwd.clone()));
        root.insert(
            "timestamp".to_string(),
            match &self.timestamp {
                Some(ts) => Value::String(ts.clone()),
                None => Value::Null,
            },
        );
        root.insert(
            "lifecycle".to_string(),
            Value::String(self.lifecycle.as_str().to_string()),
        );

        if let Some(hook) = &self.hook {
            let mut m = BTreeMap::new();
            m.insert("type".to_string(), Value::String(hook.hook_type.clone()));
            m.insert("cwd".to_string(), Value::String(hook.cwd.clone()));
            if let Some(tool) = &hook.tool {
                m.insert("tool".to_string(), tool_value(tool));
            }
            root.insert("hook".to_string(), Value::Map(m));
        }
        if let Some(tool) = &self.tool {
            root.insert("tool".to_string(), tool_value(tool));
        }
        if let Some(file) = &self.file {
            let mut m = BTreeMap::new();
            m.insert("path".to_string(), Value::String(file.path.clone()));
            m.insert(
                "action".to_string(),
                Value::String(file.action.as_str().to_string()),
            );
            m.insert(
                "content".to_string(),
                match &file.content {
                    Some(content) => Value::String(content.clone()),
                    None => Value::Null,
                },
            );
            root.insert("file".to_string(), Value::Map(m));
        }
        if let Some(commit) = &self.commit {
            let files = commit
                .files
                .iter()
                .map(|f| {
                    let mut m = BTreeMap::new();
                    m.insert("path".to_string(), Value::String(f.path.clone()));
                    m.insert("status".to_string(), Value::String(f.status.clone()));
                    Value::Map(m)
                })
                .collect();
            let mut m = BTreeMap::new();
            m.insert("sha".to_string(), Value::String(commit.sha.clone()));
            m.insert("message".to_string(), Value::String(commit.message.clone()));
            m.insert("author".to_string(), Value::String(commit.author.clone()));
            m.insert("files".to_string(), Value::List(files));
            root.insert("commit".to_string(), Value::Map(m));
        }
        if let Some(push) = &self.push {
            let mut m = BTreeMap::new();
            m.insert("ref".to_string(), Value::String(push.git_ref.clone()));
            m.insert("before".to_string(), Value::String(push.before.clone()));
            m.insert("after".to_string(), Value::String(push.after.clone()));
            root.insert("push".to_string(), Value::Map(m));
        }

        Value::Map(root)
    }
}

fn tool_value(tool: &ToolInfo) -> Value {
    let mut m = BTreeMap::new();
    m.insert("name".to_string(), Value::String(tool.name.clone()));
    m.insert(
        "args".to_string(),
        Value::from_json(&serde_json::Value::Object(tool.args.clone())),
    );
    m.insert(
        "hookType".to_string(),
        Value::String(tool.hook_type.clone()),
    );
    Value::Map(m)
}
