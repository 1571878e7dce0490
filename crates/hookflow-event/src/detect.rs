//! Classify a raw hook payload into an [`Event`].

use crate::event::{CommitFile, CommitInfo, Event, FileInfo, HookInfo, PushInfo, ToolInfo};
use crate::git::GitProvider;
use hookflow_core::{AppError, FileAction};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

/// The agent host's stdin convention.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHookInput {
    tool_name: String,
    #[serde(default)]
    tool_args: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    cwd: String,
    #[serde(default)]
    timestamp: Option<String>,
}

/// File-modifying tools and the action each implies. Hosts with a wider
/// tool surface can alias onto these names.
const FILE_TOOLS: &[(&str, FileAction)] = &[
    ("edit", FileAction::Edit),
    ("str_replace", FileAction::Edit),
    ("create", FileAction::Create),
    ("write", FileAction::Create),
    ("delete", FileAction::Delete),
];

/// Tools whose `command` argument is scanned for git operations.
const SHELL_TOOLS: &[&str] = &["bash", "sh", "pwsh", "powershell", "cmd"];

/// Argument keys that may carry the written file content.
const CONTENT_KEYS: &[&str] = &["file_text", "new_str"];

static GIT_COMMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^git\s+(commit|ci)(\s|$)").expect("valid regex"));
static GIT_PUSH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^git\s+push(\s|$)").expect("valid regex"));
static COMMIT_MSG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:-m|--message)\s+(?:"([^"]*)"|'([^']*)'|(\S+))"#)
        .expect("valid regex")
});
static PUSH_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bv\d+\.\d+\.\d+\b").expect("valid regex"));

pub fn is_file_tool(name: &str) -> bool {
    FILE_TOOLS.iter().any(|(tool, _)| *tool == name)
}

pub fn is_shell_tool(name: &str) -> bool {
    SHELL_TOOLS.contains(&name)
}

fn file_action(name: &str) -> Option<FileAction> {
    FILE_TOOLS
        .iter()
        .find(|(tool, _)| *tool == name)
        .map(|(_, action)| *action)
}

/// Parse raw hook bytes into an [`Event`].
///
/// The `Tool` sub-event is always populated. File-modifying tools get a
/// `File` sub-event with the path copied verbatim (the gate normalizes it
/// later). Shell tools are scanned for `git commit` / `git push`, which
/// are enriched through the provider. Unparseable JSON is an
/// invocation-level error.
pub fn detect_from_raw_input(bytes: &[u8], git: &dyn GitProvider) -> Result<Event, AppError> {
    let raw: RawHookInput =
        serde_json::from_slice(bytes).map_err(|e| AppError::EventParse(e.to_string()))?;

    let tool = ToolInfo {
        name: raw.tool_name.clone(),
        args: raw.tool_args.clone(),
        hook_type: String::new(),
    };

    let mut event = Event {
        hook: Some(HookInfo {
            hook_type: String::new(),
            tool: Some(tool.clone()),
            cwd: raw.cwd.clone(),
        }),
        tool: Some(tool),
        cwd: raw.cwd,
        timestamp: raw.timestamp,
        ..Default::default()
    };

    if let Some(action) = file_action(&raw.tool_name) {
        if let Some(path) = raw.tool_args.get("path").and_then(|v| v.as_str()) {
            let content = CONTENT_KEYS
                .iter()
                .find_map(|key| raw.tool_args.get(*key))
                .and_then(|v| v.as_str())
                .map(str::to_string);
            event.file = Some(FileInfo {
                path: path.to_string(),
                action,
                content,
            });
        } else {
            tracing::debug!(tool = %raw.tool_name, "file tool without 'path' argument");
        }
    } else if is_shell_tool(&raw.tool_name) {
        if let Some(command) = raw.tool_args.get("command").and_then(|v| v.as_str()) {
            scan_shell_command(command, &mut event, git);
        }
    }

    Ok(event)
}

/// Detect git operations in a shell command and enrich the event.
fn scan_shell_command(command: &str, event: &mut Event, git: &dyn GitProvider) {
    let cwd = Path::new(&event.cwd);

    for segment in split_commands(command) {
        let segment = segment.trim();
        if GIT_COMMIT_RE.is_match(segment) && event.commit.is_none() {
            let message = COMMIT_MSG_RE
                .captures(segment)
                .and_then(|caps| {
                    caps.get(1)
                        .or_else(|| caps.get(2))
                        .or_else(|| caps.get(3))
                })
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            let meta = git.last_commit(cwd).unwrap_or_else(|e| {
                tracing::debug!("git provider: last_commit failed: {e:#}");
                Default::default()
            });
            let files = git
                .staged_files(cwd)
                .unwrap_or_else(|e| {
                    tracing::debug!("git provider: staged_files failed: {e:#}");
                    Vec::new()
                })
                .into_iter()
                .map(|(path, status)| CommitFile { path, status })
                .collect();

            event.commit = Some(CommitInfo {
                sha: meta.sha,
                message,
                author: meta.author,
                files,
            });
        } else if GIT_PUSH_RE.is_match(segment) && event.push.is_none() {
            let git_ref = match PUSH_TAG_RE.find(segment) {
                Some(tag) => format!("refs/tags/{}", tag.as_str()),
                None => match git.current_branch(cwd) {
                    Ok(branch) => format!("refs/heads/{branch}"),
                    Err(e) => {
                        tracing::debug!("git provider: current_branch failed: {e:#}");
                        String::new()
                    }
                },
            };
            let after = git
                .last_commit(cwd)
                .map(|meta| meta.sha)
                .unwrap_or_default();

            event.push = Some(PushInfo {
                git_ref,
                before: String::new(),
                after,
            });
        }
    }
}

/// Split a shell command line into sub-commands on `&&`, `||`, `;` and
/// `&`, skipping separators inside single or double quotes. Git
/// invocations are only recognized at the start of a sub-command, never
/// inside a quoted string.
fn split_commands(command: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = command.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            '&' | ';' | '|' if !in_single && !in_double => {
                // Swallow the second half of `&&` / `||`.
                if (c == '&' || c == '|') && chars.peek() == Some(&c) {
                    chars.next();
                }
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}
