//! Trigger matching: does a workflow's `on:` clause select an event?
//!
//! A workflow matches when *any* declared trigger variant matches. Pattern
//! lists follow the glob semantics of `hookflow-glob`, including `!`
//! negation.

use hookflow_event::Event;
use hookflow_expr::Value;
use hookflow_glob::{glob_match, match_list};
use hookflow_workflow::{
    CommitTrigger, FileTrigger, HooksTrigger, PushTrigger, ToolTrigger, Workflow,
};

/// True when any declared trigger of `workflow` matches `event`.
pub fn matches(workflow: &Workflow, event: &Event) -> bool {
    let on = &workflow.on;

    if let Some(hooks) = &on.hooks {
        if hooks_matches(hooks, event) {
            return true;
        }
    }
    if let Some(tool) = &on.tool {
        if tool_matches(tool, event) {
            return true;
        }
    }
    if let Some(tools) = &on.tools {
        if tools.iter().any(|tool| tool_matches(tool, event)) {
            return true;
        }
    }
    if let Some(file) = &on.file {
        if file_matches(file, event) {
            return true;
        }
    }
    if let Some(commit) = &on.commit {
        if commit_matches(commit, event) {
            return true;
        }
    }
    if let Some(push) = &on.push {
        if push_matches(push, event) {
            return true;
        }
    }
    false
}

fn hooks_matches(trigger: &HooksTrigger, event: &Event) -> bool {
    let Some(hook) = &event.hook else {
        return false;
    };
    if !trigger.types.is_empty() && !trigger.types.iter().any(|t| *t == hook.hook_type) {
        return false;
    }
    if !trigger.tools.is_empty() {
        let tool_name = hook.tool.as_ref().map(|t| t.name.as_str()).unwrap_or("");
        if !trigger.tools.iter().any(|t| t == tool_name) {
            return false;
        }
    }
    true
}

/// The stringified form an argument glob is matched against.
fn stringify_arg(value: &serde_json::Value) -> String {
    Value::from_json(value).to_display_string()
}

fn tool_matches(trigger: &ToolTrigger, event: &Event) -> bool {
    let Some(tool) = &event.tool else {
        return false;
    };
    if trigger.name != tool.name {
        return false;
    }
    trigger.args.iter().all(|(key, pattern)| {
        let actual = tool
            .args
            .get(key)
            .map(stringify_arg)
            .unwrap_or_default();
        glob_match(pattern, &actual)
    })
}

fn file_matches(trigger: &FileTrigger, event: &Event) -> bool {
    let Some(file) = &event.file else {
        return false;
    };
    if trigger.lifecycle() != event.lifecycle {
        return false;
    }
    if !trigger.types.is_empty() && !trigger.types.iter().any(|t| t == file.action.as_str()) {
        return false;
    }
    if !trigger.paths_ignore.is_empty() && match_list(&trigger.paths_ignore, &file.path) {
        return false;
    }
    if !trigger.paths.is_empty() && !match_list(&trigger.paths, &file.path) {
        return false;
    }
    true
}

fn commit_matches(trigger: &CommitTrigger, event: &Event) -> bool {
    let Some(commit) = &event.commit else {
        return false;
    };
    if trigger.lifecycle() != event.lifecycle {
        return false;
    }
    if !trigger.paths_ignore.is_empty()
        && !commit.files.is_empty()
        && commit
            .files
            .iter()
            .all(|f| match_list(&trigger.paths_ignore, &f.path))
    {
        // Every committed file is ignored.
        return false;
    }
    if !trigger.paths.is_empty()
        && !commit
            .files
            .iter()
            .any(|f| match_list(&trigger.paths, &f.path))
    {
        return false;
    }
    true
}

fn push_matches(trigger: &PushTrigger, event: &Event) -> bool {
    let Some(push) = &event.push else {
        return false;
    };
    if trigger.lifecycle() != event.lifecycle {
        return false;
    }

    if let Some(branch) = push.git_ref.strip_prefix("refs/heads/") {
        if !trigger.branches_ignore.is_empty() && match_list(&trigger.branches_ignore, branch) {
            return false;
        }
        if !trigger.branches.is_empty() && !match_list(&trigger.branches, branch) {
            return false;
        }
        true
    } else if let Some(tag) = push.git_ref.strip_prefix("refs/tags/") {
        if !trigger.tags_ignore.is_empty() && match_list(&trigger.tags_ignore, tag) {
            return false;
        }
        if !trigger.tags.is_empty() && !match_list(&trigger.tags, tag) {
            return false;
        }
        true
    } else {
        false
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
