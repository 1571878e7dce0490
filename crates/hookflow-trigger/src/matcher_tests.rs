use super::*;
use hookflow_core::{FileAction, Lifecycle};
use hookflow_event::{CommitFile, CommitInfo, FileInfo, HookInfo, PushInfo, ToolInfo};
use hookflow_workflow::load_workflow_str;

fn workflow(yaml: &str) -> Workflow {
    load_workflow_str(yaml).unwrap()
}

fn file_event(path: &str, action: FileAction) -> Event {
    Event {
        file: Some(FileInfo {
            path: path.to_string(),
            action,
            content: None,
        }),
        cwd: "/repo".into(),
        lifecycle: Lifecycle::Pre,
        ..Default::default()
    }
}

fn tool_event(name: &str, args: &[(&str, serde_json::Value)]) -> Event {
    let mut map = serde_json::Map::new();
    for (k, v) in args {
        map.insert(k.to_string(), v.clone());
    }
    let tool = ToolInfo {
        name: name.to_string(),
        args: map,
        hook_type: "preToolUse".into(),
    };
    Event {
        hook: Some(HookInfo {
            hook_type: "preToolUse".into(),
            tool: Some(tool.clone()),
            cwd: "/repo".into(),
        }),
        tool: Some(tool),
        cwd: "/repo".into(),
        lifecycle: Lifecycle::Pre,
        ..Default::default()
    }
}

#[test]
fn test_file_trigger_path_and_type() {
    let wf = workflow(
        r#"
name: block-env
on:
  file:
    paths: ['**/.env']
    types: [edit]
steps:
  - run: exit 1
"#,
    );
    assert!(matches(&wf, &file_event(".env", FileAction::Edit)));
    assert!(matches(&wf, &file_event("config/.env", FileAction::Edit)));
    assert!(!matches(&wf, &file_event(".env", FileAction::Create)));
    assert!(!matches(&wf, &file_event("README.md", FileAction::Edit)));
    assert!(!matches(&wf, &file_event(".env.local", FileAction::Edit)));
}

#[test]
fn test_file_trigger_empty_types_matches_all_actions() {
    let wf = workflow(
        r#"
name: any-action
on:
  file:
    paths: ['src/**']
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &file_event("src/a.rs", FileAction::Create)));
    assert!(matches(&wf, &file_event("src/a.rs", FileAction::Delete)));
}

#[test]
fn test_file_trigger_no_paths_matches_everything() {
    let wf = workflow(
        r#"
name: all-files
on:
  file:
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &file_event("anything/at/all", FileAction::Edit)));
}

#[test]
fn test_file_trigger_paths_ignore_wins() {
    let wf = workflow(
        r#"
name: ignore-vendor
on:
  file:
    paths: ['**/*.js']
    paths-ignore: ['vendor/**']
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &file_event("src/a.js", FileAction::Edit)));
    assert!(!matches(&wf, &file_event("vendor/a.js", FileAction::Edit)));
}

#[test]
fn test_file_trigger_negation_in_paths() {
    let wf = workflow(
        r#"
name: negated
on:
  file:
    paths: ['**/*.js', '!**/*.test.js']
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &file_event("src/a.js", FileAction::Edit)));
    assert!(!matches(&wf, &file_event("src/a.test.js", FileAction::Edit)));
}

#[test]
fn test_file_trigger_lifecycle_mismatch() {
    let wf = workflow(
        r#"
name: post-only
on:
  file:
    lifecycle: post
    paths: ['**/*.rs']
steps:
  - run: echo
"#,
    );
    let pre = file_event("src/a.rs", FileAction::Edit);
    assert!(!matches(&wf, &pre));

    let mut post = pre.clone();
    post.lifecycle = Lifecycle::Post;
    assert!(matches(&wf, &post));
}

#[test]
fn test_file_trigger_requires_file_event() {
    let wf = workflow(
        r#"
name: file-only
on:
  file:
steps:
  - run: echo
"#,
    );
    assert!(!matches(&wf, &tool_event("grep", &[])));
}

#[test]
fn test_tool_trigger_name_equality() {
    let wf = workflow(
        r#"
name: edit-tool
on:
  tool:
    name: edit
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &tool_event("edit", &[])));
    assert!(!matches(&wf, &tool_event("write", &[])));
}

#[test]
fn test_tool_trigger_arg_globs() {
    let wf = workflow(
        r#"
name: js-edits
on:
  tool:
    name: edit
    args:
      path: '**/*.js'
steps:
  - run: echo
"#,
    );
    assert!(matches(
        &wf,
        &tool_event("edit", &[("path", serde_json::json!("src/a.js"))])
    ));
    assert!(!matches(
        &wf,
        &tool_event("edit", &[("path", serde_json::json!("src/a.rs"))])
    ));
    // Missing arg stringifies empty and fails the glob
    assert!(!matches(&wf, &tool_event("edit", &[])));
}

#[test]
fn test_tool_trigger_numeric_arg_stringified() {
    let wf = workflow(
        r#"
name: numeric
on:
  tool:
    name: resize
    args:
      width: '12*'
steps:
  - run: echo
"#,
    );
    assert!(matches(
        &wf,
        &tool_event("resize", &[("width", serde_json::json!(120))])
    ));
    assert!(!matches(
        &wf,
        &tool_event("resize", &[("width", serde_json::json!(80))])
    ));
}

#[test]
fn test_tools_list_any_matches() {
    let wf = workflow(
        r#"
name: multi
on:
  tools:
    - name: edit
    - name: write
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &tool_event("edit", &[])));
    assert!(matches(&wf, &tool_event("write", &[])));
    assert!(!matches(&wf, &tool_event("grep", &[])));
}

#[test]
fn test_hooks_trigger_type_filter() {
    let wf = workflow(
        r#"
name: post-hooks
on:
  hooks:
    types: [postToolUse]
steps:
  - run: echo
"#,
    );
    let mut event = tool_event("edit", &[]);
    assert!(!matches(&wf, &event));
    event.hook.as_mut().unwrap().hook_type = "postToolUse".into();
    assert!(matches(&wf, &event));
}

#[test]
fn test_hooks_trigger_tool_filter() {
    let wf = workflow(
        r#"
name: bash-hooks
on:
  hooks:
    tools: [bash, sh]
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &tool_event("bash", &[])));
    assert!(!matches(&wf, &tool_event("edit", &[])));
}

#[test]
fn test_hooks_trigger_bare_matches_any_hook() {
    let wf = workflow(
        r#"
name: all-hooks
on:
  hooks:
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &tool_event("anything", &[])));
}

fn commit_event(paths: &[&str]) -> Event {
    Event {
        commit: Some(CommitInfo {
            sha: "abc".into(),
            message: "msg".into(),
            author: "dev".into(),
            files: paths
                .iter()
                .map(|p| CommitFile {
                    path: p.to_string(),
                    status: "M".into(),
                })
                .collect(),
        }),
        cwd: "/repo".into(),
        lifecycle: Lifecycle::Pre,
        ..Default::default()
    }
}

#[test]
fn test_commit_trigger_bare_matches_all_commits() {
    let wf = workflow(
        r#"
name: all-commits
on:
  commit:
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &commit_event(&["anything.txt"])));
    assert!(matches(&wf, &commit_event(&[])));
}

#[test]
fn test_commit_trigger_paths_need_one_match() {
    let wf = workflow(
        r#"
name: src-commits
on:
  commit:
    paths: ['src/**']
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &commit_event(&["src/a.rs", "docs/b.md"])));
    assert!(!matches(&wf, &commit_event(&["docs/b.md"])));
}

#[test]
fn test_commit_trigger_ignore_must_cover_all() {
    let wf = workflow(
        r#"
name: ignore-docs
on:
  commit:
    paths-ignore: ['docs/**']
steps:
  - run: echo
"#,
    );
    // Only excluded when every committed file is ignored
    assert!(!matches(&wf, &commit_event(&["docs/a.md", "docs/b.md"])));
    assert!(matches(&wf, &commit_event(&["docs/a.md", "src/c.rs"])));
}

fn push_event(git_ref: &str) -> Event {
    Event {
        push: Some(PushInfo {
            git_ref: git_ref.to_string(),
            before: String::new(),
            after: "abc".into(),
        }),
        cwd: "/repo".into(),
        lifecycle: Lifecycle::Pre,
        ..Default::default()
    }
}

#[test]
fn test_push_trigger_branch_include() {
    let wf = workflow(
        r#"
name: main-pushes
on:
  push:
    branches: [main, 'release/*']
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &push_event("refs/heads/main")));
    assert!(matches(&wf, &push_event("refs/heads/release/1.0")));
    assert!(!matches(&wf, &push_event("refs/heads/dev")));
    // Tags are not consulted against branch lists
    assert!(matches(&wf, &push_event("refs/tags/v1.0.0")));
}

#[test]
fn test_push_trigger_branch_ignore() {
    let wf = workflow(
        r#"
name: no-wip
on:
  push:
    branches-ignore: ['wip/*']
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &push_event("refs/heads/main")));
    assert!(!matches(&wf, &push_event("refs/heads/wip/x")));
}

#[test]
fn test_push_trigger_tags() {
    let wf = workflow(
        r#"
name: releases
on:
  push:
    tags: ['v*']
    tags-ignore: ['v0.*']
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &push_event("refs/tags/v1.2.3")));
    assert!(!matches(&wf, &push_event("refs/tags/v0.9.0")));
    assert!(!matches(&wf, &push_event("refs/tags/nightly")));
}

#[test]
fn test_push_trigger_unparseable_ref() {
    let wf = workflow(
        r#"
name: pushes
on:
  push:
steps:
  - run: echo
"#,
    );
    assert!(!matches(&wf, &push_event("")));
    assert!(!matches(&wf, &push_event("HEAD")));
    assert!(matches(&wf, &push_event("refs/heads/any")));
}

#[test]
fn test_any_of_multiple_triggers_suffices() {
    let wf = workflow(
        r#"
name: multi-trigger
on:
  file:
    paths: ['*.md']
  commit:
steps:
  - run: echo
"#,
    );
    assert!(matches(&wf, &file_event("README.md", FileAction::Edit)));
    assert!(matches(&wf, &commit_event(&["src/x.rs"])));
    assert!(!matches(&wf, &file_event("src/x.rs", FileAction::Edit)));
}

#[test]
fn test_no_triggers_never_matches() {
    let wf = Workflow {
        name: "empty".into(),
        ..workflow("name: x\non:\n  commit:\nsteps:\n  - run: echo\n")
    };
    let wf = Workflow {
        on: Default::default(),
        ..wf
    };
    assert!(!matches(&wf, &commit_event(&["a"])));
    assert!(!matches(&wf, &tool_event("edit", &[])));
}
