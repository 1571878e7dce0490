//! Event detection: the raw hook JSON an agent host pipes in becomes a
//! typed [`Event`], enriched through an injectable [`GitProvider`] when a
//! shell command turns out to be a `git commit` or `git push`.

pub mod detect;
pub mod event;
pub mod git;

pub use detect::{detect_from_raw_input, is_file_tool, is_shell_tool};
pub use event::{CommitFile, CommitInfo, Event, FileInfo, HookInfo, PushInfo, ToolInfo};
pub use git::{CliGitProvider, CommitMeta, GitProvider, ScriptedGit};
