//! Injectable git capability used to enrich commit/push events.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

/// Identity of the most recent (or in-flight) commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitMeta {
    pub sha: String,
    pub author: String,
}

/// What the event detector needs from git. The real implementation shells
/// out; tests inject [`ScriptedGit`].
pub trait GitProvider {
    fn current_branch(&self, cwd: &Path) -> Result<String>;

    /// Staged files as `(path, status letter)` pairs.
    fn staged_files(&self, cwd: &Path) -> Result<Vec<(String, String)>>;

    fn last_commit(&self, cwd: &Path) -> Result<CommitMeta>;
}

/// Shells out to the `git` binary in the event's working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliGitProvider;

impl CliGitProvider {
    fn git(&self, cwd: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .output()
            .with_context(|| format!("failed to run git {args:?}"))?;
        if !output.status.success() {
            bail!(
                "git {args:?} exited with {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitProvider for CliGitProvider {
    fn current_branch(&self, cwd: &Path) -> Result<String> {
        self.git(cwd, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn staged_files(&self, cwd: &Path) -> Result<Vec<(String, String)>> {
        let out = self.git(cwd, &["diff", "--cached", "--name-status"])?;
        Ok(out
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(2, '\t');
                let status = parts.next()?.trim().to_string();
                let path = parts.next()?.trim().to_string();
                if path.is_empty() {
                    None
                } else {
                    Some((path, status))
                }
            })
            .collect())
    }

    fn last_commit(&self, cwd: &Path) -> Result<CommitMeta> {
        let out = self.git(cwd, &["log", "-1", "--format=%H%x09%an"])?;
        let mut parts = out.splitn(2, '\t');
        Ok(CommitMeta {
            sha: parts.next().unwrap_or_default().to_string(),
            author: parts.next().unwrap_or_default().to_string(),
        })
    }
}

/// Canned responses for tests; no subprocesses involved.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGit {
    pub branch: String,
    pub staged: Vec<(String, String)>,
    pub commit: CommitMeta,
}

impl GitProvider for ScriptedGit {
    fn current_branch(&self, _cwd: &Path) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn staged_files(&self, _cwd: &Path) -> Result<Vec<(String, String)>> {
        Ok(self.staged.clone())
    }

    fn last_commit(&self, _cwd: &Path) -> Result<CommitMeta> {
        Ok(self.commit.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_git_returns_canned_values() {
        let git = ScriptedGit {
            branch: "feature/x".into(),
            staged: vec![("src/a.rs".into(), "M".into())],
            commit: CommitMeta {
                sha: "deadbeef".into(),
                author: "dev".into(),
            },
        };
        let cwd = Path::new("/anywhere");
        assert_eq!(git.current_branch(cwd).unwrap(), "feature/x");
        assert_eq!(git.staged_files(cwd).unwrap().len(), 1);
        assert_eq!(git.last_commit(cwd).unwrap().sha, "deadbeef");
    }

    #[test]
    fn test_cli_git_against_real_repository() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(path)
                .status()
                .unwrap();
            assert!(status.success(), "git {args:?} failed");
        };
        run(&["init", "-q", "-b", "main"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "Test"]);
        std::fs::write(path.join("a.txt"), "hello\n").unwrap();
        run(&["add", "a.txt"]);

        let git = CliGitProvider;
        assert_eq!(git.current_branch(path).unwrap(), "main");
        let staged = git.staged_files(path).unwrap();
        assert_eq!(staged, vec![("a.txt".to_string(), "A".to_string())]);

        run(&["commit", "-q", "-m", "initial"]);
        let meta = git.last_commit(path).unwrap();
        assert_eq!(meta.author, "Test");
        assert_eq!(meta.sha.len(), 40);
    }

    #[test]
    fn test_cli_git_outside_repository_errors() {
        let dir = tempfile::tempdir().unwrap();
        let git = CliGitProvider;
        assert!(git.current_branch(dir.path()).is_err());
    }
}
