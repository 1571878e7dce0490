//! Supervised subprocess execution with merged output capture.

use crate::cancel::CancelToken;
use crate::shell::{resolve_program, shell_command};
use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Grace between the terminate signal and the hard kill on cancellation.
const CANCEL_GRACE: Duration = Duration::from_millis(250);

/// Poll interval for `try_wait`.
const POLL: Duration = Duration::from_millis(50);

/// How the subprocess ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with this code.
    Exited(i32),
    /// Killed on deadline; carries the effective timeout in seconds.
    TimedOut(u64),
    /// Killed by the ambient cancellation signal.
    Cancelled,
}

#[derive(Debug)]
pub struct ProcessResult {
    /// Merged stdout+stderr, decoded as UTF-8 (lossy).
    pub output: String,
    pub termination: Termination,
}

/// What to run and under which constraints.
pub struct ScriptSpec<'a> {
    pub script: &'a str,
    pub shell: Option<&'a str>,
    pub cwd: &'a Path,
    pub envs: &'a [(String, String)],
    /// Effective deadline in whole seconds; `None` means unbounded.
    pub timeout_secs: Option<u64>,
}

/// Run a script to completion under a deadline and the ambient
/// cancellation signal. `Err` means the process could not be spawned;
/// everything after a successful spawn is reported via [`Termination`].
pub fn run_script(spec: &ScriptSpec<'_>, cancel: &CancelToken) -> Result<ProcessResult> {
    let (program, args) = shell_command(spec.shell, spec.script);

    let mut cmd = Command::new(resolve_program(&program));
    cmd.args(&args)
        .current_dir(spec.cwd)
        .stdin(Stdio::null())
        .envs(spec.envs.iter().map(|(k, v)| (k, v)));

    // New process group so the deadline kill reaches the whole tree, not
    // just the shell.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let (mut child, reader) = spawn_with_capture(cmd, &program)?;
    let termination = supervise(&mut child, spec.timeout_secs, cancel)?;
    let output = reader.collect();

    Ok(ProcessResult {
        output,
        termination,
    })
}

/// `try_wait` poll loop with deadline and cancellation handling.
fn supervise(
    child: &mut Child,
    timeout_secs: Option<u64>,
    cancel: &CancelToken,
) -> Result<Termination> {
    let start = Instant::now();
    let deadline = timeout_secs.map(Duration::from_secs);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Termination::Exited(status.code().unwrap_or(-1)));
        }

        if cancel.is_cancelled() {
            terminate_group(child);
            let grace_start = Instant::now();
            while grace_start.elapsed() < CANCEL_GRACE {
                if child.try_wait()?.is_some() {
                    return Ok(Termination::Cancelled);
                }
                std::thread::sleep(POLL);
            }
            kill_group(child);
            let _ = child.wait(); // Reap zombie
            return Ok(Termination::Cancelled);
        }

        if let Some(limit) = deadline {
            if start.elapsed() >= limit {
                kill_group(child);
                let _ = child.wait(); // Reap zombie
                return Ok(Termination::TimedOut(limit.as_secs()));
            }
        }

        std::thread::sleep(POLL);
    }
}

#[cfg(unix)]
fn terminate_group(child: &Child) {
    // SAFETY: kill() is async-signal-safe. Negative PID targets the whole
    // process group created by process_group(0).
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate_group(child: &Child) {
    // No process groups; the hard kill below is the only lever.
    let _ = child;
}

#[cfg(unix)]
fn kill_group(child: &mut Child) {
    // SAFETY: as above, SIGKILL to the process group.
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
}

// ---------------------------------------------------------------------------
// Output capture
// ---------------------------------------------------------------------------

/// Background collector for the child's output.
pub(crate) struct OutputReader {
    handle: std::thread::JoinHandle<Vec<u8>>,
    /// Second collector in the split-pipe fallback (stderr).
    secondary: Option<std::thread::JoinHandle<Vec<u8>>>,
}

impl OutputReader {
    fn collect(self) -> String {
        let mut bytes = self.handle.join().unwrap_or_default();
        if let Some(secondary) = self.secondary {
            bytes.extend(secondary.join().unwrap_or_default());
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn spawn_reader(mut source: impl std::io::Read + Send + 'static) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        buf
    })
}

/// One pipe, two write ends: stdout and stderr share it, so interleaving
/// preserves the child's write order. The `Command` is dropped right
/// after the spawn to close the parent copies of the write ends; the
/// reader then sees EOF exactly when the process group dies.
#[cfg(unix)]
fn spawn_with_capture(mut cmd: Command, program: &str) -> Result<(Child, OutputReader)> {
    use std::fs::File;
    use std::os::unix::io::FromRawFd;

    let mut fds = [0i32; 2];
    // SAFETY: pipe(2) fills two fresh descriptors on success.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error()).context("failed to create output pipe");
    }
    let [read_fd, write_fd] = fds;

    // SAFETY: dup(2) on the freshly created write end.
    let write_fd2 = unsafe { libc::dup(write_fd) };
    if write_fd2 < 0 {
        let err = std::io::Error::last_os_error();
        // SAFETY: closing the descriptors we just created.
        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
        }
        return Err(err).context("failed to dup output pipe");
    }

    // SAFETY: each fd is valid and ownership transfers exactly once.
    let reader = unsafe { File::from_raw_fd(read_fd) };
    let stdout = unsafe { Stdio::from_raw_fd(write_fd) };
    let stderr = unsafe { Stdio::from_raw_fd(write_fd2) };

    cmd.stdout(stdout).stderr(stderr);
    let child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn '{program}'"))?;
    drop(cmd);

    Ok((
        child,
        OutputReader {
            handle: spawn_reader(reader),
            secondary: None,
        },
    ))
}

/// Fallback capture: separate pipes, stdout then stderr concatenated.
/// Cross-stream ordering is not preserved on this path.
#[cfg(not(unix))]
fn spawn_with_capture(mut cmd: Command, program: &str) -> Result<(Child, OutputReader)> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn '{program}'"))?;
    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");
    Ok((
        child,
        OutputReader {
            handle: spawn_reader(stdout),
            secondary: Some(spawn_reader(stderr)),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<'a>(script: &'a str, timeout: Option<u64>, cwd: &'a Path) -> ScriptSpec<'a> {
        ScriptSpec {
            script,
            shell: Some("bash"),
            cwd,
            envs: &[],
            timeout_secs: timeout,
        }
    }

    #[test]
    fn test_exit_zero() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_script(&spec("exit 0", None, dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(result.termination, Termination::Exited(0));
    }

    #[test]
    fn test_nonzero_exit_code_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_script(&spec("exit 42", None, dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(result.termination, Termination::Exited(42));
    }

    #[test]
    fn test_output_merged_in_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let script = "echo one; echo two >&2; echo three";
        let result = run_script(&spec(script, None, dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(result.output, "one\ntwo\nthree\n");
    }

    #[test]
    fn test_timeout_kills_within_budget() {
        let dir = tempfile::tempdir().unwrap();
        let start = Instant::now();
        let result =
            run_script(&spec("sleep 10", Some(1), dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(result.termination, Termination::TimedOut(1));
        assert!(
            start.elapsed() < Duration::from_secs(3),
            "kill must not wait for the sleep"
        );
    }

    #[test]
    fn test_cancellation_yields_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let cancel_clone = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            cancel_clone.cancel();
        });
        let start = Instant::now();
        let result = run_script(&spec("sleep 10", None, dir.path()), &cancel).unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_env_passed_to_child() {
        let dir = tempfile::tempdir().unwrap();
        let envs = vec![("HOOKFLOW_TEST_VAR".to_string(), "marker-123".to_string())];
        let spec = ScriptSpec {
            script: "echo \"$HOOKFLOW_TEST_VAR\"",
            shell: Some("bash"),
            cwd: dir.path(),
            envs: &envs,
            timeout_secs: None,
        };
        let result = run_script(&spec, &CancelToken::new()).unwrap();
        assert_eq!(result.output.trim(), "marker-123");
    }

    #[test]
    fn test_cwd_respected() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_script(&spec("pwd", None, dir.path()), &CancelToken::new()).unwrap();
        let reported = std::path::PathBuf::from(result.output.trim());
        // Compare canonicalized; the tempdir may sit behind a symlink.
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_spawn_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ScriptSpec {
            script: "true",
            shell: Some("no-such-shell-9f2e"),
            cwd: dir.path(),
            envs: &[],
            timeout_secs: None,
        };
        let err = run_script(&spec, &CancelToken::new()).unwrap_err();
        assert!(err.to_string().contains("no-such-shell-9f2e"));
    }

    #[test]
    fn test_missing_cwd_is_spawn_error() {
        let result = run_script(
            &spec("true", None, Path::new("/nonexistent/dir/xyz")),
            &CancelToken::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_process_group_kill_reaches_children() {
        let dir = tempfile::tempdir().unwrap();
        // The shell spawns a grandchild; the group kill must take both
        // down or the pipe stays open and collect() would hang.
        let script = "sleep 30 & sleep 30";
        let start = Instant::now();
        let result = run_script(&spec(script, Some(1), dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(result.termination, Termination::TimedOut(1));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
