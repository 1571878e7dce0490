//! Shell selection and dispatch.

/// The platform default when a step declares no shell.
pub fn default_shell() -> &'static str {
    if cfg!(windows) { "pwsh" } else { "bash" }
}

/// Program + argument vector for running `script` under `shell`.
///
/// Unrecognized shell identifiers are invoked as a program with `-c`,
/// a best-effort fallback for hosts with exotic interpreters.
pub fn shell_command(shell: Option<&str>, script: &str) -> (String, Vec<String>) {
    let shell = shell.unwrap_or(default_shell());
    match shell {
        "bash" | "sh" => (shell.to_string(), vec!["-c".into(), script.into()]),
        "pwsh" | "powershell" => (
            shell.to_string(),
            vec!["-NoProfile".into(), "-Command".into(), script.into()],
        ),
        "cmd" => (shell.to_string(), vec!["/C".into(), script.into()]),
        other => (other.to_string(), vec!["-c".into(), script.into()]),
    }
}

/// Resolve a program name to an absolute path when it is on PATH; the
/// bare name is kept otherwise so the spawn error names it.
pub fn resolve_program(name: &str) -> String {
    which::which(name)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| name.to_string())
}
