//! The gate entry point: read event, evaluate, emit the verdict.

use anyhow::{Context, Result};
use hookflow_event::CliGitProvider;
use hookflow_gate::{GateOptions, default_logs_dir, run_gate};
use std::io::Read;
use std::path::PathBuf;

/// Turn the `--event` flag into raw bytes; `-` or an omitted flag reads
/// stdin.
pub fn read_event_bytes(event: Option<String>) -> Result<Vec<u8>> {
    match event.as_deref() {
        Some("-") | None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read event from stdin")?;
            Ok(buf)
        }
        Some(json) => Ok(json.as_bytes().to_vec()),
    }
}

pub fn handle_run(
    event: Option<String>,
    event_type: Option<String>,
    dir: Option<PathBuf>,
) -> Result<i32> {
    let opts = GateOptions {
        event_bytes: read_event_bytes(event)?,
        event_type,
        dir,
        logs_dir: default_logs_dir(),
    };

    let verdict = run_gate(&opts, &CliGitProvider)?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    // The verdict itself is the answer; allow and deny both exit 0.
    Ok(0)
}
