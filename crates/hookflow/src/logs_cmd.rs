//! List recent denial logs.

use anyhow::Result;
use hookflow_gate::default_logs_dir;

pub fn handle_logs(limit: usize) -> Result<i32> {
    let Some(dir) = default_logs_dir() else {
        println!("No log directory available on this system.");
        return Ok(0);
    };
    if !dir.is_dir() {
        println!("No denial logs yet.");
        return Ok(0);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
        .collect();
    // File names start with a UTC timestamp, so name order is time order.
    entries.sort();
    entries.reverse();

    if entries.is_empty() {
        println!("No denial logs yet.");
        return Ok(0);
    }
    for path in entries.into_iter().take(limit) {
        println!("{}", path.display());
    }
    Ok(0)
}
