//! Host directories for gate artifacts.

use std::path::PathBuf;

/// Default directory for denial logs.
pub fn default_logs_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hookflow")
        .map(|dirs| dirs.data_dir().join("logs"))
}
