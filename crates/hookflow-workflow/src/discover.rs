//! Enumerate workflow files under `<root>/.github/hooks/`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Repository-relative directory workflows live in.
pub const HOOKS_DIR: &str = ".github/hooks";

/// The hooks directory for a workspace root.
pub fn hooks_dir(root: &Path) -> PathBuf {
    root.join(".github").join("hooks")
}

/// A workflow file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredWorkflow {
    /// Absolute (or root-joined) path to the file.
    pub path: PathBuf,
    /// File stem without the YAML extension.
    pub base_name: String,
    /// Path relative to the workspace root.
    pub rel_path: PathBuf,
}

/// Case-insensitive `.yml`/`.yaml` extension check.
fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

/// Walk the hooks directory and return every YAML file, recursing into
/// subdirectories. A missing hooks directory yields an empty list; an
/// unreadable one is an invocation-level error.
///
/// Entries come back in walk order (sorted per directory). Callers must
/// not attach semantics to the ordering — verdict folding is associative.
pub fn discover(root: &Path) -> Result<Vec<DiscoveredWorkflow>> {
    let dir = hooks_dir(root);
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no hooks directory, nothing to discover");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    walk(&dir, root, &mut found)?;
    Ok(found)
}

fn walk(dir: &Path, root: &Path, found: &mut Vec<DiscoveredWorkflow>) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, root, found)?;
        } else if is_yaml(&path) {
            let base_name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
            let rel_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            found.push(DiscoveredWorkflow {
                path: path.clone(),
                base_name,
                rel_path,
            });
        }
    }
    Ok(())
}
