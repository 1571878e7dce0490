//! Local action resolution for `uses:` steps.
//!
//! An action reference is a `./path` directory under the runner root
//! containing `action.yml` or `action.yaml`. Supported `runs.using`
//! kinds: `shell` (a single script) and `composite` (inline substeps).

use anyhow::{Context, Result, bail};
use hookflow_workflow::Step;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ActionMetadata {
    #[serde(default)]
    pub name: Option<String>,
    pub runs: ActionRuns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRuns {
    pub using: String,
    #[serde(default)]
    pub run: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Resolve a `uses:` reference to an action directory. Only local
/// references are supported.
pub fn resolve_action_dir(root: &Path, reference: &str) -> Result<std::path::PathBuf> {
    let Some(rel) = reference.strip_prefix("./") else {
        bail!("unsupported action reference '{reference}': only local './path' actions are supported");
    };
    Ok(root.join(rel))
}

/// Load `action.yml` / `action.yaml` from an action directory.
pub fn load_action(dir: &Path) -> Result<ActionMetadata> {
    let candidates = [dir.join("action.yml"), dir.join("action.yaml")];
    let path = candidates
        .iter()
        .find(|p| p.is_file())
        .with_context(|| format!("no action metadata found in {}", dir.display()))?;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let metadata: ActionMetadata = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(metadata)
}

/// Synthesize the `INPUT_*` environment for an action's `with:` block.
/// Keys are uppercased with spaces and dashes folded to underscores.
pub fn input_env_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 6);
    key.push_str("INPUT_");
    for c in name.chars() {
        if c == ' ' || c == '-' {
            key.push('_');
        } else {
            key.push(c.to_ascii_uppercase());
        }
    }
    key
}
