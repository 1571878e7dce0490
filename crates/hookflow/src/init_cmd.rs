//! Scaffold a starter workflow.

use anyhow::{Context, Result, bail};
use hookflow_workflow::hooks_dir;
use std::path::PathBuf;

const SAMPLE_NAME: &str = "protect-secrets.yml";

const SAMPLE: &str = r#"name: protect-secrets
description: Block edits to env files and other secret material
on:
  file:
    types: [edit, create]
    paths:
      - '**/.env'
      - '**/*.pem'
      - '**/id_rsa'
steps:
  - name: refuse
    run: |
      echo "Refusing to touch secret material." >&2
      exit 1
"#;

pub fn handle_init(dir: Option<PathBuf>) -> Result<i32> {
    let root = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let hooks = hooks_dir(&root);
    std::fs::create_dir_all(&hooks)
        .with_context(|| format!("failed to create {}", hooks.display()))?;

    let target = hooks.join(SAMPLE_NAME);
    if target.exists() {
        bail!("{} already exists; not overwriting", target.display());
    }
    std::fs::write(&target, SAMPLE)
        .with_context(|| format!("failed to write {}", target.display()))?;

    println!("Created {}", target.display());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_valid_sample() {
        let dir = tempfile::tempdir().unwrap();
        let code = handle_init(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(code, 0);

        let target = hooks_dir(dir.path()).join(SAMPLE_NAME);
        assert!(target.is_file());

        // The scaffold must pass our own validation.
        let result = hookflow_workflow::validate_workflow_file(&target);
        assert!(result.is_valid(), "sample invalid: {:?}", result.errors);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        handle_init(Some(dir.path().to_path_buf())).unwrap();
        let err = handle_init(Some(dir.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("not overwriting"));
    }
}
