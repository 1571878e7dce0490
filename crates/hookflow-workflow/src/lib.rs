//! Workflow documents: YAML model, loader, structural validation, and
//! on-disk discovery under `.github/hooks/`.
//!
//! Validation is collecting, not throwing: a broken file becomes a
//! [`validate::ValidationError`] the gate folds into its verdict, never a
//! hard failure of the invocation.

pub mod discover;
pub mod loader;
pub mod model;
pub mod validate;

pub use discover::{DiscoveredWorkflow, HOOKS_DIR, discover, hooks_dir};
pub use loader::{load_workflow, load_workflow_str, to_canonical_yaml};
pub use model::{
    CommitTrigger, Concurrency, FileTrigger, HooksTrigger, PushTrigger, Step, ToolTrigger,
    TriggerSet, Workflow,
};
pub use validate::{ValidationError, ValidationResult, validate_workflow_file,
    validate_workflows_in_dir};
