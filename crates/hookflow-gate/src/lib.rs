//! The gate coordinator: one invocation in, one verdict out.

pub mod coordinator;
pub mod paths;

pub use coordinator::{GateOptions, matching_workflows, run_gate};
pub use paths::default_logs_dir;
