//! Shared types for the hookflow gate.
//!
//! Everything that crosses crate boundaries lives here: the gate verdict
//! printed to stdout, step/workflow outcomes, hook lifecycles, and the
//! invocation-level error enum.

pub mod error;
pub mod types;

pub use error::AppError;
pub use types::{Decision, FileAction, Lifecycle, StepOutcome, Verdict};
