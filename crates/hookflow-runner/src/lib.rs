//! Step and workflow execution.
//!
//! One step = one supervised subprocess: expressions rendered, shell
//! resolved, stdout/stderr merged into a single ordered stream, a
//! deadline derived from the step timeout and the ambient one, and the
//! whole process group killed on expiry. The workflow runner sequences
//! steps, threads the `steps` context between them, and folds the results
//! into a blocking verdict.

pub mod action;
pub mod cancel;
pub mod concurrency;
pub mod logfile;
pub mod process;
pub mod shell;
pub mod step;
pub mod workflow;

pub use cancel::CancelToken;
pub use concurrency::{ConcurrencyGroups, GroupGuard};
pub use step::StepResult;
pub use workflow::{RunOptions, run, run_with_blocking};
