/// Invocation-level failures.
///
/// These abort the invocation with a non-zero exit and a stderr diagnostic;
/// no verdict is printed. Policy-level failures (invalid workflows, failing
/// steps) are never errors — they fold into the verdict instead.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Failed to parse event payload: {0}")]
    EventParse(String),

    #[error("Cannot read event input: {0}")]
    EventInput(String),

    #[error("Hooks directory walk failed at '{path}': {message}")]
    Discovery { path: String, message: String },
}
