//! Glob matching and path normalization for trigger patterns.
//!
//! Patterns always see slash-separated paths; `normalize_path` converts a
//! raw (possibly absolute, possibly backslashed) path into the relative
//! form patterns are written against. The `**` segment is handled by an
//! explicit splitter rather than a regex translation, so its semantics
//! stay pinned to what trigger authors observe.

pub mod path;
pub mod pattern;

pub use path::normalize_path;
pub use pattern::{glob_match, match_list};
