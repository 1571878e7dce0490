//! The `${{ … }}` expression language.
//!
//! A small, closed, side-effect-free language evaluated against the
//! current event: hand-written lexer, Pratt parser, and a tree-walking
//! interpreter over a dynamically-typed [`Value`]. Conditions in step
//! `if:` fields, env values, and `run:` scripts all pass through here.
//!
//! The error policy is deliberately asymmetric: syntax errors and unknown
//! functions fail the evaluation, but *missing data* never does — a
//! property chain that walks off the populated part of the event yields
//! `null`, so authors write `contains(event.tool.args.new_str, '…')`
//! without guarding for absent context.

pub mod ast;
pub mod context;
pub mod error;
pub mod eval;
pub mod interp;
pub mod parser;
pub mod token;
pub mod value;

pub use context::EvalContext;
pub use error::ExprError;
pub use interp::{evaluate_bool, evaluate_expression, evaluate_string};
pub use value::Value;
