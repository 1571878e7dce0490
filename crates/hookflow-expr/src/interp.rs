//! String interpolation over `${{ … }}` markers.

use crate::context::EvalContext;
use crate::error::ExprError;
use crate::eval::eval;
use crate::parser::parse;
use crate::value::Value;

const OPEN: &str = "${{";
const CLOSE: &str = "}}";

/// Evaluate a bare expression source string.
pub fn evaluate_expression(src: &str, ctx: &EvalContext) -> Result<Value, ExprError> {
    eval(&parse(src)?, ctx)
}

/// Substitute every `${{ … }}` occurrence in `s` with the interpolated
/// form of its value; text outside markers is preserved verbatim.
/// Markers do not nest.
pub fn evaluate_string(s: &str, ctx: &EvalContext) -> Result<String, ExprError> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            return Err(ExprError::UnterminatedMarker(s.to_string()));
        };
        let inner = &after_open[..end];
        let value = evaluate_expression(inner.trim(), ctx)?;
        out.push_str(&value.to_display_string());
        rest = &after_open[end + CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Evaluate a condition string to a boolean.
///
/// Accepts either a bare expression (`contains(a, b)`) or a single
/// `${{ … }}` wrapper around one; the wrapper form is what YAML authors
/// habitually write.
pub fn evaluate_bool(s: &str, ctx: &EvalContext) -> Result<bool, ExprError> {
    let trimmed = s.trim();
    let src = match single_marker_inner(trimmed) {
        Some(inner) => inner.trim(),
        None => trimmed,
    };
    Ok(evaluate_expression(src, ctx)?.is_truthy())
}

/// Returns the inner expression when the whole string is exactly one
/// `${{ … }}` marker.
fn single_marker_inner(s: &str) -> Option<&str> {
    let body = s.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    // A second opener means this is interpolation, not a wrapper.
    if body.contains(OPEN) || body.contains(CLOSE) {
        return None;
    }
    Some(body)
}
