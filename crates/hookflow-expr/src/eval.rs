//! Tree-walking interpreter and the builtin function table.

use crate::ast::{BinOp, Expr};
use crate::context::EvalContext;
use crate::error::ExprError;
use crate::value::Value;
use hookflow_core::StepOutcome;

/// Evaluate a parsed expression against a context.
pub fn eval(expr: &Expr, ctx: &EvalContext) -> Result<Value, ExprError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Ident(name) => Ok(ctx.root(name)),
        Expr::Property(base, name) => Ok(eval(base, ctx)?.get(name)),
        Expr::Index(base, idx) => {
            let base = eval(base, ctx)?;
            let idx = eval(idx, ctx)?;
            Ok(base.index(&idx))
        }
        Expr::Not(operand) => Ok(Value::Bool(!eval(operand, ctx)?.is_truthy())),
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, ctx),
        Expr::Call(name, args) => call_builtin(name, args, ctx),
    }
}

fn eval_binary(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    ctx: &EvalContext,
) -> Result<Value, ExprError> {
    // Short-circuit the logical operators before touching the rhs.
    match op {
        BinOp::Or => {
            let l = eval(lhs, ctx)?;
            if l.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let r = eval(rhs, ctx)?;
            return Ok(Value::Bool(r.is_truthy()));
        }
        BinOp::And => {
            let l = eval(lhs, ctx)?;
            if !l.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let r = eval(rhs, ctx)?;
            return Ok(Value::Bool(r.is_truthy()));
        }
        _ => {}
    }

    let l = eval(lhs, ctx)?;
    let r = eval(rhs, ctx)?;
    let result = match op {
        BinOp::Eq => l.loose_eq(&r),
        BinOp::Ne => !l.loose_eq(&r),
        BinOp::Lt => l.as_number() < r.as_number(),
        BinOp::Le => l.as_number() <= r.as_number(),
        BinOp::Gt => l.as_number() > r.as_number(),
        BinOp::Ge => l.as_number() >= r.as_number(),
        BinOp::Or | BinOp::And => unreachable!("handled above"),
    };
    Ok(Value::Bool(result))
}

// ---------------------------------------------------------------------------
// Builtins
// ---------------------------------------------------------------------------

fn arity(
    name: &str,
    args: &[Value],
    expected: &'static str,
    ok: bool,
) -> Result<(), ExprError> {
    if ok {
        Ok(())
    } else {
        Err(ExprError::WrongArity {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

/// Dispatch a call. The function set is closed so that workflow validation
/// can catch typos; anything unknown is an error, not `null`.
fn call_builtin(name: &str, arg_exprs: &[Expr], ctx: &EvalContext) -> Result<Value, ExprError> {
    let mut args = Vec::with_capacity(arg_exprs.len());
    for a in arg_exprs {
        args.push(eval(a, ctx)?);
    }

    match name {
        "contains" => {
            arity(name, &args, "2", args.len() == 2)?;
            Ok(Value::Bool(builtin_contains(&args[0], &args[1])))
        }
        "startsWith" => {
            arity(name, &args, "2", args.len() == 2)?;
            let s = args[0].to_display_string().to_ascii_lowercase();
            let p = args[1].to_display_string().to_ascii_lowercase();
            Ok(Value::Bool(s.starts_with(&p)))
        }
        "endsWith" => {
            arity(name, &args, "2", args.len() == 2)?;
            let s = args[0].to_display_string().to_ascii_lowercase();
            let p = args[1].to_display_string().to_ascii_lowercase();
            Ok(Value::Bool(s.ends_with(&p)))
        }
        "format" => {
            arity(name, &args, "at least 1", !args.is_empty())?;
            Ok(Value::String(builtin_format(
                &args[0].to_display_string(),
                &args[1..],
            )))
        }
        "join" => {
            arity(name, &args, "1 or 2", args.len() == 1 || args.len() == 2)?;
            let sep = args
                .get(1)
                .map(|v| v.to_display_string())
                .unwrap_or_else(|| ",".to_string());
            let joined = match &args[0] {
                Value::List(items) => items
                    .iter()
                    .map(|v| v.to_display_string())
                    .collect::<Vec<_>>()
                    .join(&sep),
                other => other.to_display_string(),
            };
            Ok(Value::String(joined))
        }
        "toJSON" => {
            arity(name, &args, "1", args.len() == 1)?;
            let json = serde_json::to_string(&args[0].to_json())
                .map_err(|e| ExprError::InvalidJson(e.to_string()))?;
            Ok(Value::String(json))
        }
        "fromJSON" => {
            arity(name, &args, "1", args.len() == 1)?;
            let text = args[0].to_display_string();
            let parsed: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| ExprError::InvalidJson(e.to_string()))?;
            Ok(Value::from_json(&parsed))
        }
        "always" => {
            arity(name, &args, "0", args.is_empty())?;
            Ok(Value::Bool(true))
        }
        "success" => {
            arity(name, &args, "0", args.is_empty())?;
            let ok = !ctx
                .prior_outcomes
                .iter()
                .any(|o| matches!(o, StepOutcome::Failure | StepOutcome::Cancelled));
            Ok(Value::Bool(ok))
        }
        "failure" => {
            arity(name, &args, "0", args.is_empty())?;
            let any = ctx
                .prior_outcomes
                .iter()
                .any(|o| *o == StepOutcome::Failure);
            Ok(Value::Bool(any))
        }
        "cancelled" => {
            arity(name, &args, "0", args.is_empty())?;
            let any = ctx
                .prior_outcomes
                .iter()
                .any(|o| *o == StepOutcome::Cancelled);
            Ok(Value::Bool(any))
        }
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}

/// `contains` over strings is a case-insensitive substring test; over
/// lists it is element equality.
fn builtin_contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => {
            let n = needle.to_display_string();
            s.to_ascii_lowercase().contains(&n.to_ascii_lowercase())
        }
        Value::List(items) => items.iter().any(|item| item.loose_eq(needle)),
        _ => false,
    }
}

/// Replace `{i}` placeholders. Unknown indexes and stray braces pass
/// through unchanged; replacement is single-pass so argument values are
/// never re-scanned.
fn builtin_format(fmt: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(fmt.len());
    let bytes = fmt.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > i + 1 && j < bytes.len() && bytes[j] == b'}' {
                let idx: usize = fmt[i + 1..j].parse().unwrap_or(usize::MAX);
                if let Some(arg) = args.get(idx) {
                    out.push_str(&arg.to_display_string());
                    i = j + 1;
                    continue;
                }
            }
        }
        let Some(ch) = fmt[i..].chars().next() else {
            break;
        };
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
