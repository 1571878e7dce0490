/// Expression evaluation failures.
///
/// Only syntax-level and call-level problems are errors. Missing data
/// (absent properties, out-of-range indexes, unset roots) evaluates to
/// `null` and never reaches this enum.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("lex error at offset {pos}: {message}")]
    Lex { pos: usize, message: String },

    #[error("parse error at offset {pos}: {message}")]
    Parse { pos: usize, message: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    WrongArity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("fromJSON: invalid JSON: {0}")]
    InvalidJson(String),

    #[error("unterminated '${{{{' marker in {0:?}")]
    UnterminatedMarker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unknown_function() {
        let err = ExprError::UnknownFunction("frobnicate".into());
        assert_eq!(err.to_string(), "unknown function 'frobnicate'");
    }

    #[test]
    fn test_display_wrong_arity() {
        let err = ExprError::WrongArity {
            name: "contains".into(),
            expected: "2",
            got: 1,
        };
        assert_eq!(
            err.to_string(),
            "function 'contains' expects 2 argument(s), got 1"
        );
    }

    #[test]
    fn test_display_unterminated_marker() {
        let err = ExprError::UnterminatedMarker("${{ event".into());
        assert!(err.to_string().contains("unterminated"));
        assert!(err.to_string().contains("${{ event"));
    }
}
