//! Hand-written lexer for the expression language.

use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    True,
    False,
    Null,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Bang,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset into the source, for diagnostics.
    pub pos: usize,
}

/// Tokenize an expression source string.
pub fn lex(src: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let pos = i;

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '.' => {
                tokens.push(Token { kind: TokenKind::Dot, pos });
                i += 1;
            }
            '[' => {
                tokens.push(Token { kind: TokenKind::LBracket, pos });
                i += 1;
            }
            ']' => {
                tokens.push(Token { kind: TokenKind::RBracket, pos });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, pos });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, pos });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, pos });
                i += 1;
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::NotEq, pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Bang, pos });
                    i += 1;
                }
            }
            '&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Token { kind: TokenKind::AndAnd, pos });
                    i += 2;
                } else {
                    return Err(ExprError::Lex {
                        pos,
                        message: "expected '&&'".into(),
                    });
                }
            }
            '|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Token { kind: TokenKind::OrOr, pos });
                    i += 2;
                } else {
                    return Err(ExprError::Lex {
                        pos,
                        message: "expected '||'".into(),
                    });
                }
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::EqEq, pos });
                    i += 2;
                } else {
                    return Err(ExprError::Lex {
                        pos,
                        message: "expected '==' (assignment is not supported)".into(),
                    });
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Le, pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Lt, pos });
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Ge, pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Gt, pos });
                    i += 1;
                }
            }
            '\'' => {
                let (s, next) = lex_string(src, i)?;
                tokens.push(Token { kind: TokenKind::Str(s), pos });
                i = next;
            }
            '0'..='9' => {
                let (kind, next) = lex_number(src, i)?;
                tokens.push(Token { kind, pos });
                i = next;
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let (kind, next) = lex_ident(src, i);
                tokens.push(Token { kind, pos });
                i = next;
            }
            _ => {
                return Err(ExprError::Lex {
                    pos,
                    message: format!("unexpected character '{c}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        pos: bytes.len(),
    });
    Ok(tokens)
}

/// Single-quoted string with `''` as the escape for a literal quote.
fn lex_string(src: &str, start: usize) -> Result<(String, usize), ExprError> {
    let bytes = src.as_bytes();
    let mut out = String::new();
    let mut i = start + 1; // past opening quote

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                out.push('\'');
                i += 2;
            } else {
                return Ok((out, i + 1));
            }
        } else {
            // Copy the whole UTF-8 character, not just one byte.
            let Some(ch) = src[i..].chars().next() else {
                break;
            };
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    Err(ExprError::Lex {
        pos: start,
        message: "unterminated string literal".into(),
    })
}

/// Integer or float, with an optional exponent.
fn lex_number(src: &str, start: usize) -> Result<(TokenKind, usize), ExprError> {
    let bytes = src.as_bytes();
    let mut i = start;
    let mut is_float = false;

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        is_float = true;
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text = &src[start..i];
    let kind = if is_float {
        TokenKind::Float(text.parse().map_err(|_| ExprError::Lex {
            pos: start,
            message: format!("invalid number '{text}'"),
        })?)
    } else {
        TokenKind::Int(text.parse().map_err(|_| ExprError::Lex {
            pos: start,
            message: format!("invalid number '{text}'"),
        })?)
    };
    Ok((kind, i))
}

/// Identifier or keyword. Dashes are allowed mid-identifier because the
/// language has no subtraction operator and step/arg names use them.
fn lex_ident(src: &str, start: usize) -> (TokenKind, usize) {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            i += 1;
        } else {
            break;
        }
    }
    let text = &src[start..i];
    let kind = match text {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => TokenKind::Ident(text.to_string()),
    };
    (kind, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_operators() {
        assert_eq!(
            kinds("a == b && c || !d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::EqEq,
                TokenKind::Ident("b".into()),
                TokenKind::AndAnd,
                TokenKind::Ident("c".into()),
                TokenKind::OrOr,
                TokenKind::Bang,
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_comparisons() {
        assert_eq!(
            kinds("1 < 2 <= 3 > 4 >= 5 != 6"),
            vec![
                TokenKind::Int(1),
                TokenKind::Lt,
                TokenKind::Int(2),
                TokenKind::Le,
                TokenKind::Int(3),
                TokenKind::Gt,
                TokenKind::Int(4),
                TokenKind::Ge,
                TokenKind::Int(5),
                TokenKind::NotEq,
                TokenKind::Int(6),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_string_with_escape() {
        assert_eq!(
            kinds("'it''s'"),
            vec![TokenKind::Str("it's".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_lex_unterminated_string() {
        assert!(matches!(lex("'abc"), Err(ExprError::Lex { .. })));
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Int(42), TokenKind::Eof]);
        assert_eq!(kinds("3.25"), vec![TokenKind::Float(3.25), TokenKind::Eof]);
        assert_eq!(kinds("1e3"), vec![TokenKind::Float(1000.0), TokenKind::Eof]);
        assert_eq!(
            kinds("2.5e-1"),
            vec![TokenKind::Float(0.25), TokenKind::Eof]
        );
    }

    #[test]
    fn test_lex_keywords() {
        assert_eq!(
            kinds("true false null"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_lex_property_chain() {
        assert_eq!(
            kinds("event.tool.args['new_str']"),
            vec![
                TokenKind::Ident("event".into()),
                TokenKind::Dot,
                TokenKind::Ident("tool".into()),
                TokenKind::Dot,
                TokenKind::Ident("args".into()),
                TokenKind::LBracket,
                TokenKind::Str("new_str".into()),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_dashed_identifier() {
        assert_eq!(
            kinds("continue-on-error"),
            vec![TokenKind::Ident("continue-on-error".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_lex_single_amp_rejected() {
        assert!(matches!(lex("a & b"), Err(ExprError::Lex { .. })));
        assert!(matches!(lex("a | b"), Err(ExprError::Lex { .. })));
        assert!(matches!(lex("a = b"), Err(ExprError::Lex { .. })));
    }

    #[test]
    fn test_lex_unexpected_character() {
        assert!(matches!(lex("a # b"), Err(ExprError::Lex { .. })));
    }
}
