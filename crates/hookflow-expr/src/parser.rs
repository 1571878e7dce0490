//! Precedence-climbing parser over the token stream.

use crate::ast::{BinOp, Expr};
use crate::error::ExprError;
use crate::token::{Token, TokenKind, lex};

/// Parse a complete expression; trailing tokens are an error.
pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = lex(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_binary(0)?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Binding power per binary operator; higher binds tighter.
fn binding_power(kind: &TokenKind) -> Option<(BinOp, u8)> {
    match kind {
        TokenKind::OrOr => Some((BinOp::Or, 1)),
        TokenKind::AndAnd => Some((BinOp::And, 2)),
        TokenKind::EqEq => Some((BinOp::Eq, 3)),
        TokenKind::NotEq => Some((BinOp::Ne, 3)),
        TokenKind::Lt => Some((BinOp::Lt, 4)),
        TokenKind::Le => Some((BinOp::Le, 4)),
        TokenKind::Gt => Some((BinOp::Gt, 4)),
        TokenKind::Ge => Some((BinOp::Ge, 4)),
        _ => None,
    }
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, message: impl Into<String>) -> ExprError {
        ExprError::Parse {
            pos: self.peek().pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ExprError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {what}")))
        }
    }

    fn expect_eof(&self) -> Result<(), ExprError> {
        if self.peek().kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.err("unexpected trailing input"))
        }
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;

        while let Some((op, bp)) = binding_power(&self.peek().kind) {
            if bp <= min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(bp)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek().kind == TokenKind::Bang {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    match self.advance().kind {
                        TokenKind::Ident(name) => {
                            expr = Expr::Property(Box::new(expr), name);
                        }
                        _ => return Err(self.err("expected property name after '.'")),
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let idx = self.parse_binary(0)?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    expr = Expr::Index(Box::new(expr), Box::new(idx));
                }
                TokenKind::LParen => {
                    // Calls only attach to a bare function name.
                    let Expr::Ident(name) = expr else {
                        return Err(self.err("only named functions can be called"));
                    };
                    self.advance();
                    let args = self.parse_args()?;
                    expr = Expr::Call(name, args);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_binary(0)?);
            match self.advance().kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(args),
                _ => return Err(self.err("expected ',' or ')' in argument list")),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Null => Ok(Expr::Null),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Float(f) => Ok(Expr::Float(f)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::Ident(name) => Ok(Expr::Ident(name)),
            TokenKind::LParen => {
                let inner = self.parse_binary(0)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(ExprError::Parse {
                pos: token.pos,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }
}
