//! Parser for converting tokens into an AST
//!
//! Recursive descent with precedence climbing for binary operators. Every
//! operator is rewritten into a call of the built-in it stands for, and
//! function names are resolved against the registry here, so an unknown
//! function fails at parse time.

use std::sync::Arc;

use serde_json::Value;

use crate::builtins::BuiltinRegistry;
use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::core::token::{Token, TokenKind};

static EOF: TokenKind<'static> = TokenKind::Eof;

/// Default bound on parser nesting (operands, operators and brackets)
pub const DEFAULT_MAX_PARSE_DEPTH: usize = 256;

/// Parser for converting tokens into an AST
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    registry: &'a BuiltinRegistry,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser from a list of tokens
    pub fn new(tokens: Vec<Token<'a>>, registry: &'a BuiltinRegistry) -> Self {
        Self {
            tokens,
            position: 0,
            registry,
            depth: 0,
            max_depth: DEFAULT_MAX_PARSE_DEPTH,
        }
    }

    /// Set how deeply expressions may nest before parsing fails
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the tokens into an expression AST
    ///
    /// Empty input yields the empty string literal.
    pub fn parse(&mut self) -> ExpressionResult<Expr> {
        if self.current_kind() == &TokenKind::Eof {
            return Ok(Expr::Literal(Value::String(String::new())));
        }

        let expr = self.parse_binary_expression(1)?;

        if self.current_kind() != &TokenKind::Eof {
            return Err(ExpressionError::parse_error(
                format!("Unexpected token {}", self.current_kind()),
                self.current_offset(),
            ));
        }

        Ok(expr)
    }

    /// Step one level deeper, failing once the nesting bound is reached
    fn descend(&mut self) -> ExpressionResult<()> {
        if self.depth >= self.max_depth {
            return Err(ExpressionError::parse_error(
                format!("Expression nested too deeply (max {})", self.max_depth),
                self.current_offset(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> ExpressionResult<Expr> {
        self.descend()?;
        let result = self.parse_binary_operands(min_precedence);
        self.depth -= 1;
        result
    }

    /// Parse binary expression with precedence climbing
    fn parse_binary_operands(&mut self, min_precedence: u8) -> ExpressionResult<Expr> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let op = self.current_kind();
            let precedence = op.precedence();
            if precedence == 0 || precedence < min_precedence {
                break;
            }

            let right_associative = op.is_right_associative();
            let name = op.function_name();
            let offset = self.current_offset();
            self.advance();

            let next_min_precedence = if right_associative {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary_expression(next_min_precedence)?;

            let Some(name) = name else {
                return Err(ExpressionError::parse_error("Unexpected operator", offset));
            };
            left = self.call(name, vec![left, right], offset)?;
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> ExpressionResult<Expr> {
        self.descend()?;
        let result = self.parse_unary_operand();
        self.depth -= 1;
        result
    }

    /// Parse unary expression
    fn parse_unary_operand(&mut self) -> ExpressionResult<Expr> {
        let offset = self.current_offset();
        match self.current_kind() {
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary_expression()?;
                self.call("not", vec![operand], offset)
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary_expression()?;
                match operand {
                    Expr::Literal(Value::Number(n)) => Ok(Expr::Literal(negate(&n))),
                    operand => {
                        self.call("sub", vec![Expr::Literal(Value::from(0)), operand], offset)
                    }
                }
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary_expression()
            }
            _ => self.parse_postfix_expression(),
        }
    }

    /// Parse postfix expression (property access, index access)
    fn parse_postfix_expression(&mut self) -> ExpressionResult<Expr> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let TokenKind::Identifier(name) = self.current_kind() else {
                        return Err(ExpressionError::parse_error(
                            "Expected property name after '.'",
                            self.current_offset(),
                        ));
                    };
                    let property: Arc<str> = Arc::from(*name);
                    self.advance();

                    expr = Expr::PropertyAccess {
                        object: Box::new(expr),
                        property,
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_binary_expression(1)?;
                    self.expect_token(&TokenKind::RightBracket)?;

                    expr = Expr::IndexAccess {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse primary expression (literals, identifiers, calls, parentheses)
    fn parse_primary_expression(&mut self) -> ExpressionResult<Expr> {
        let offset = self.current_offset();
        let expr = match self.current_kind() {
            TokenKind::Integer(n) => Expr::Literal(Value::from(*n)),
            TokenKind::Float(n) => Expr::Literal(float_value(*n)),
            TokenKind::String(s) => Expr::Literal(Value::String(s.to_string())),
            TokenKind::Boolean(b) => Expr::Literal(Value::Bool(*b)),
            TokenKind::Null => Expr::Literal(Value::Null),

            TokenKind::Identifier(name) => {
                let name = *name;
                self.advance();
                if self.current_kind() == &TokenKind::LeftParen {
                    let args = self.parse_function_args()?;
                    return self.call(name, args, offset);
                }
                return Ok(Expr::Identifier(Arc::from(name)));
            }

            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_binary_expression(1)?;
                self.expect_token(&TokenKind::RightParen)?;
                return Ok(expr);
            }

            token => {
                return Err(ExpressionError::parse_error(
                    format!("Unexpected token {}", token),
                    offset,
                ));
            }
        };

        self.advance();
        Ok(expr)
    }

    /// Parse a parenthesized, comma separated argument list
    fn parse_function_args(&mut self) -> ExpressionResult<Vec<Expr>> {
        self.expect_token(&TokenKind::LeftParen)?;
        let mut args = Vec::new();

        if self.current_kind() != &TokenKind::RightParen {
            loop {
                args.push(self.parse_binary_expression(1)?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_token(&TokenKind::RightParen)?;
        Ok(args)
    }

    /// Build a call node for a registered function
    fn call(&self, name: &str, args: Vec<Expr>, offset: usize) -> ExpressionResult<Expr> {
        let function = self.registry.get(name).ok_or_else(|| {
            ExpressionError::parse_error(format!("{} does not have an evaluator", name), offset)
        })?;
        Ok(Expr::FunctionCall { function, args })
    }

    /// Get the current token kind
    fn current_kind(&self) -> &TokenKind<'a> {
        self.tokens
            .get(self.position)
            .map(|token| &token.kind)
            .unwrap_or(&EOF)
    }

    /// Byte offset of the current token
    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|token| token.span.offset())
            .unwrap_or(0)
    }

    /// Advance to the next token
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Match a specific token and advance if it matches
    fn match_token(&mut self, expected: &TokenKind<'_>) -> bool {
        if self.current_kind() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance, or return an error
    fn expect_token(&mut self, expected: &TokenKind<'_>) -> ExpressionResult<()> {
        if self.match_token(expected) {
            Ok(())
        } else {
            Err(ExpressionError::parse_error(
                format!("Expected '{}', found {}", expected, self.current_kind()),
                self.current_offset(),
            ))
        }
    }
}

fn float_value(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn negate(n: &serde_json::Number) -> Value {
    match n.as_i64() {
        Some(i) => i
            .checked_neg()
            .map(Value::from)
            .unwrap_or_else(|| float_value(-(i as f64))),
        None => float_value(-n.as_f64().unwrap_or(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use serde_json::json;

    fn parse(input: &str) -> ExpressionResult<Expr> {
        let registry = BuiltinRegistry::new();
        let tokens = Lexer::new(input).tokenize()?;
        Parser::new(tokens, &registry).parse()
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse("42").unwrap(), Expr::Literal(json!(42)));
        assert_eq!(parse("1.5").unwrap(), Expr::Literal(json!(1.5)));
        assert_eq!(parse("-3").unwrap(), Expr::Literal(json!(-3)));
    }

    #[test]
    fn test_empty_input_is_empty_string() {
        assert_eq!(parse("").unwrap(), Expr::Literal(json!("")));
        assert_eq!(parse("   ").unwrap(), Expr::Literal(json!("")));
    }

    #[test]
    fn test_operators_become_calls() {
        assert_eq!(parse("1 + 2 * 3").unwrap().to_string(), "add(1, mul(2, 3))");
        assert_eq!(parse("a <> b").unwrap().to_string(), "notEquals(a, b)");
        assert_eq!(parse("!a").unwrap().to_string(), "not(a)");
        assert_eq!(parse("-a").unwrap().to_string(), "sub(0, a)");
        assert_eq!(parse("+a").unwrap().to_string(), "a");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("a || b && c").unwrap().to_string(),
            "or(a, and(b, c))"
        );
        assert_eq!(
            parse("1 + 2 == 3").unwrap().to_string(),
            "equals(add(1, 2), 3)"
        );
        assert_eq!(
            parse("'a' & 'b' == 'ab'").unwrap().to_string(),
            "concat('a', equals('b', 'ab'))"
        );
        assert_eq!(
            parse("x < 1 & 'z'").unwrap().to_string(),
            "less(x, concat(1, 'z'))"
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(parse("2^3^2").unwrap().to_string(), "exp(2, exp(3, 2))");
        assert_eq!(parse("8 - 4 - 2").unwrap().to_string(), "sub(sub(8, 4), 2)");
    }

    #[test]
    fn test_accessor_chain() {
        let expr = parse("a.b[c].d").unwrap();
        assert_eq!(expr.to_string(), "a.b[c].d");
        assert!(matches!(expr, Expr::PropertyAccess { .. }));
    }

    #[test]
    fn test_unknown_function_is_parse_error() {
        let err = parse("1 + frobnicate(2)").unwrap_err();
        assert!(matches!(err, ExpressionError::ParseError { position: 4, .. }));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let err = parse("add(1, 2").unwrap_err();
        assert!(err.is_parse_error());
        let err = parse("(1 + 2))").unwrap_err();
        assert_eq!(err.position(), Some(7));
    }

    #[test]
    fn test_property_requires_name() {
        let err = parse("a.").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        let err = parse(&deep).unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("nested too deeply"));

        assert!(parse(&"!".repeat(5000)).unwrap_err().is_parse_error());
        assert!(parse(&vec!["2"; 5000].join("^")).unwrap_err().is_parse_error());

        let nested = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&nested).unwrap(), Expr::Literal(json!(1)));
    }

    #[test]
    fn test_custom_depth_limit() {
        let registry = BuiltinRegistry::new();
        let parse_with = |input: &str, depth: usize| {
            let tokens = Lexer::new(input).tokenize().unwrap();
            Parser::new(tokens, &registry).with_max_depth(depth).parse()
        };
        assert!(parse_with("add(1, 2)", 4).is_ok());
        assert!(parse_with("add(1, add(2, add(3, 4)))", 4).is_err());
    }
}
