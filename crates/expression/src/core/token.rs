//! Token types for the expression lexer

use std::borrow::Cow;

use super::span::Span;

/// A token in the expression language with position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    /// The token kind
    pub kind: TokenKind<'a>,
    /// Source span for this token
    pub span: Span,
}

impl<'a> Token<'a> {
    /// Create a new token with span
    pub fn new(kind: TokenKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Float literal (e.g., 3.14)
    Float(f64),
    /// String literal; borrowed unless it contained escapes
    String(Cow<'a, str>),
    /// Boolean literal (true, false in any case)
    Boolean(bool),
    /// Null literal
    Null,

    /// Identifier, including a leading `@`, `$` or `#` when present
    Identifier(&'a str),

    // Arithmetic
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^`
    Caret,

    // Comparison
    /// `==`
    Equal,
    /// `!=` or `<>`
    NotEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,

    // Logical and string
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
    /// `&` (string concatenation)
    Ampersand,

    // Delimiters
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `,`
    Comma,

    /// End of input
    Eof,
}

impl TokenKind<'_> {
    /// Check if this token is a literal value
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Integer(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Boolean(_)
                | TokenKind::Null
        )
    }

    /// Precedence of a binary operator (higher binds tighter), 0 otherwise
    pub fn precedence(&self) -> u8 {
        match self {
            TokenKind::Or => 1,
            TokenKind::And => 2,
            TokenKind::LessThan
            | TokenKind::GreaterThan
            | TokenKind::LessEqual
            | TokenKind::GreaterEqual => 3,
            TokenKind::Ampersand => 4,
            TokenKind::Equal | TokenKind::NotEqual => 5,
            TokenKind::Plus | TokenKind::Minus => 6,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 7,
            TokenKind::Caret => 8,
            _ => 0,
        }
    }

    /// Check if this operator is right-associative
    pub fn is_right_associative(&self) -> bool {
        matches!(self, TokenKind::Caret)
    }

    /// Built-in function a binary operator desugars to
    pub fn function_name(&self) -> Option<&'static str> {
        let name = match self {
            TokenKind::Or => "or",
            TokenKind::And => "and",
            TokenKind::LessThan => "less",
            TokenKind::GreaterThan => "greater",
            TokenKind::LessEqual => "lessOrEquals",
            TokenKind::GreaterEqual => "greaterOrEquals",
            TokenKind::Ampersand => "concat",
            TokenKind::Equal => "equals",
            TokenKind::NotEqual => "notEquals",
            TokenKind::Plus => "add",
            TokenKind::Minus => "sub",
            TokenKind::Star => "mul",
            TokenKind::Slash => "div",
            TokenKind::Percent => "mod",
            TokenKind::Caret => "exp",
            _ => return None,
        };
        Some(name)
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "'{}'", s),
            TokenKind::Boolean(b) => write!(f, "{}", b),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::Equal => write!(f, "=="),
            TokenKind::NotEqual => write!(f, "!="),
            TokenKind::LessThan => write!(f, "<"),
            TokenKind::GreaterThan => write!(f, ">"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Ampersand => write!(f, "&"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(TokenKind::Or.precedence() < TokenKind::And.precedence());
        assert!(TokenKind::And.precedence() < TokenKind::LessThan.precedence());
        assert!(TokenKind::LessThan.precedence() < TokenKind::Ampersand.precedence());
        assert!(TokenKind::Ampersand.precedence() < TokenKind::Equal.precedence());
        assert!(TokenKind::Equal.precedence() < TokenKind::Plus.precedence());
        assert!(TokenKind::Plus.precedence() < TokenKind::Star.precedence());
        assert!(TokenKind::Star.precedence() < TokenKind::Caret.precedence());
        assert_eq!(TokenKind::Comma.precedence(), 0);
    }

    #[test]
    fn test_operator_function_names() {
        assert_eq!(TokenKind::NotEqual.function_name(), Some("notEquals"));
        assert_eq!(TokenKind::Ampersand.function_name(), Some("concat"));
        assert_eq!(TokenKind::Not.function_name(), None);
    }
}
