//! Lexer for tokenizing expression strings

use std::borrow::Cow;

use crate::core::error::{ExpressionError, ExpressionResult};
use crate::core::span::Span;
use crate::core::token::{Token, TokenKind};

/// Lexer for tokenizing expression strings
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from an input string
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenize the entire input string
    pub fn tokenize(&mut self) -> ExpressionResult<Vec<Token<'a>>> {
        // Estimate: typical expressions have ~1 token per 5 chars
        let estimated_tokens = (self.input.len() / 5).max(8);
        let mut tokens = Vec::with_capacity(estimated_tokens);

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> ExpressionResult<Token<'a>> {
        self.skip_whitespace();

        let start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok(Token::new(
                TokenKind::Eof,
                Span::new(self.position, self.position),
            ));
        };

        let kind = match ch {
            // Delimiters
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),

            // Arithmetic
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '%' => self.single(TokenKind::Percent),
            '^' => self.single(TokenKind::Caret),

            // Comparison
            '=' if self.peek() == Some('=') => self.double(TokenKind::Equal),
            '!' if self.peek() == Some('=') => self.double(TokenKind::NotEqual),
            '<' if self.peek() == Some('>') => self.double(TokenKind::NotEqual),
            '<' if self.peek() == Some('=') => self.double(TokenKind::LessEqual),
            '>' if self.peek() == Some('=') => self.double(TokenKind::GreaterEqual),
            '<' => self.single(TokenKind::LessThan),
            '>' => self.single(TokenKind::GreaterThan),

            // Logical
            '&' if self.peek() == Some('&') => self.double(TokenKind::And),
            '|' if self.peek() == Some('|') => self.double(TokenKind::Or),
            '!' => self.single(TokenKind::Not),
            '&' => self.single(TokenKind::Ampersand),

            '"' | '\'' => self.read_string(ch)?,

            ch if ch.is_ascii_digit() => self.read_number()?,

            ch if is_identifier_start(ch) => self.read_identifier_or_keyword()?,

            _ => {
                return Err(ExpressionError::syntax_error(
                    format!("Unexpected character '{}'", ch),
                    start,
                ));
            }
        };

        Ok(Token::new(kind, Span::new(start, self.position)))
    }

    /// Get the current character at position
    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        let current = self.current_char()?;
        let next_pos = self.position + current.len_utf8();
        self.input[next_pos..].chars().next()
    }

    /// Advance position by the current character's UTF-8 byte length
    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn single(&mut self, kind: TokenKind<'a>) -> TokenKind<'a> {
        self.advance();
        kind
    }

    fn double(&mut self, kind: TokenKind<'a>) -> TokenKind<'a> {
        self.advance();
        self.advance();
        kind
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a string literal delimited by `quote`
    fn read_string(&mut self, quote: char) -> ExpressionResult<TokenKind<'a>> {
        let start_pos = self.position;
        self.advance(); // Skip opening quote

        let mut has_escapes = false;

        while let Some(ch) = self.current_char() {
            if ch == quote {
                let end_pos = self.position;
                self.advance(); // Skip closing quote

                let raw = &self.input[start_pos + 1..end_pos];
                if !has_escapes {
                    return Ok(TokenKind::String(Cow::Borrowed(raw)));
                }
                return Ok(TokenKind::String(Cow::Owned(unescape(raw))));
            } else if ch == '\\' {
                has_escapes = true;
                self.advance();
                if self.current_char().is_some() {
                    self.advance();
                }
            } else {
                self.advance();
            }
        }

        Err(ExpressionError::syntax_error(
            "Unterminated string literal",
            start_pos,
        ))
    }

    /// Read a number (integer or float)
    fn read_number(&mut self) -> ExpressionResult<TokenKind<'a>> {
        let start_pos = self.position;
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !is_float && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance();
            } else {
                break;
            }
        }

        let num_str = &self.input[start_pos..self.position];

        if is_float {
            num_str
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| ExpressionError::syntax_error("Invalid float literal", start_pos))
        } else {
            // Literals too large for i64 fall back to float
            match num_str.parse::<i64>() {
                Ok(i) => Ok(TokenKind::Integer(i)),
                Err(_) => num_str.parse::<f64>().map(TokenKind::Float).map_err(|_| {
                    ExpressionError::syntax_error("Invalid integer literal", start_pos)
                }),
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier_or_keyword(&mut self) -> ExpressionResult<TokenKind<'a>> {
        let start_pos = self.position;

        if matches!(self.current_char(), Some('@' | '$' | '#')) {
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let name = &self.input[start_pos..self.position];

        // `@` alone is the shorthand for the first entity; `$`/`#` need a name
        if name == "$" || name == "#" {
            return Err(ExpressionError::syntax_error(
                format!("Expected a name after '{}'", name),
                start_pos,
            ));
        }

        let kind = if name.eq_ignore_ascii_case("true") {
            TokenKind::Boolean(true)
        } else if name.eq_ignore_ascii_case("false") {
            TokenKind::Boolean(false)
        } else if name.eq_ignore_ascii_case("null") {
            TokenKind::Null
        } else {
            TokenKind::Identifier(name)
        };

        Ok(kind)
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || matches!(ch, '_' | '@' | '$' | '#')
}

/// Resolve escape sequences; unknown escapes keep their backslash.
fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}
