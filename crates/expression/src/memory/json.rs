use serde_json::Value;

use super::Memory;
use super::path::{PathSegment, assign, parse_path};
use crate::error::ExpressionResult;

/// Memory over a JSON document
///
/// Reads translate the path into a JSON pointer, so property names match
/// exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonMemory {
    document: Value,
}

impl JsonMemory {
    /// Wrap an existing document
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Parse a document, accepting single-quoted strings
    pub fn parse(text: &str) -> ExpressionResult<Self> {
        Ok(Self::new(parse_lenient(text)?))
    }

    /// Borrow the document
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl Memory for JsonMemory {
    fn get_value(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path).ok()?;
        self.document
            .pointer(&to_pointer(&segments))
            .filter(|v| !v.is_null())
            .cloned()
    }

    fn set_value(&mut self, path: &str, value: Value) -> ExpressionResult<()> {
        let segments = parse_path(path)?;
        assign(&mut self.document, &segments, value, false, path)
    }
}

fn to_pointer(segments: &[PathSegment]) -> String {
    let mut pointer = String::new();
    for segment in segments {
        pointer.push('/');
        pointer.push_str(&segment.key().replace('~', "~0").replace('/', "~1"));
    }
    pointer
}

/// Parse JSON text, rewriting single-quoted strings into standard ones first
/// when the strict parse fails.
pub fn parse_lenient(text: &str) -> ExpressionResult<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict_error) => {
            let normalized = normalize_quotes(text);
            if normalized == text {
                return Err(strict_error.into());
            }
            Ok(serde_json::from_str(&normalized)?)
        }
    }
}

fn normalize_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (None, '\'') => {
                quote = Some('\'');
                out.push('"');
            }
            (None, '"') => {
                quote = Some('"');
                out.push('"');
            }
            (Some(q), c) if c == q => {
                quote = None;
                out.push('"');
            }
            (Some(q), '\\') => match chars.next() {
                Some('\'') if q == '\'' => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            (Some('\''), '"') => out.push_str("\\\""),
            (_, c) => out.push(c),
        }
    }

    out
}
