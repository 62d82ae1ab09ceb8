//! Parse error rendering with source context
//!
//! Shows the line the error is on, a few neighbouring lines, and a caret
//! under the offending column:
//!
//! ```text
//! Error at line 1, column 9:
//!   Expression parse error at 8: Unexpected end of input
//!
//!  1 | add(1, 2
//!              ^
//! ```

use unicode_width::UnicodeWidthStr;

use crate::core::span::line_col_at;
use crate::error::ExpressionError;

/// Format an error message with source context
pub struct ErrorFormatter<'a> {
    source: &'a str,
    offset: usize,
    error_message: String,
    context_before: usize,
    context_after: usize,
}

impl<'a> ErrorFormatter<'a> {
    /// Formatter for an error at byte `offset` of `source`
    pub fn new(source: &'a str, offset: usize, error_message: impl Into<String>) -> Self {
        Self {
            source,
            offset: offset.min(source.len()),
            error_message: error_message.into(),
            context_before: 2,
            context_after: 1,
        }
    }

    /// Set the number of context lines to show
    pub fn with_context(mut self, before: usize, after: usize) -> Self {
        self.context_before = before;
        self.context_after = after;
        self
    }

    /// Render with a single caret
    pub fn format(&self) -> String {
        self.format_with_length(1)
    }

    /// Render with `length` carets starting at the error column
    pub fn format_with_length(&self, length: usize) -> String {
        let (line, column) = line_col_at(self.source, self.offset);
        let lines: Vec<&str> = self.source.split('\n').collect();
        let error_idx = line - 1;

        let mut output = format!("Error at line {}, column {}:\n  {}\n\n", line, column, self.error_message);

        let first = error_idx.saturating_sub(self.context_before);
        let last = (error_idx + self.context_after + 1).min(lines.len());
        let width = last.to_string().len();

        for (idx, text) in lines.iter().enumerate().take(last).skip(first) {
            output.push_str(&format!(" {:width$} | {}\n", idx + 1, text, width = width));
            if idx == error_idx {
                // Pad by display width so wide characters keep the caret aligned
                let before: String = text.chars().take(column - 1).collect();
                output.push_str(&format!(
                    "{}{}{}\n",
                    " ".repeat(width + 4),
                    " ".repeat(before.width()),
                    "^".repeat(length.max(1))
                ));
            }
        }

        output
    }
}

/// Render `error` against the text it came from. Errors without a source
/// position fall back to their plain message.
pub fn format_error(source: &str, error: &ExpressionError) -> String {
    match error.position() {
        Some(offset) => ErrorFormatter::new(source, offset, error.to_string()).format(),
        None => error.to_string(),
    }
}
