//! Byte offsets into expression source and their line/column form

/// Byte range `start..end` a token was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// First byte
    pub start: usize,
    /// One past the last byte
    pub end: usize,
}

impl Span {
    /// Span of `start..end`
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Offset reported in errors
    pub fn offset(&self) -> usize {
        self.start
    }
}

/// 1-based line and column for a byte offset, counted in characters.
///
/// An offset past the end lands one column after the last character.
pub fn line_col_at(source: &str, offset: usize) -> (usize, usize) {
    source
        .char_indices()
        .take_while(|(i, _)| *i < offset)
        .fold((1, 1), |(line, col), (_, ch)| {
            if ch == '\n' { (line + 1, 1) } else { (line, col + 1) }
        })
}
