//! Error types for adaptive-expression
//!
//! Parse-time failures (`SyntaxError`, `ParseError`) are fatal and carry the
//! byte position of the offending input. Everything else is an evaluation
//! error: a recoverable value returned in place of a result.

use thiserror::Error;

// ============================================================================
// Main Error Type
// ============================================================================

/// Expression parsing and evaluation errors
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExpressionError {
    /// Lexical error (bad character, unterminated string, bad number)
    #[error("Expression syntax error at {position}: {message}")]
    SyntaxError { message: String, position: usize },

    /// Grammar error
    #[error("Expression parse error at {position}: {message}")]
    ParseError { message: String, position: usize },

    /// Evaluation error
    #[error("Expression evaluation error: {message}")]
    EvalError { message: String },

    /// Type mismatch error
    #[error("Type error: expected {expected}, found {actual}")]
    TypeError { expected: String, actual: String },

    /// Invalid function argument
    #[error("Invalid argument for {function}: {message}")]
    InvalidArgument { function: String, message: String },

    /// Division by zero
    #[error("Cannot divide by 0")]
    DivisionByZero,

    /// Regex compilation or matching error
    #[error("Regex error: {message}")]
    RegexError { message: String },

    /// Index out of bounds
    #[error("Index out of bounds: index {index} is out of range for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    /// Malformed or unwritable memory path
    #[error("Invalid memory path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Unparseable timestamp, unknown time zone or bad format string
    #[error("Invalid date: {message}")]
    InvalidDate { message: String },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
}

impl ExpressionError {
    /// Get error code for categorization
    pub fn code(&self) -> &'static str {
        match self {
            Self::SyntaxError { .. } => "EXPR:SYNTAX",
            Self::ParseError { .. } => "EXPR:PARSE",
            Self::EvalError { .. } => "EXPR:EVAL",
            Self::TypeError { .. } => "EXPR:TYPE",
            Self::InvalidArgument { .. } => "EXPR:INVALID_ARG",
            Self::DivisionByZero => "EXPR:DIV_ZERO",
            Self::RegexError { .. } => "EXPR:REGEX",
            Self::IndexOutOfBounds { .. } => "EXPR:INDEX_OOB",
            Self::InvalidPath { .. } => "EXPR:INVALID_PATH",
            Self::InvalidDate { .. } => "EXPR:INVALID_DATE",
            Self::Json(_) => "EXPR:JSON",
            Self::Xml(_) => "EXPR:XML",
        }
    }

    /// True for failures raised while turning text into an AST.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::SyntaxError { .. } | Self::ParseError { .. })
    }

    /// Byte offset into the source, for parse-time errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::SyntaxError { position, .. } | Self::ParseError { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create a syntax error
    pub fn syntax_error(message: impl Into<String>, position: usize) -> Self {
        Self::SyntaxError {
            message: message.into(),
            position,
        }
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, position: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            position,
        }
    }

    /// Create an evaluation error
    pub fn eval_error(message: impl Into<String>) -> Self {
        Self::EvalError {
            message: message.into(),
        }
    }

    /// Create a type error
    pub fn type_error(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create a division by zero error
    pub fn division_by_zero() -> Self {
        Self::DivisionByZero
    }

    /// Create a regex error
    pub fn regex_error(message: impl Into<String>) -> Self {
        Self::RegexError {
            message: message.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: i64, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid date error
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }
}

// ============================================================================
// External Error Conversions
// ============================================================================

impl From<chrono::format::ParseError> for ExpressionError {
    fn from(error: chrono::format::ParseError) -> Self {
        Self::invalid_date(error.to_string())
    }
}

impl From<regex::Error> for ExpressionError {
    fn from(error: regex::Error) -> Self {
        Self::regex_error(error.to_string())
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Outcome of evaluating an expression: the value, or the error that stopped it.
pub type EvaluationResult = ExpressionResult<serde_json::Value>;
