//! Abstract Syntax Tree (AST) node types
//!
//! Operators do not appear in the tree: the parser rewrites them into calls
//! of the built-in function they stand for, so `a + b` becomes `add(a, b)`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::builtins::FunctionDescriptor;

/// An expression node in the AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant number, string, boolean or null
    Literal(Value),

    /// Bare root name, looked up in memory
    Identifier(Arc<str>),

    /// Property access (object.property)
    PropertyAccess {
        object: Box<Expr>,
        property: Arc<str>,
    },

    /// Index access (object[index])
    IndexAccess { object: Box<Expr>, index: Box<Expr> },

    /// Call of a function resolved at parse time
    FunctionCall {
        function: Arc<FunctionDescriptor>,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Check if this expression is a literal constant
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    /// Try to extract a literal value if this is a literal expression
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Expr::Literal(val) => Some(val),
            _ => None,
        }
    }

    /// Name of the called function, for call nodes
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Expr::FunctionCall { function, .. } => Some(function.name()),
            _ => None,
        }
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::Identifier(_) => Vec::new(),
            Expr::PropertyAccess { object, .. } => vec![object],
            Expr::IndexAccess { object, index } => vec![object, index],
            Expr::FunctionCall { args, .. } => args.iter().collect(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::PropertyAccess { object, property } => write!(f, "{}.{}", object, property),
            Expr::IndexAccess { object, index } => write!(f, "{}[{}]", object, index),
            Expr::FunctionCall { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
