//! Static analysis of the memory paths an expression reads
//!
//! Walks the tree without evaluating anything. Accessor chains with constant
//! indices fold into one path (`items[2].name`); a computed index ends the
//! chain, so `list[i + 1]` reports `list` plus whatever the index reads.
//! Paths rooted in an iteration variable of `foreach`, `select` or `where`
//! are local and left out.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::core::ast::Expr;
use crate::memory::path::quote_key;

const ITERATING_FUNCTIONS: [&str; 3] = ["foreach", "select", "where"];

/// Collect the memory paths read by `expr`
pub fn collect_references(expr: &Expr) -> BTreeSet<String> {
    let mut references = BTreeSet::new();
    if let Some(path) = walk(expr, &mut references) {
        references.insert(path);
    }
    references
}

/// Returns the path `expr` itself denotes, adding every completed path it
/// reads along the way to `references`.
fn walk(expr: &Expr, references: &mut BTreeSet<String>) -> Option<String> {
    match expr {
        Expr::Literal(_) => None,

        Expr::Identifier(name) => Some(name.to_string()),

        Expr::PropertyAccess { object, property } => {
            walk(object, references).map(|path| format!("{}.{}", path, property))
        }

        Expr::IndexAccess { object, index } => {
            let path = walk(object, references);
            if let Some(index_path) = walk(index, references) {
                references.insert(index_path);
            }

            let path = path?;
            match index.as_literal().and_then(constant_segment) {
                Some(segment) => Some(format!("{}{}", path, segment)),
                None => {
                    references.insert(path);
                    None
                }
            }
        }

        Expr::FunctionCall { function, args } => {
            if ITERATING_FUNCTIONS.contains(&function.name()) {
                if let [collection, Expr::Identifier(iterator), body] = args.as_slice() {
                    add_argument(collection, references);

                    let mut inner = BTreeSet::new();
                    add_argument(body, &mut inner);
                    references.extend(inner.into_iter().filter(|path| !is_local(path, iterator)));
                    return None;
                }
            }

            for arg in args {
                add_argument(arg, references);
            }
            None
        }
    }
}

fn add_argument(arg: &Expr, references: &mut BTreeSet<String>) {
    if let Some(path) = walk(arg, references) {
        references.insert(path);
    }
}

fn constant_segment(index: &Value) -> Option<String> {
    match index {
        Value::Number(n) if n.is_i64() => Some(format!("[{}]", n)),
        Value::String(key) => Some(quote_key(key)),
        _ => None,
    }
}

fn is_local(path: &str, iterator: &str) -> bool {
    path.strip_prefix(iterator)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}
