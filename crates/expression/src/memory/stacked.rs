use serde_json::Value;

use super::path::{PathSegment, parse_path};
use super::{MapMemory, Memory};
use crate::error::ExpressionResult;

/// Local scope layered over a parent memory
///
/// Iterator variables of `foreach`, `select` and `where` live in `locals`.
/// A path whose root is a local name resolves against the locals; anything
/// else falls through to the parent, including writes.
pub struct StackedMemory<'a> {
    locals: MapMemory,
    parent: &'a mut dyn Memory,
}

impl<'a> StackedMemory<'a> {
    /// Create a scope with no locals
    pub fn new(parent: &'a mut dyn Memory) -> Self {
        Self {
            locals: MapMemory::new(),
            parent,
        }
    }

    /// Create a scope with a single local binding
    pub fn with_local(parent: &'a mut dyn Memory, name: impl Into<String>, value: Value) -> Self {
        let mut scope = Self::new(parent);
        scope.locals.insert(name, value);
        scope
    }

    /// Bind or rebind a local
    pub fn set_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name, value);
    }

    fn is_local(&self, path: &str) -> bool {
        match parse_path(path).ok().as_deref() {
            Some([PathSegment::Property(root), ..]) => self.locals.contains(root),
            _ => false,
        }
    }
}

impl Memory for StackedMemory<'_> {
    fn get_value(&self, path: &str) -> Option<Value> {
        if self.is_local(path) {
            self.locals.get_value(path)
        } else {
            self.parent.get_value(path)
        }
    }

    fn set_value(&mut self, path: &str, value: Value) -> ExpressionResult<()> {
        if self.is_local(path) {
            self.locals.set_value(path, value)
        } else {
            self.parent.set_value(path, value)
        }
    }
}
