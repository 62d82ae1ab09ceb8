use indexmap::IndexMap;
use serde_json::Value;

use super::Memory;
use super::path::{PathSegment, assign, parse_path, resolve};
use crate::error::{ExpressionError, ExpressionResult};

/// Memory over named top-level bindings
///
/// The first path segment selects a binding; the rest of the path walks into
/// its value. Binding names match exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapMemory {
    bindings: IndexMap<String, Value>,
}

impl MapMemory {
    /// Create an empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.bindings.insert(name.into(), value)
    }

    /// Value bound to `name`
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Check whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Memory for MapMemory {
    fn get_value(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path).ok()?;
        let (PathSegment::Property(name), rest) = segments.split_first()? else {
            return None;
        };
        let root = self.bindings.get(name)?;
        resolve(root, rest, false)
            .filter(|v| !v.is_null())
            .cloned()
    }

    fn set_value(&mut self, path: &str, value: Value) -> ExpressionResult<()> {
        let segments = parse_path(path)?;
        let Some((PathSegment::Property(name), rest)) = segments.split_first() else {
            return Err(ExpressionError::invalid_path(
                path,
                "must start with a binding name",
            ));
        };

        let mut root = self.bindings.get(name).cloned().unwrap_or(Value::Null);
        assign(&mut root, rest, value, false, path)?;
        self.bindings.insert(name.clone(), root);
        Ok(())
    }
}

impl FromIterator<(String, Value)> for MapMemory {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl From<serde_json::Map<String, Value>> for MapMemory {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}
