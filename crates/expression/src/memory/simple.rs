use serde::Serialize;
use serde_json::Value;

use super::Memory;
use super::path::{assign, parse_path, resolve};
use crate::error::ExpressionResult;

/// Memory over an arbitrary object graph
///
/// Any `Serialize` type can be wrapped; it is captured as a JSON tree.
/// Property lookup tries the exact name first and then ignores ASCII case,
/// so `user.Name` finds a `name` field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleObjectMemory {
    root: Value,
}

impl SimpleObjectMemory {
    /// Wrap an existing value
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Capture any serializable object
    pub fn wrap<T: Serialize + ?Sized>(object: &T) -> ExpressionResult<Self> {
        Ok(Self::new(serde_json::to_value(object)?))
    }

    /// Borrow the wrapped value
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Unwrap into the underlying value
    pub fn into_inner(self) -> Value {
        self.root
    }
}

impl Memory for SimpleObjectMemory {
    fn get_value(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path).ok()?;
        resolve(&self.root, &segments, true)
            .filter(|v| !v.is_null())
            .cloned()
    }

    fn set_value(&mut self, path: &str, value: Value) -> ExpressionResult<()> {
        let segments = parse_path(path)?;
        assign(&mut self.root, &segments, value, true, path)
    }
}

impl From<Value> for SimpleObjectMemory {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Order {
        id: u32,
        items: Vec<&'static str>,
    }

    #[test]
    fn test_wrap_serializable() {
        let memory = SimpleObjectMemory::wrap(&Order {
            id: 7,
            items: vec!["tea", "milk"],
        })
        .unwrap();
        assert_eq!(memory.get_value("id"), Some(json!(7)));
        assert_eq!(memory.get_value("ITEMS[1]"), Some(json!("milk")));
        assert_eq!(memory.get_value("items[2]"), None);
    }

    #[test]
    fn test_set_value_creates_path() {
        let mut memory = SimpleObjectMemory::new(json!({}));
        memory.set_value("user.tags[0]", json!("new")).unwrap();
        assert_eq!(memory.value(), &json!({"user": {"tags": ["new"]}}));
    }
}
