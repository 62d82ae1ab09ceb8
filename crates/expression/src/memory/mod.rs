//! Memory: the data an expression reads from and writes to
//!
//! The evaluator only sees `&mut dyn Memory`. Backends differ in what they
//! wrap and in how strictly property names are matched.

mod json;
mod map;
pub mod path;
mod simple;
mod stacked;

use serde_json::Value;

use crate::error::ExpressionResult;

pub use json::{JsonMemory, parse_lenient};
pub use map::MapMemory;
pub use path::PathSegment;
pub use simple::SimpleObjectMemory;
pub use stacked::StackedMemory;

/// Path-addressed storage the evaluator reads and writes
pub trait Memory {
    /// Value at `path`, or `None` when any step is missing, null or out of range.
    fn get_value(&self, path: &str) -> Option<Value>;

    /// Store `value` at `path`, creating missing intermediate containers.
    fn set_value(&mut self, path: &str, value: Value) -> ExpressionResult<()>;
}

impl<M: Memory + ?Sized> Memory for &mut M {
    fn get_value(&self, path: &str) -> Option<Value> {
        (**self).get_value(path)
    }

    fn set_value(&mut self, path: &str, value: Value) -> ExpressionResult<()> {
        (**self).set_value(path, value)
    }
}

impl<M: Memory + ?Sized> Memory for Box<M> {
    fn get_value(&self, path: &str) -> Option<Value> {
        (**self).get_value(path)
    }

    fn set_value(&mut self, path: &str, value: Value) -> ExpressionResult<()> {
        (**self).set_value(path, value)
    }
}
