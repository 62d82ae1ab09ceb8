//! Re-exports of the crate error types for modules under `core`

pub use crate::error::{ExpressionError, ExpressionResult};
