//! Human-readable rendering of expressions, relations and evaluation traces.
pub mod trace;

pub use trace::{format_expression, format_relation, format_trace};
