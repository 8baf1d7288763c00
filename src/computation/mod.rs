//! Evaluates expression nodes to numbers.
pub mod engine;
pub mod ledger;

pub use engine::Evaluator;
pub use ledger::{ComputationError, Ledger};
