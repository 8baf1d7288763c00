//! ledger.rs
//! Memoised node values for a single evaluation pass.

use crate::store::NodeId;

pub use self::error::ComputationError;
mod error {
    use super::*;
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum ComputationError {
        #[error("No value for variable '{node_name}'")]
        UnresolvedValue { node_id: NodeId, node_name: String },
        #[error("Math error at node {node_id:?}: {msg}")]
        MathError { node_id: NodeId, msg: String },
        #[error("Parent count mismatch at node {node_id:?}: expected {expected}, found {actual}")]
        ParentCountMismatch { node_id: NodeId, expected: usize, actual: usize },
        #[error("Node {0:?} does not exist")]
        UnknownNode(NodeId),
        #[error("Cycle detected")]
        CycleDetected,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    values: Vec<Option<Result<f64, ComputationError>>>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn ensure_capacity(&mut self, size: usize) {
        if self.values.len() < size {
            self.values.resize(size, None);
        }
    }

    #[inline(always)]
    pub fn get(&self, node_id: NodeId) -> Option<&Result<f64, ComputationError>> {
        self.values.get(node_id.index())?.as_ref()
    }

    #[inline(always)]
    pub fn insert(&mut self, node_id: NodeId, value: Result<f64, ComputationError>) {
        let idx = node_id.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = Some(value);
    }
}
