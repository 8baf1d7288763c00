//! Symbolic node storage shared by every component of a model.
pub mod registry;
pub mod types;

pub use registry::Registry;
pub use types::{NodeId, NodeKind, NodeMetadata, Operation, Unit, VarState};
