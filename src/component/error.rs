//! Defines the error types for components and expressions.
use super::index::IndexKey;
use crate::computation::ComputationError;
use thiserror::Error;

/// Coarse classification of a `ComponentError`, for callers that branch on
/// the category rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller used the component in a way it does not support.
    Usage,
    /// The component has not been built yet.
    ConstructionState,
    /// Raised by the symbolic engine or by initialization data.
    Collaborator,
}

fn bound_advice(plural: &bool) -> &'static str {
    if *plural { "inequality Constraints" } else { "an inequality Constraint" }
}

fn fix_advice(plural: &bool) -> &'static str {
    if *plural { "equality Constraints" } else { "an equality Constraint" }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("{name} is an Expression and does not have a value which can be set.")]
    CannotSetValue { name: String },
    #[error("{name} is an Expression and can not have bounds. Use {} instead.", bound_advice(.plural))]
    CannotBound { name: String, plural: bool },
    #[error("{name} is an Expression and can not be fixed. Use {} instead.", fix_advice(.plural))]
    CannotFix { name: String, plural: bool },
    #[error("{name} is an Expression and can not be unfixed.")]
    CannotUnfix { name: String },
    #[error("Scalar component '{name}' does not accept index values other than None. Invalid value: {index}")]
    InvalidIndex { name: String, index: IndexKey },
    #[error("Skip can not be assigned to an Expression that is not indexed: {name}")]
    SkipNotAllowed { name: String },
    #[error("Cannot call {operation} on '{name}' before it has been constructed")]
    NotConstructed { name: String, operation: &'static str },
    #[error("Index '{index}' is not valid for component '{name}'")]
    UnknownIndex { name: String, index: IndexKey },
    #[error("No initial value for index '{index}' of component '{name}'")]
    MissingData { name: String, index: IndexKey },
    #[error(transparent)]
    Computation(#[from] ComputationError),
}

impl ComponentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComponentError::CannotSetValue { .. }
            | ComponentError::CannotBound { .. }
            | ComponentError::CannotFix { .. }
            | ComponentError::CannotUnfix { .. }
            | ComponentError::InvalidIndex { .. }
            | ComponentError::SkipNotAllowed { .. } => ErrorKind::Usage,
            ComponentError::NotConstructed { .. } => ErrorKind::ConstructionState,
            ComponentError::UnknownIndex { .. }
            | ComponentError::MissingData { .. }
            | ComponentError::Computation(_) => ErrorKind::Collaborator,
        }
    }
}
