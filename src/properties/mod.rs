//! Property context consumed by reaction blocks: phases, components and the
//! per-phase classification, plus the state block carrying live compositions.
pub mod package;
pub mod state;

use crate::component::{IndexSet, Label};
use thiserror::Error;

pub use package::{GenericPropertyPackage, PhaseSpec, PhaseType};
pub use state::StateBlock;

#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("Phase '{0}' is not declared in the property package")]
    UnknownPhase(Label),
    #[error("'{0}' is declared more than once in the property package")]
    DuplicateMember(Label),
    #[error("Invalid property package config: {0}")]
    Config(#[from] serde_json::Error),
}

/// What a reaction block needs to know about the property package it is attached to.
pub trait PropertyPackage {
    /// Phases, in declaration order.
    fn phase_list(&self) -> &IndexSet;
    /// Components, in declaration order.
    fn component_list(&self) -> &IndexSet;
    fn is_solid_phase(&self, phase: &Label) -> Result<bool, PropertyError>;
}
