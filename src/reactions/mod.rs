//! Equilibrium reactions: configuration, parameter blocks and equilibrium forms.
pub mod block;
pub mod config;
pub mod equilibrium_forms;

use crate::component::ComponentError;
use crate::properties::PropertyError;
use thiserror::Error;

pub use block::ReactionBlock;
pub use config::{ParameterData, PhaseComponentTable, ReactionConfig};
pub use equilibrium_forms::{resolve_reaction_orders, EquilibriumForm, EquilibriumFormKind, MoleFracPowerLawEquil};

#[derive(Error, Debug)]
pub enum ReactionError {
    #[error("Reaction block '{block}' has no reaction orders; build its parameters first")]
    ParametersNotBuilt { block: String },
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error("Invalid reaction config: {0}")]
    Config(#[from] serde_json::Error),
}
