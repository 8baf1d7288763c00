//! Symbolic modelling core for chemical equilibrium reactions.
//!
//! Model quantities live as nodes in a columnar [`store::Registry`]. Indexed
//! parameters and variables ([`component`]) name those nodes, expression
//! components ([`expression`]) hold formulas built from them, and the
//! [`reactions`] module assembles the mole-fraction power-law equilibrium
//! relation `k_eq[r] == prod(x[p,j] ** order[p,j])` for each reaction.

pub mod component;
pub mod computation;
pub mod display;
pub mod expression;
pub mod properties;
pub mod reactions;
pub mod store;

pub use component::{ComponentError, IndexKey, IndexSet, Initializer, Label, Param, Var, VarLike};
pub use expression::{Relation, VarLikeExpression};
pub use properties::{GenericPropertyPackage, PropertyPackage, StateBlock};
pub use reactions::{MoleFracPowerLawEquil, ReactionBlock, ReactionConfig, ReactionError};
pub use store::{NodeId, Registry};
