use super::{ReactionConfig, ReactionError};
use crate::component::{ComponentError, IndexKey, IndexSet, Initializer, Param};
use crate::expression::Relation;
use crate::properties::{PropertyPackage, StateBlock};
use crate::store::{NodeId, Registry};
use std::fmt;
use std::sync::Arc;

/// Parameters of an equilibrium reaction, attached to a property package.
#[derive(Clone)]
pub struct ReactionBlock {
    name: String,
    property_package: Arc<dyn PropertyPackage>,
    k_eq: Param,
    pub(crate) reaction_order: Option<Param>,
}

impl ReactionBlock {
    /// Creates the block and its `k_eq` parameter over `reactions`.
    pub fn build(
        registry: &mut Registry,
        name: &str,
        property_package: Arc<dyn PropertyPackage>,
        reactions: IndexSet,
        k_eq: &Initializer,
    ) -> Result<Self, ComponentError> {
        let k_eq = Param::build(
            registry,
            &format!("{}.k_eq", name),
            reactions,
            k_eq,
            Some("Equilibrium constant"),
            None,
        )?;
        Ok(Self { name: name.to_string(), property_package, k_eq, reaction_order: None })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn property_package(&self) -> &dyn PropertyPackage { self.property_package.as_ref() }
    pub fn k_eq(&self) -> &Param { &self.k_eq }

    /// `Err(ParametersNotBuilt)` until an equilibrium form has built its parameters.
    pub fn reaction_order(&self) -> Result<&Param, ReactionError> {
        self.reaction_order
            .as_ref()
            .ok_or_else(|| ReactionError::ParametersNotBuilt { block: self.name.clone() })
    }

    pub fn k_eq_node(&self, reaction: &IndexKey) -> Result<NodeId, ComponentError> {
        self.k_eq.node(reaction)
    }

    /// Builds the reaction-order parameters with the configured equilibrium form
    /// and returns one equilibrium relation per reaction, in index order.
    pub fn equilibrium_constraints(
        &mut self,
        registry: &mut Registry,
        state: &StateBlock,
        config: &ReactionConfig,
        temperature: NodeId,
    ) -> Result<Vec<(IndexKey, Relation)>, ReactionError> {
        let form = config.equilibrium_form.form();
        form.build_parameters(registry, self, config)?;

        let reactions: Vec<IndexKey> = self.k_eq.index_set().iter().cloned().collect();
        let mut relations = Vec::with_capacity(reactions.len());
        for r_idx in reactions {
            let relation = form.return_expression(registry, state, self, &r_idx, temperature)?;
            relations.push((r_idx, relation));
        }
        Ok(relations)
    }
}

impl fmt::Debug for ReactionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactionBlock")
            .field("name", &self.name)
            .field("k_eq", &self.k_eq)
            .field("reaction_order", &self.reaction_order)
            .finish_non_exhaustive()
    }
}
