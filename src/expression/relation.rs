//! Equality relations handed back to the caller for declaration as constraints.

use crate::computation::{ComputationError, Evaluator};
use crate::store::{NodeId, NodeKind, Operation, Registry};
use serde::{Deserialize, Serialize};

/// `lhs == rhs`.
///
/// `rhs` is `None` when the right-hand side is the empty expression, e.g. a
/// mass-action product in which every order is zero. Such a relation is
/// degenerate: it cannot be evaluated and is almost certainly a modeling error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub lhs: NodeId,
    pub rhs: Option<NodeId>,
}

impl Relation {
    pub fn equality(lhs: NodeId, rhs: Option<NodeId>) -> Self {
        Self { lhs, rhs }
    }

    pub fn is_degenerate(&self) -> bool { self.rhs.is_none() }

    /// `lhs - rhs` at the current values; `None` for a degenerate relation.
    pub fn residual(&self, registry: &Registry) -> Result<Option<f64>, ComputationError> {
        let Some(rhs) = self.rhs else { return Ok(None) };
        let eval = Evaluator::new(registry);
        Ok(Some(eval.value(self.lhs)? - eval.value(rhs)?))
    }
}

/// The factors of a product tree, left to right. A node that is not a
/// multiplication is its own single factor.
pub fn product_factors(registry: &Registry, root: NodeId) -> Vec<NodeId> {
    let mut factors = Vec::new();
    collect_factors(registry, root, &mut factors);
    factors
}

fn collect_factors(registry: &Registry, node: NodeId, out: &mut Vec<NodeId>) {
    match registry.kind(node) {
        NodeKind::Formula(Operation::Multiply) => {
            for &parent in registry.get_parents(node) {
                collect_factors(registry, parent, out);
            }
        }
        _ => out.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NodeMetadata;

    #[test]
    fn test_residual_and_factors() {
        let mut reg = Registry::new();
        let k = reg.add_param(6.0, NodeMetadata::named("k"));
        let a = reg.add_constant(2.0);
        let b = reg.add_constant(3.0);
        let c = reg.add_constant(1.0);
        let ab = reg.mul(a, b);
        let abc = reg.mul(ab, c);

        let rel = Relation::equality(k, Some(abc));
        assert!(!rel.is_degenerate());
        assert_eq!(rel.residual(&reg), Ok(Some(0.0)));
        assert_eq!(product_factors(&reg, abc), vec![a, b, c]);
        assert_eq!(product_factors(&reg, a), vec![a]);
    }

    #[test]
    fn test_degenerate_relation() {
        let mut reg = Registry::new();
        let k = reg.add_param(1.0, NodeMetadata::named("k"));
        let rel = Relation::equality(k, None);
        assert!(rel.is_degenerate());
        assert_eq!(rel.residual(&reg), Ok(None));
    }
}
