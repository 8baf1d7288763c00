//! Decision variables and the variable-shaped interface shared with
//! variable-like expressions.

use super::error::ComponentError;
use super::index::{IndexKey, IndexSet};
use super::param::Initializer;
use crate::computation::Evaluator;
use crate::store::{NodeId, NodeMetadata, Registry, Unit, VarState};
use std::collections::HashMap;

/// The surface generic model code uses on anything that looks like a variable.
///
/// Real variables implement every method. Variable-like expressions implement
/// the mutators as guards that always fail with a descriptive error.
pub trait VarLike {
    fn name(&self) -> String;
    /// `Ok(None)` when no value is available yet.
    fn value(&self, registry: &Registry) -> Result<Option<f64>, ComponentError>;
    fn set_value(&self, registry: &mut Registry, value: f64) -> Result<(), ComponentError>;
    fn setlb(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError>;
    fn setub(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError>;
    /// Fixes at `value`, or at the current value when `None`.
    fn fix(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError>;
    fn unfix(&self, registry: &mut Registry) -> Result<(), ComponentError>;
}

/// Handle to one entry of a `Var`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarData {
    name: String,
    node: NodeId,
}

impl VarData {
    pub fn node(&self) -> NodeId { self.node }

    pub fn is_fixed(&self, registry: &Registry) -> bool {
        registry.var_state(self.node).is_some_and(|s| s.fixed)
    }

    pub fn bounds(&self, registry: &Registry) -> (Option<f64>, Option<f64>) {
        registry.var_state(self.node).map_or((None, None), |s| (s.lb, s.ub))
    }

    fn state_mut<'r>(&self, registry: &'r mut Registry) -> Result<&'r mut VarState, ComponentError> {
        registry.var_state_mut(self.node).ok_or_else(|| ComponentError::UnknownIndex {
            name: self.name.clone(),
            index: IndexKey::Unindexed,
        })
    }
}

impl VarLike for VarData {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn value(&self, registry: &Registry) -> Result<Option<f64>, ComponentError> {
        Ok(registry.var_state(self.node).and_then(|s| s.value))
    }

    fn set_value(&self, registry: &mut Registry, value: f64) -> Result<(), ComponentError> {
        self.state_mut(registry)?.value = Some(value);
        Ok(())
    }

    fn setlb(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        self.state_mut(registry)?.lb = value;
        Ok(())
    }

    fn setub(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        self.state_mut(registry)?.ub = value;
        Ok(())
    }

    fn fix(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        let state = self.state_mut(registry)?;
        if value.is_some() {
            state.value = value;
        }
        state.fixed = true;
        Ok(())
    }

    fn unfix(&self, registry: &mut Registry) -> Result<(), ComponentError> {
        self.state_mut(registry)?.fixed = false;
        Ok(())
    }
}

/// A named, indexed decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    name: String,
    index_set: IndexSet,
    entries: HashMap<IndexKey, VarData>,
}

impl Var {
    pub fn build(
        registry: &mut Registry,
        name: &str,
        index_set: IndexSet,
        init: &Initializer,
        unit: Option<Unit>,
    ) -> Self {
        let mut entries = HashMap::with_capacity(index_set.len());
        for key in &index_set {
            let state = VarState { value: init.value_for(key), ..VarState::default() };
            let meta = NodeMetadata { name: key.entry_name(name), unit: unit.clone(), doc: None };
            let node = registry.add_var(state, meta);
            // The registry may have suffixed the name to keep it unique.
            let entry_name = registry.name(node).to_string();
            entries.insert(key.clone(), VarData { name: entry_name, node });
        }
        Self { name: name.to_string(), index_set, entries }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn index_set(&self) -> &IndexSet { &self.index_set }

    pub fn get(&self, key: &IndexKey) -> Result<VarData, ComponentError> {
        self.entries.get(key).cloned().ok_or_else(|| ComponentError::UnknownIndex {
            name: self.name.clone(),
            index: key.clone(),
        })
    }

    pub fn node(&self, key: &IndexKey) -> Result<NodeId, ComponentError> {
        self.get(key).map(|d| d.node)
    }

    /// Fixes every entry at its current value.
    pub fn fix_all(&self, registry: &mut Registry) -> Result<(), ComponentError> {
        for data in self.entries.values() {
            data.fix(registry, None)?;
        }
        Ok(())
    }
}

/// True when every variable the expression rooted at `root` depends on is fixed.
pub(crate) fn expression_is_fixed(registry: &Registry, root: NodeId) -> bool {
    registry
        .variables_in(root)
        .into_iter()
        .all(|v| registry.var_state(v).is_some_and(|s| s.fixed))
}

/// Numeric value of an optional expression body.
pub(crate) fn evaluate_body(registry: &Registry, body: Option<NodeId>) -> Result<Option<f64>, ComponentError> {
    match body {
        Some(node) => Ok(Some(Evaluator::new(registry).value(node)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mole_frac(reg: &mut Registry) -> Var {
        let pc = IndexSet::from_labels(["Liq"]).product(&IndexSet::from_labels(["A", "B"]));
        Var::build(reg, "mole_frac_phase_comp", pc, &Initializer::Value(0.5), None)
    }

    #[test]
    fn test_var_mutators_succeed() {
        let mut reg = Registry::new();
        let x = mole_frac(&mut reg);
        let xa = x.get(&IndexKey::pair("Liq", "A")).unwrap();

        xa.setlb(&mut reg, Some(0.0)).unwrap();
        xa.setub(&mut reg, Some(1.0)).unwrap();
        assert_eq!(xa.bounds(&reg), (Some(0.0), Some(1.0)));

        xa.fix(&mut reg, Some(0.3)).unwrap();
        assert!(xa.is_fixed(&reg));
        assert_eq!(xa.value(&reg).unwrap(), Some(0.3));

        xa.unfix(&mut reg).unwrap();
        assert!(!xa.is_fixed(&reg));
        xa.set_value(&mut reg, 0.7).unwrap();
        assert_eq!(xa.value(&reg).unwrap(), Some(0.7));
    }

    #[test]
    fn test_unknown_index() {
        let mut reg = Registry::new();
        let x = mole_frac(&mut reg);
        let err = x.get(&IndexKey::pair("Sol", "A")).unwrap_err();
        assert!(err.to_string().contains("mole_frac_phase_comp"));
        assert_eq!(x.get(&IndexKey::pair("Liq", "B")).unwrap().name(), "mole_frac_phase_comp[Liq,B]");
    }

    #[test]
    fn test_entry_names_match_the_registry() {
        let mut reg = Registry::new();
        let first = Var::build(&mut reg, "x", IndexSet::from_labels(["a"]), &Initializer::Empty, None);
        let second = Var::build(&mut reg, "x", IndexSet::from_labels(["a"]), &Initializer::Empty, None);
        let a = IndexKey::single("a");

        assert_eq!(first.get(&a).unwrap().name(), "x[a]");
        let data = second.get(&a).unwrap();
        assert_eq!(data.name(), "x[a]_1");
        assert_eq!(data.name(), reg.name(data.node()));
    }

    #[test]
    fn test_expression_is_fixed_tracks_all_variables() {
        let mut reg = Registry::new();
        let x = mole_frac(&mut reg);
        let a = x.node(&IndexKey::pair("Liq", "A")).unwrap();
        let b = x.node(&IndexKey::pair("Liq", "B")).unwrap();
        let e = reg.mul(a, b);

        assert!(!expression_is_fixed(&reg, e));
        x.get(&IndexKey::pair("Liq", "A")).unwrap().fix(&mut reg, None).unwrap();
        assert!(!expression_is_fixed(&reg, e));
        x.fix_all(&mut reg).unwrap();
        assert!(expression_is_fixed(&reg, e));
        assert_eq!(evaluate_body(&reg, Some(e)).unwrap(), Some(0.25));
        assert_eq!(evaluate_body(&reg, None).unwrap(), None);
    }
}
