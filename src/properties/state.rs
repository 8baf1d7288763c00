use super::PropertyPackage;
use crate::component::{ComponentError, IndexKey, Initializer, Label, Var};
use crate::store::{NodeId, Registry};
use std::fmt;
use std::sync::Arc;

/// Physical state a reaction block reads its compositions from.
#[derive(Clone)]
pub struct StateBlock {
    name: String,
    params: Arc<dyn PropertyPackage>,
    mole_frac_phase_comp: Var,
}

impl StateBlock {
    /// Creates `mole_frac_phase_comp` over phase × component, with every
    /// entry initialized to an even split across components.
    pub fn build(registry: &mut Registry, name: &str, params: Arc<dyn PropertyPackage>) -> Self {
        let index = params.phase_list().product(params.component_list());
        let n_comps = params.component_list().len().max(1) as f64;
        let mole_frac_phase_comp = Var::build(
            registry,
            &format!("{}.mole_frac_phase_comp", name),
            index,
            &Initializer::Value(1.0 / n_comps),
            None,
        );
        Self { name: name.to_string(), params, mole_frac_phase_comp }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn params(&self) -> &dyn PropertyPackage { self.params.as_ref() }
    pub fn mole_frac_phase_comp(&self) -> &Var { &self.mole_frac_phase_comp }

    /// Composition node for `(phase, component)`.
    pub fn mole_frac(&self, phase: &Label, component: &Label) -> Result<NodeId, ComponentError> {
        self.mole_frac_phase_comp.node(&IndexKey::pair(phase.clone(), component.clone()))
    }
}

impl fmt::Debug for StateBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBlock")
            .field("name", &self.name)
            .field("mole_frac_phase_comp", &self.mole_frac_phase_comp)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::VarLike;
    use crate::properties::{GenericPropertyPackage, PhaseSpec, PhaseType};

    #[test]
    fn test_compositions_cover_every_phase_and_component() {
        let pkg = GenericPropertyPackage::new(
            vec![
                PhaseSpec { name: "Liq".into(), phase_type: PhaseType::Liquid },
                PhaseSpec { name: "Vap".into(), phase_type: PhaseType::Vapor },
            ],
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
        )
        .unwrap();
        let mut reg = Registry::new();
        let state = StateBlock::build(&mut reg, "fs.state", Arc::new(pkg));

        assert_eq!(state.mole_frac_phase_comp().index_set().len(), 8);
        let node = state.mole_frac(&"Vap".into(), &"C".into()).unwrap();
        assert_eq!(reg.name(node), "fs.state.mole_frac_phase_comp[Vap,C]");
        let data = state.mole_frac_phase_comp().get(&IndexKey::pair("Liq", "A")).unwrap();
        assert_eq!(data.value(&reg).unwrap(), Some(0.25));
        assert!(state.mole_frac(&"Sol".into(), &"A".into()).is_err());
    }
}
