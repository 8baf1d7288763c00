//! Equilibrium forms: how reaction orders are chosen and how the
//! equilibrium relation `k_eq[r] == f(composition)` is assembled.

use super::{ReactionBlock, ReactionConfig, ReactionError};
use crate::component::{IndexKey, Initializer, Param};
use crate::expression::Relation;
use crate::properties::{PropertyError, PropertyPackage, StateBlock};
use crate::store::{NodeId, Registry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

pub trait EquilibriumForm {
    /// Attaches the form's parameters to `rblock`.
    fn build_parameters(
        &self,
        registry: &mut Registry,
        rblock: &mut ReactionBlock,
        config: &ReactionConfig,
    ) -> Result<(), ReactionError>;

    /// The equilibrium relation for reaction `r_idx`.
    fn return_expression(
        &self,
        registry: &mut Registry,
        state: &StateBlock,
        rblock: &ReactionBlock,
        r_idx: &IndexKey,
        temperature: NodeId,
    ) -> Result<Relation, ReactionError>;
}

/// Selects an equilibrium form from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquilibriumFormKind {
    #[default]
    MoleFracPowerLaw,
}

impl EquilibriumFormKind {
    pub fn form(&self) -> &'static dyn EquilibriumForm {
        match self {
            EquilibriumFormKind::MoleFracPowerLaw => &MoleFracPowerLawEquil,
        }
    }
}

/// Resolves the order of every (phase, component) pair, in phase-then-component order.
///
/// - With a `reaction_order` table in the parameter data, the table value is
///   used and pairs it leaves out get 0. Stoichiometry is not consulted.
/// - Without one, solid phases get 0 and every other pair gets its
///   stoichiometric coefficient, or 0 if none is declared.
pub fn resolve_reaction_orders(
    ppack: &dyn PropertyPackage,
    config: &ReactionConfig,
) -> Result<Vec<(IndexKey, f64)>, PropertyError> {
    let overrides = config.parameter_data.reaction_order.as_ref();
    let mut orders = Vec::with_capacity(ppack.phase_list().len() * ppack.component_list().len());

    for p in ppack.phase_list().labels() {
        let solid = match overrides {
            Some(_) => false,
            None => ppack.is_solid_phase(p)?,
        };
        for j in ppack.component_list().labels() {
            let order = match overrides {
                Some(table) => table.get(p, j).unwrap_or(0.0),
                // Solids normally do not appear in the equilibrium relationship.
                None if solid => 0.0,
                None => config.stoichiometry.get(p, j).unwrap_or(0.0),
            };
            trace!(phase = %p, component = %j, order, from_overrides = overrides.is_some(), "Resolved reaction order");
            orders.push((IndexKey::pair(p.clone(), j.clone()), order));
        }
    }
    Ok(orders)
}

/// Mass-action law on phase mole fractions:
/// `k_eq[r] == Π x[p, j] ** reaction_order[p, j]` over the pairs with nonzero order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoleFracPowerLawEquil;

impl EquilibriumForm for MoleFracPowerLawEquil {
    fn build_parameters(
        &self,
        registry: &mut Registry,
        rblock: &mut ReactionBlock,
        config: &ReactionConfig,
    ) -> Result<(), ReactionError> {
        let ppack = rblock.property_package();
        let orders = resolve_reaction_orders(ppack, config)?;
        let index = ppack.phase_list().product(ppack.component_list());
        let init = Initializer::Map(orders.into_iter().collect::<HashMap<_, _>>());

        let param = Param::build(
            registry,
            &format!("{}.reaction_order", rblock.name()),
            index,
            &init,
            Some("Reaction order"),
            None,
        )?;
        debug!(block = rblock.name(), entries = param.len(), "Built reaction order parameters");
        rblock.reaction_order = Some(param);
        Ok(())
    }

    fn return_expression(
        &self,
        registry: &mut Registry,
        state: &StateBlock,
        rblock: &ReactionBlock,
        r_idx: &IndexKey,
        _temperature: NodeId,
    ) -> Result<Relation, ReactionError> {
        let reaction_order = rblock.reaction_order()?;
        let params = state.params();
        let mut expr: Option<NodeId> = None;
        let mut n_terms = 0usize;

        for p in params.phase_list().labels() {
            for j in params.component_list().labels() {
                let key = IndexKey::pair(p.clone(), j.clone());
                // Zero-order pairs are left out of the product entirely.
                if reaction_order.value(registry, &key)? == 0.0 {
                    continue;
                }
                let base = state.mole_frac(p, j)?;
                let exponent = reaction_order.node(&key)?;
                let term = registry.pow(base, exponent);
                expr = Some(match expr {
                    None => term,
                    Some(prev) => registry.mul(prev, term),
                });
                n_terms += 1;
            }
        }

        let k_eq = rblock.k_eq_node(r_idx)?;
        if expr.is_none() {
            warn!(block = rblock.name(), reaction = %r_idx, "Every reaction order is zero; equilibrium relation has an empty right-hand side");
        }
        debug!(block = rblock.name(), reaction = %r_idx, n_terms, "Built equilibrium expression");
        Ok(Relation::equality(k_eq, expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{IndexSet, Label, VarLike};
    use crate::expression::product_factors;
    use crate::properties::{GenericPropertyPackage, PhaseSpec, PhaseType};
    use crate::reactions::PhaseComponentTable;
    use crate::store::{NodeKind, Operation};
    use rstest::rstest;
    use std::sync::Arc;

    /// Phases Liq (liquid) and Vap (solid), components A and B.
    fn package() -> Arc<GenericPropertyPackage> {
        Arc::new(
            GenericPropertyPackage::new(
                vec![
                    PhaseSpec { name: "Liq".into(), phase_type: PhaseType::Liquid },
                    PhaseSpec { name: "Vap".into(), phase_type: PhaseType::Solid },
                ],
                vec!["A".into(), "B".into()],
            )
            .unwrap(),
        )
    }

    fn stoichiometry() -> PhaseComponentTable {
        [("Liq", "A", -1.0), ("Liq", "B", 1.0)].into_iter().collect()
    }

    struct Fixture {
        reg: Registry,
        state: StateBlock,
        rblock: ReactionBlock,
        temperature: NodeId,
    }

    fn fixture() -> Fixture {
        let ppack = package();
        let mut reg = Registry::new();
        let state = StateBlock::build(&mut reg, "state", ppack.clone());
        let rblock = ReactionBlock::build(
            &mut reg,
            "rxn",
            ppack,
            IndexSet::from_labels(["R1"]),
            &Initializer::Value(1.0),
        )
        .unwrap();
        let temperature = reg.add_constant(298.15);
        Fixture { reg, state, rblock, temperature }
    }

    fn order_map(f: &Fixture) -> Vec<((String, String), f64)> {
        f.rblock
            .reaction_order()
            .unwrap()
            .values(&f.reg)
            .map(|(k, v)| ((k.labels()[0].to_string(), k.labels()[1].to_string()), v))
            .collect()
    }

    fn pair(p: &str, j: &str, v: f64) -> ((String, String), f64) {
        ((p.to_string(), j.to_string()), v)
    }

    /// (base name, exponent value) of every factor on the right-hand side.
    fn terms(reg: &Registry, rel: &Relation) -> Vec<(String, f64)> {
        let Some(rhs) = rel.rhs else { return vec![] };
        product_factors(reg, rhs)
            .into_iter()
            .map(|factor| {
                assert_eq!(reg.kind(factor), &NodeKind::Formula(Operation::Power));
                let parents = reg.get_parents(factor);
                (reg.name(parents[0]).to_string(), reg.param_value(parents[1]).unwrap())
            })
            .collect()
    }

    fn build_and_return(f: &mut Fixture, config: &ReactionConfig) -> Relation {
        MoleFracPowerLawEquil.build_parameters(&mut f.reg, &mut f.rblock, config).unwrap();
        MoleFracPowerLawEquil
            .return_expression(&mut f.reg, &f.state, &f.rblock, &IndexKey::single("R1"), f.temperature)
            .unwrap()
    }

    #[test]
    fn test_stoichiometric_defaults_exclude_solids() {
        let mut f = fixture();
        let config = ReactionConfig::default().with_stoichiometry(stoichiometry());
        let rel = build_and_return(&mut f, &config);

        assert_eq!(
            order_map(&f),
            vec![pair("Liq", "A", -1.0), pair("Liq", "B", 1.0), pair("Vap", "A", 0.0), pair("Vap", "B", 0.0)]
        );
        assert_eq!(f.reg.name(rel.lhs), "rxn.k_eq[R1]");
        assert_eq!(
            terms(&f.reg, &rel),
            vec![
                ("state.mole_frac_phase_comp[Liq,A]".to_string(), -1.0),
                ("state.mole_frac_phase_comp[Liq,B]".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn test_partial_override_table() {
        let mut f = fixture();
        let config = ReactionConfig::default()
            .with_stoichiometry(stoichiometry())
            .with_reaction_order([("Liq", "A", 2.0)].into_iter().collect());
        let rel = build_and_return(&mut f, &config);

        assert_eq!(
            order_map(&f),
            vec![pair("Liq", "A", 2.0), pair("Liq", "B", 0.0), pair("Vap", "A", 0.0), pair("Vap", "B", 0.0)]
        );
        assert_eq!(terms(&f.reg, &rel), vec![("state.mole_frac_phase_comp[Liq,A]".to_string(), 2.0)]);
    }

    #[test]
    fn test_overrides_apply_to_solid_phases() {
        let mut f = fixture();
        let config = ReactionConfig::default()
            .with_stoichiometry(stoichiometry())
            .with_reaction_order([("Vap", "B", 0.5)].into_iter().collect());
        let rel = build_and_return(&mut f, &config);

        assert_eq!(terms(&f.reg, &rel), vec![("state.mole_frac_phase_comp[Vap,B]".to_string(), 0.5)]);
    }

    #[rstest]
    #[case::liq_a("Liq", "A", -1.0)]
    #[case::liq_b("Liq", "B", 1.0)]
    #[case::solid_ignores_stoichiometry("Vap", "A", 0.0)]
    #[case::solid_ignores_stoichiometry_b("Vap", "B", 0.0)]
    fn test_resolution_without_overrides(#[case] p: &str, #[case] j: &str, #[case] expected: f64) {
        // Declare stoichiometry for the solid phase too: it must still resolve to 0.
        let mut stoich = stoichiometry();
        stoich.insert("Vap", "A", 3.0);
        stoich.insert("Vap", "B", -2.0);
        let config = ReactionConfig::default().with_stoichiometry(stoich);

        let orders = resolve_reaction_orders(package().as_ref(), &config).unwrap();
        let found = orders.iter().find(|(k, _)| *k == IndexKey::pair(p, j)).map(|(_, o)| *o);
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn test_every_pair_gets_exactly_one_entry() {
        let orders = resolve_reaction_orders(package().as_ref(), &ReactionConfig::default()).unwrap();
        let keys: Vec<IndexKey> = orders.iter().map(|(k, _)| k.clone()).collect();
        let expected: Vec<IndexKey> = package().phase_list().product(package().component_list()).iter().cloned().collect();
        assert_eq!(keys, expected);
        assert!(orders.iter().all(|(_, o)| *o == 0.0));
    }

    #[test]
    fn test_reaction_order_parameter_metadata() {
        let mut f = fixture();
        MoleFracPowerLawEquil
            .build_parameters(&mut f.reg, &mut f.rblock, &ReactionConfig::default())
            .unwrap();
        let param = f.rblock.reaction_order().unwrap();
        assert_eq!(param.name(), "rxn.reaction_order");
        assert_eq!(param.doc(), Some("Reaction order"));
        assert_eq!(param.unit(), None);
        assert_eq!(param.len(), 4);
    }

    #[test]
    fn test_expression_is_structurally_deterministic() {
        let config = ReactionConfig::default().with_reaction_order(
            [("Vap", "B", 1.0), ("Liq", "B", 3.0), ("Liq", "A", 1.0)].into_iter().collect(),
        );
        let mut first = fixture();
        let mut second = fixture();
        let a = build_and_return(&mut first, &config);
        let b = build_and_return(&mut second, &config);

        let ta = terms(&first.reg, &a);
        assert_eq!(ta, terms(&second.reg, &b));
        let bases: Vec<&str> = ta.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            bases,
            vec![
                "state.mole_frac_phase_comp[Liq,A]",
                "state.mole_frac_phase_comp[Liq,B]",
                "state.mole_frac_phase_comp[Vap,B]",
            ]
        );
    }

    #[test]
    fn test_value_of_the_relation() {
        let mut f = fixture();
        let config = ReactionConfig::default().with_stoichiometry(stoichiometry());
        let rel = build_and_return(&mut f, &config);

        let x = f.state.mole_frac_phase_comp();
        x.get(&IndexKey::pair("Liq", "A")).unwrap().set_value(&mut f.reg, 0.25).unwrap();
        x.get(&IndexKey::pair("Liq", "B")).unwrap().set_value(&mut f.reg, 0.5).unwrap();
        // k_eq = 1, rhs = 0.25^-1 * 0.5^1 = 2
        assert_eq!(rel.residual(&f.reg).unwrap(), Some(-1.0));
    }

    #[test]
    fn test_recalibrated_orders_flow_into_values() {
        let mut f = fixture();
        let config = ReactionConfig::default().with_stoichiometry(stoichiometry());
        let rel = build_and_return(&mut f, &config);

        let order = f.rblock.reaction_order().unwrap().clone();
        order.set_value(&mut f.reg, &IndexKey::pair("Liq", "B"), 2.0).unwrap();
        // x = 0.5 everywhere: 0.5^-1 * 0.5^2 = 0.5
        assert_eq!(rel.residual(&f.reg).unwrap(), Some(0.5));
    }

    #[test]
    fn test_all_zero_orders_give_a_degenerate_relation() {
        let mut f = fixture();
        let config = ReactionConfig::default().with_reaction_order(PhaseComponentTable::new());
        let rel = build_and_return(&mut f, &config);
        assert!(rel.is_degenerate());
        assert!(terms(&f.reg, &rel).is_empty());
    }

    #[test]
    fn test_expression_before_parameters_fails() {
        let mut f = fixture();
        let err = MoleFracPowerLawEquil
            .return_expression(&mut f.reg, &f.state, &f.rblock, &IndexKey::single("R1"), f.temperature)
            .unwrap_err();
        assert!(matches!(err, ReactionError::ParametersNotBuilt { ref block } if block == "rxn"));
    }

    #[test]
    fn test_unknown_reaction_index_propagates() {
        let mut f = fixture();
        MoleFracPowerLawEquil
            .build_parameters(&mut f.reg, &mut f.rblock, &ReactionConfig::default().with_stoichiometry(stoichiometry()))
            .unwrap();
        let err = MoleFracPowerLawEquil
            .return_expression(&mut f.reg, &f.state, &f.rblock, &IndexKey::single("R9"), f.temperature)
            .unwrap_err();
        assert!(matches!(err, ReactionError::Component(_)));
    }

    #[test]
    fn test_equilibrium_constraints_from_json_config() {
        let mut f = fixture();
        let config = ReactionConfig::from_json(
            r#"{
                "equilibrium_form": "mole_frac_power_law",
                "stoichiometry": { "Liq": { "A": -1, "B": 1 }, "Vap": { "A": 1 } }
            }"#,
        )
        .unwrap();
        let relations = f.rblock.equilibrium_constraints(&mut f.reg, &f.state, &config, f.temperature).unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].0, IndexKey::single("R1"));
        assert_eq!(terms(&f.reg, &relations[0].1).len(), 2);
    }

    #[test]
    fn test_solid_lookup_failure_propagates() {
        struct Broken {
            phases: IndexSet,
            comps: IndexSet,
        }
        impl PropertyPackage for Broken {
            fn phase_list(&self) -> &IndexSet { &self.phases }
            fn component_list(&self) -> &IndexSet { &self.comps }
            fn is_solid_phase(&self, phase: &Label) -> Result<bool, PropertyError> {
                Err(PropertyError::UnknownPhase(phase.clone()))
            }
        }
        let pkg = Broken { phases: IndexSet::from_labels(["Liq"]), comps: IndexSet::from_labels(["A"]) };

        // Stoichiometric inference needs the classification...
        assert!(resolve_reaction_orders(&pkg, &ReactionConfig::default()).is_err());
        // ...an override table does not.
        let config = ReactionConfig::default().with_reaction_order(PhaseComponentTable::new());
        assert!(resolve_reaction_orders(&pkg, &config).is_ok());
    }
}
