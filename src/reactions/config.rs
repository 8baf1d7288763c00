//! Per-reaction configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "equilibrium_form": "mole_frac_power_law",
//!   "stoichiometry": { "Liq": { "A": -1, "B": 1 } },
//!   "parameter_data": { "reaction_order": { "Liq": { "A": 2 } } }
//! }
//! ```

use super::equilibrium_forms::EquilibriumFormKind;
use super::ReactionError;
use crate::component::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Values keyed by phase, then component. Absent pairs are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseComponentTable(BTreeMap<Label, BTreeMap<Label, f64>>);

impl PhaseComponentTable {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, phase: &Label, component: &Label) -> Option<f64> {
        self.0.get(phase)?.get(component).copied()
    }

    pub fn insert(&mut self, phase: impl Into<Label>, component: impl Into<Label>, value: f64) -> Option<f64> {
        self.0.entry(phase.into()).or_default().insert(component.into(), value)
    }

    /// Number of (phase, component) entries.
    pub fn len(&self) -> usize { self.0.values().map(BTreeMap::len).sum() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<P: Into<Label>, C: Into<Label>> FromIterator<(P, C, f64)> for PhaseComponentTable {
    fn from_iter<I: IntoIterator<Item = (P, C, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (p, c, v) in iter {
            table.insert(p, c, v);
        }
        table
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterData {
    /// Explicit reaction orders. When present, stoichiometry is never used to
    /// infer orders, even for pairs the table leaves out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_order: Option<PhaseComponentTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    #[serde(default)]
    pub equilibrium_form: EquilibriumFormKind,
    #[serde(default)]
    pub stoichiometry: PhaseComponentTable,
    #[serde(default)]
    pub parameter_data: ParameterData,
}

impl ReactionConfig {
    pub fn from_json(json: &str) -> Result<Self, ReactionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_stoichiometry(mut self, stoichiometry: PhaseComponentTable) -> Self {
        self.stoichiometry = stoichiometry;
        self
    }

    pub fn with_reaction_order(mut self, orders: PhaseComponentTable) -> Self {
        self.parameter_data.reaction_order = Some(orders);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let cfg = ReactionConfig::from_json(
            r#"{
                "stoichiometry": { "Liq": { "A": -1, "B": 1 } },
                "parameter_data": { "reaction_order": { "Liq": { "A": 2 } } }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.equilibrium_form, EquilibriumFormKind::MoleFracPowerLaw);
        assert_eq!(cfg.stoichiometry.get(&"Liq".into(), &"A".into()), Some(-1.0));
        assert_eq!(cfg.stoichiometry.len(), 2);
        let orders = cfg.parameter_data.reaction_order.unwrap();
        assert_eq!(orders.get(&"Liq".into(), &"A".into()), Some(2.0));
        assert_eq!(orders.get(&"Liq".into(), &"B".into()), None);
    }

    #[test]
    fn test_missing_sections_default() {
        let cfg = ReactionConfig::from_json("{}").unwrap();
        assert!(cfg.stoichiometry.is_empty());
        assert!(cfg.parameter_data.reaction_order.is_none());
    }

    #[test]
    fn test_empty_override_table_is_still_present() {
        let cfg = ReactionConfig::from_json(r#"{"parameter_data": {"reaction_order": {}}}"#).unwrap();
        assert_eq!(cfg.parameter_data.reaction_order, Some(PhaseComponentTable::new()));
    }

    #[test]
    fn test_bad_json_is_a_config_error() {
        assert!(matches!(ReactionConfig::from_json("{\"stoichiometry\": 1}"), Err(ReactionError::Config(_))));
    }

    #[test]
    fn test_table_from_iter() {
        let t: PhaseComponentTable = [("Liq", "A", -1.0), ("Liq", "B", 1.0), ("Vap", "A", 0.5)].into_iter().collect();
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(&"Vap".into(), &"A".into()), Some(0.5));
    }
}
