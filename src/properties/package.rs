use super::{PropertyError, PropertyPackage};
use crate::component::{IndexKey, IndexSet, Label};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    Liquid,
    Vapor,
    Solid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub name: Label,
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PackageConfig {
    phases: Vec<PhaseSpec>,
    components: Vec<Label>,
}

/// A property package defined entirely by configuration.
///
/// ```json
/// { "phases": [{ "name": "Liq", "type": "liquid" }, { "name": "Sol", "type": "solid" }],
///   "components": ["A", "B"] }
/// ```
#[derive(Debug, Clone)]
pub struct GenericPropertyPackage {
    phases: IndexSet,
    components: IndexSet,
    phase_types: HashMap<Label, PhaseType>,
}

impl GenericPropertyPackage {
    pub fn new(phases: Vec<PhaseSpec>, components: Vec<Label>) -> Result<Self, PropertyError> {
        let mut phase_set = IndexSet::new();
        let mut phase_types = HashMap::with_capacity(phases.len());
        for spec in phases {
            if !phase_set.insert(IndexKey::single(spec.name.clone())) {
                return Err(PropertyError::DuplicateMember(spec.name));
            }
            phase_types.insert(spec.name, spec.phase_type);
        }

        let mut component_set = IndexSet::new();
        for comp in components {
            if !component_set.insert(IndexKey::single(comp.clone())) {
                return Err(PropertyError::DuplicateMember(comp));
            }
        }

        Ok(Self { phases: phase_set, components: component_set, phase_types })
    }

    pub fn from_json(json: &str) -> Result<Self, PropertyError> {
        let config: PackageConfig = serde_json::from_str(json)?;
        Self::new(config.phases, config.components)
    }

    pub fn phase_type(&self, phase: &Label) -> Result<PhaseType, PropertyError> {
        self.phase_types
            .get(phase)
            .copied()
            .ok_or_else(|| PropertyError::UnknownPhase(phase.clone()))
    }
}

impl PropertyPackage for GenericPropertyPackage {
    fn phase_list(&self) -> &IndexSet { &self.phases }
    fn component_list(&self) -> &IndexSet { &self.components }

    fn is_solid_phase(&self, phase: &Label) -> Result<bool, PropertyError> {
        Ok(self.phase_type(phase)? == PhaseType::Solid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "phases": [{ "name": "Liq", "type": "liquid" }, { "name": "Vap", "type": "vapor" }, { "name": "Sol", "type": "solid" }],
        "components": ["H2O", "NaCl"]
    }"#;

    #[test]
    fn test_from_json_preserves_order() {
        let pkg = GenericPropertyPackage::from_json(CONFIG).unwrap();
        let phases: Vec<&str> = pkg.phase_list().labels().map(Label::as_str).collect();
        let comps: Vec<&str> = pkg.component_list().labels().map(Label::as_str).collect();
        assert_eq!(phases, vec!["Liq", "Vap", "Sol"]);
        assert_eq!(comps, vec!["H2O", "NaCl"]);
    }

    #[test]
    fn test_solid_classification() {
        let pkg = GenericPropertyPackage::from_json(CONFIG).unwrap();
        assert!(!pkg.is_solid_phase(&Label::from("Liq")).unwrap());
        assert!(pkg.is_solid_phase(&Label::from("Sol")).unwrap());
        assert!(matches!(pkg.is_solid_phase(&Label::from("Gas")), Err(PropertyError::UnknownPhase(_))));
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(GenericPropertyPackage::from_json("{\"phases\": 3}"), Err(PropertyError::Config(_))));
        let dup = r#"{"phases": [{"name": "Liq", "type": "liquid"}], "components": ["A", "A"]}"#;
        assert!(matches!(GenericPropertyPackage::from_json(dup), Err(PropertyError::DuplicateMember(_))));
    }
}
