//! Indexed numeric parameter containers and their initializers.

use super::error::ComponentError;
use super::index::{IndexKey, IndexSet};
use crate::store::{NodeId, NodeMetadata, Registry, Unit};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// How the entries of a component get their initial values.
#[derive(Clone, Default)]
pub enum Initializer {
    /// No initial value.
    #[default]
    Empty,
    /// The same value for every index.
    Value(f64),
    /// Explicit values; indices absent from the map get no value.
    Map(HashMap<IndexKey, f64>),
    /// Called once per index.
    Rule(Rc<dyn Fn(&IndexKey) -> Option<f64>>),
}

impl Initializer {
    pub fn rule(f: impl Fn(&IndexKey) -> Option<f64> + 'static) -> Self {
        Initializer::Rule(Rc::new(f))
    }

    pub fn value_for(&self, key: &IndexKey) -> Option<f64> {
        match self {
            Initializer::Empty => None,
            Initializer::Value(v) => Some(*v),
            Initializer::Map(map) => map.get(key).copied(),
            Initializer::Rule(f) => f(key),
        }
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Initializer::Empty => f.write_str("Empty"),
            Initializer::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Initializer::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Initializer::Rule(_) => f.write_str("Rule(..)"),
        }
    }
}

impl From<HashMap<IndexKey, f64>> for Initializer {
    fn from(map: HashMap<IndexKey, f64>) -> Self { Initializer::Map(map) }
}

/// Builds a rule that reads each index's value out of a larger data table,
/// so a parameter can be initialized from a subset of a database.
pub fn extract_data<I>(data: I) -> Initializer
where
    I: IntoIterator<Item = (IndexKey, f64)>,
{
    let table: HashMap<IndexKey, f64> = data.into_iter().collect();
    Initializer::rule(move |key| table.get(key).copied())
}

/// A named, indexed parameter. Every entry is a `Param` node in the registry,
/// so expressions that use it pick up later recalibrations.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    index_set: IndexSet,
    entries: HashMap<IndexKey, NodeId>,
    doc: Option<String>,
    unit: Option<Unit>,
}

impl Param {
    /// Creates one registry node per index. Every index must receive a value.
    pub fn build(
        registry: &mut Registry,
        name: &str,
        index_set: IndexSet,
        init: &Initializer,
        doc: Option<&str>,
        unit: Option<Unit>,
    ) -> Result<Self, ComponentError> {
        let mut entries = HashMap::with_capacity(index_set.len());
        for key in &index_set {
            let value = init.value_for(key).ok_or_else(|| ComponentError::MissingData {
                name: name.to_string(),
                index: key.clone(),
            })?;
            let meta = NodeMetadata {
                name: key.entry_name(name),
                unit: unit.clone(),
                doc: doc.map(str::to_string),
            };
            entries.insert(key.clone(), registry.add_param(value, meta));
        }
        Ok(Self {
            name: name.to_string(),
            index_set,
            entries,
            doc: doc.map(str::to_string),
            unit,
        })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn index_set(&self) -> &IndexSet { &self.index_set }
    pub fn doc(&self) -> Option<&str> { self.doc.as_deref() }
    pub fn unit(&self) -> Option<&Unit> { self.unit.as_ref() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn node(&self, key: &IndexKey) -> Result<NodeId, ComponentError> {
        self.entries.get(key).copied().ok_or_else(|| ComponentError::UnknownIndex {
            name: self.name.clone(),
            index: key.clone(),
        })
    }

    pub fn value(&self, registry: &Registry, key: &IndexKey) -> Result<f64, ComponentError> {
        let node = self.node(key)?;
        registry.param_value(node).ok_or_else(|| ComponentError::UnknownIndex {
            name: self.name.clone(),
            index: key.clone(),
        })
    }

    /// Recalibrates a single entry.
    pub fn set_value(&self, registry: &mut Registry, key: &IndexKey, value: f64) -> Result<(), ComponentError> {
        let node = self.node(key)?;
        registry.set_param_value(node, value).map_err(|_| ComponentError::UnknownIndex {
            name: self.name.clone(),
            index: key.clone(),
        })
    }

    /// `(key, value)` pairs in index-set order.
    pub fn values<'a>(&'a self, registry: &'a Registry) -> impl Iterator<Item = (&'a IndexKey, f64)> + 'a {
        self.index_set.iter().filter_map(move |key| {
            let node = self.entries.get(key)?;
            Some((key, registry.param_value(*node)?))
        })
    }
}
