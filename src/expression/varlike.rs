//! Named expressions that can stand in for variables.
//!
//! A `VarLikeExpression` is addressed and queried like a variable, so generic
//! code written against `VarLike` can read its value, but every operation that
//! only makes sense on a decision variable (bounds, fixing, unfixing, direct
//! value assignment) fails with an error telling the user to write a
//! constraint instead.
//!
//! Three shapes exist, chosen by `VarLikeExpression::new` from the arguments:
//! - `Abstract`: unindexed, no initializer. A placeholder until `construct`
//!   supplies the body.
//! - `Scalar`: unindexed, with a body.
//! - `Indexed`: one record per index.

use crate::component::var::{evaluate_body, expression_is_fixed};
use crate::component::{ComponentError, IndexKey, IndexSet, VarLike};
use crate::store::{NodeId, Registry};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// What to store at one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprInit {
    Expr(NodeId),
    /// An entry with no body.
    Null,
    /// Create no entry for this index.
    Skip,
}

impl ExprInit {
    /// Synonym of `Skip` used by constraint-building rules.
    pub const NO_CONSTRAINT: ExprInit = ExprInit::Skip;
}

impl From<NodeId> for ExprInit {
    fn from(node: NodeId) -> Self { ExprInit::Expr(node) }
}

/// Bulk initialization applied at construction.
#[derive(Clone)]
pub enum ExprInitializer {
    /// The same body for every index.
    Single(ExprInit),
    /// Indices missing from the map get no entry.
    Map(HashMap<IndexKey, ExprInit>),
    /// Called once per index; may build new nodes.
    Rule(Rc<dyn Fn(&mut Registry, &IndexKey) -> ExprInit>),
}

impl ExprInitializer {
    pub fn rule(f: impl Fn(&mut Registry, &IndexKey) -> ExprInit + 'static) -> Self {
        ExprInitializer::Rule(Rc::new(f))
    }

    fn init_for(&self, registry: &mut Registry, key: &IndexKey) -> ExprInit {
        match self {
            ExprInitializer::Single(init) => *init,
            ExprInitializer::Map(map) => map.get(key).copied().unwrap_or(ExprInit::Skip),
            ExprInitializer::Rule(f) => f(registry, key),
        }
    }
}

impl fmt::Debug for ExprInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprInitializer::Single(i) => f.debug_tuple("Single").field(i).finish(),
            ExprInitializer::Map(m) => f.debug_tuple("Map").field(m).finish(),
            ExprInitializer::Rule(_) => f.write_str("Rule(..)"),
        }
    }
}

impl From<NodeId> for ExprInitializer {
    fn from(node: NodeId) -> Self { ExprInitializer::Single(ExprInit::Expr(node)) }
}

/// Construction arguments for `VarLikeExpression::new`.
#[derive(Debug, Clone, Default)]
pub struct VarLikeArgs {
    pub index_sets: Vec<IndexSet>,
    pub initialize: Option<ExprInitializer>,
}

impl VarLikeArgs {
    pub fn new() -> Self { Self::default() }

    pub fn over(mut self, index_set: IndexSet) -> Self {
        self.index_sets.push(index_set);
        self
    }

    pub fn initialize(mut self, init: impl Into<ExprInitializer>) -> Self {
        self.initialize = Some(init.into());
        self
    }

    fn is_scalar(&self) -> bool {
        match self.index_sets.as_slice() {
            [] => true,
            [only] => only.is_unindexed(),
            _ => false,
        }
    }
}

// --- Data Record ---

/// The record stored at one index. Its value is always computed from the body.
#[derive(Debug, Clone, PartialEq)]
pub struct VarLikeExpressionData {
    /// Name of the owning component; used for diagnostics only.
    component: String,
    index: IndexKey,
    body: Option<NodeId>,
}

impl VarLikeExpressionData {
    fn new(component: &str, index: IndexKey, body: Option<NodeId>) -> Self {
        Self { component: component.to_string(), index, body }
    }

    pub fn component_name(&self) -> &str { &self.component }
    pub fn index(&self) -> &IndexKey { &self.index }
    pub fn expr(&self) -> Option<NodeId> { self.body }

    /// Replaces the body.
    pub fn set_expr(&mut self, body: Option<NodeId>) { self.body = body; }

    /// Named expressions are never constant, whatever their body.
    pub fn is_constant(&self) -> bool { false }

    pub fn is_fixed(&self, registry: &Registry) -> bool {
        self.body.map_or(true, |node| expression_is_fixed(registry, node))
    }
}

impl VarLike for VarLikeExpressionData {
    fn name(&self) -> String { self.index.entry_name(&self.component) }

    fn value(&self, registry: &Registry) -> Result<Option<f64>, ComponentError> {
        evaluate_body(registry, self.body)
    }

    fn set_value(&self, _registry: &mut Registry, _value: f64) -> Result<(), ComponentError> {
        Err(ComponentError::CannotSetValue { name: self.name() })
    }

    fn setlb(&self, _registry: &mut Registry, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotBound { name: self.name(), plural: false })
    }

    fn setub(&self, _registry: &mut Registry, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotBound { name: self.name(), plural: false })
    }

    fn fix(&self, _registry: &mut Registry, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotFix { name: self.name(), plural: false })
    }

    fn unfix(&self, _registry: &mut Registry) -> Result<(), ComponentError> {
        Err(ComponentError::CannotUnfix { name: self.name() })
    }
}

// --- Scalar Shapes ---

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarVarLikeExpression {
    data: VarLikeExpressionData,
}

impl ScalarVarLikeExpression {
    fn new(name: &str, body: Option<NodeId>) -> Self {
        Self { data: VarLikeExpressionData::new(name, IndexKey::Unindexed, body) }
    }

    pub fn data(&self) -> &VarLikeExpressionData { &self.data }
    pub fn expr(&self) -> Option<NodeId> { self.data.expr() }
    pub fn set_expr(&mut self, body: Option<NodeId>) { self.data.set_expr(body) }
    pub fn is_constant(&self) -> bool { self.data.is_constant() }
    pub fn is_fixed(&self, registry: &Registry) -> bool { self.data.is_fixed(registry) }

    /// Sets the body. Only the `Unindexed` key is accepted and `Skip` is rejected.
    pub fn add(&mut self, index: &IndexKey, init: ExprInit) -> Result<&VarLikeExpressionData, ComponentError> {
        let body = check_scalar_add(self.data.component_name(), index, init)?;
        self.data.set_expr(body);
        Ok(&self.data)
    }
}

impl VarLike for ScalarVarLikeExpression {
    fn name(&self) -> String { self.data.name() }
    fn value(&self, registry: &Registry) -> Result<Option<f64>, ComponentError> { self.data.value(registry) }
    fn set_value(&self, registry: &mut Registry, value: f64) -> Result<(), ComponentError> {
        self.data.set_value(registry, value)
    }
    fn setlb(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        self.data.setlb(registry, value)
    }
    fn setub(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        self.data.setub(registry, value)
    }
    fn fix(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        self.data.fix(registry, value)
    }
    fn unfix(&self, registry: &mut Registry) -> Result<(), ComponentError> { self.data.unfix(registry) }
}

fn check_scalar_add(name: &str, index: &IndexKey, init: ExprInit) -> Result<Option<NodeId>, ComponentError> {
    if *index != IndexKey::Unindexed {
        return Err(ComponentError::InvalidIndex { name: name.to_string(), index: index.clone() });
    }
    match init {
        ExprInit::Skip => Err(ComponentError::SkipNotAllowed { name: name.to_string() }),
        ExprInit::Null => Ok(None),
        ExprInit::Expr(node) => Ok(Some(node)),
    }
}

/// An unindexed expression whose body has not been supplied yet.
///
/// Every operation that reads or writes the body fails with
/// `ComponentError::NotConstructed` until `construct` is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractScalarVarLikeExpression {
    name: String,
}

impl AbstractScalarVarLikeExpression {
    fn not_constructed(&self, operation: &'static str) -> ComponentError {
        ComponentError::NotConstructed { name: self.name.clone(), operation }
    }

    pub fn expr(&self) -> Result<Option<NodeId>, ComponentError> { Err(self.not_constructed("expr")) }

    pub fn set_expr(&mut self, _body: Option<NodeId>) -> Result<(), ComponentError> {
        Err(self.not_constructed("set_value"))
    }

    pub fn is_constant(&self) -> Result<bool, ComponentError> { Err(self.not_constructed("is_constant")) }

    pub fn is_fixed(&self, _registry: &Registry) -> Result<bool, ComponentError> {
        Err(self.not_constructed("is_fixed"))
    }

    /// Index and sentinel are validated as for a scalar; assignment itself is disabled.
    pub fn add(&mut self, index: &IndexKey, init: ExprInit) -> Result<(), ComponentError> {
        check_scalar_add(&self.name, index, init)?;
        Err(self.not_constructed("set_value"))
    }

    /// The deferred build step.
    pub fn construct(self, body: Option<NodeId>) -> ScalarVarLikeExpression {
        debug!(component = %self.name, has_body = body.is_some(), "Constructing abstract var-like expression");
        ScalarVarLikeExpression::new(&self.name, body)
    }
}

impl VarLike for AbstractScalarVarLikeExpression {
    fn name(&self) -> String { self.name.clone() }

    fn value(&self, _registry: &Registry) -> Result<Option<f64>, ComponentError> {
        Err(self.not_constructed("value"))
    }

    fn set_value(&self, _registry: &mut Registry, _value: f64) -> Result<(), ComponentError> {
        Err(ComponentError::CannotSetValue { name: self.name.clone() })
    }

    fn setlb(&self, _registry: &mut Registry, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotBound { name: self.name.clone(), plural: false })
    }

    fn setub(&self, _registry: &mut Registry, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotBound { name: self.name.clone(), plural: false })
    }

    fn fix(&self, _registry: &mut Registry, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotFix { name: self.name.clone(), plural: false })
    }

    fn unfix(&self, _registry: &mut Registry) -> Result<(), ComponentError> {
        Err(ComponentError::CannotUnfix { name: self.name.clone() })
    }
}

// --- Indexed Shape ---

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedVarLikeExpression {
    name: String,
    index_set: IndexSet,
    data: HashMap<IndexKey, VarLikeExpressionData>,
    // Insertion order of `data`.
    order: Vec<IndexKey>,
}

impl IndexedVarLikeExpression {
    fn new(name: &str, index_set: IndexSet) -> Self {
        Self { name: name.to_string(), index_set, data: HashMap::new(), order: Vec::new() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn index_set(&self) -> &IndexSet { &self.index_set }
    pub fn len(&self) -> usize { self.data.len() }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }
    pub fn contains(&self, index: &IndexKey) -> bool { self.data.contains_key(index) }

    /// Keys of the stored entries, in the order they were first added.
    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> { self.order.iter() }

    /// Creates or replaces the entry at `index`; `Skip` creates nothing.
    ///
    /// The key is not checked against the declared index set: entries outside
    /// it are accepted.
    pub fn add(&mut self, index: IndexKey, init: ExprInit) -> Option<&VarLikeExpressionData> {
        let body = match init {
            ExprInit::Skip => {
                trace!(component = %self.name, %index, "Skipping entry");
                return None;
            }
            ExprInit::Null => None,
            ExprInit::Expr(node) => Some(node),
        };
        if !self.data.contains_key(&index) {
            self.order.push(index.clone());
        }
        let record = VarLikeExpressionData::new(&self.name, index.clone(), body);
        self.data.insert(index.clone(), record);
        self.data.get(&index)
    }

    pub fn get(&self, index: &IndexKey) -> Result<&VarLikeExpressionData, ComponentError> {
        self.data.get(index).ok_or_else(|| ComponentError::UnknownIndex {
            name: self.name.clone(),
            index: index.clone(),
        })
    }

    pub fn get_mut(&mut self, index: &IndexKey) -> Result<&mut VarLikeExpressionData, ComponentError> {
        let name = &self.name;
        self.data.get_mut(index).ok_or_else(|| ComponentError::UnknownIndex {
            name: name.clone(),
            index: index.clone(),
        })
    }

    pub fn value(&self, registry: &Registry, index: &IndexKey) -> Result<Option<f64>, ComponentError> {
        self.get(index)?.value(registry)
    }

    pub fn set_value(&self, _value: f64) -> Result<(), ComponentError> {
        Err(ComponentError::CannotSetValue { name: self.name.clone() })
    }

    pub fn setlb(&self, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotBound { name: self.name.clone(), plural: true })
    }

    pub fn setub(&self, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotBound { name: self.name.clone(), plural: true })
    }

    pub fn fix(&self, _value: Option<f64>) -> Result<(), ComponentError> {
        Err(ComponentError::CannotFix { name: self.name.clone(), plural: true })
    }

    pub fn unfix(&self) -> Result<(), ComponentError> {
        Err(ComponentError::CannotUnfix { name: self.name.clone() })
    }
}

// --- Factory ---

#[derive(Debug, Clone, PartialEq)]
pub enum VarLikeExpression {
    Abstract(AbstractScalarVarLikeExpression),
    Scalar(ScalarVarLikeExpression),
    Indexed(IndexedVarLikeExpression),
}

impl VarLikeExpression {
    /// Picks the shape from the arguments.
    ///
    /// No index set, or only the trivial unindexed set, gives a scalar: `Abstract`
    /// without an initializer, `Scalar` with one. Anything else gives `Indexed`
    /// over the product of the supplied sets.
    pub fn new(registry: &mut Registry, name: &str, args: VarLikeArgs) -> Result<Self, ComponentError> {
        if args.is_scalar() {
            let Some(init) = args.initialize else {
                debug!(component = %name, "Creating abstract var-like expression");
                return Ok(VarLikeExpression::Abstract(AbstractScalarVarLikeExpression { name: name.to_string() }));
            };
            let first = match &init {
                ExprInitializer::Map(map) => *map.get(&IndexKey::Unindexed).ok_or_else(|| {
                    ComponentError::MissingData { name: name.to_string(), index: IndexKey::Unindexed }
                })?,
                _ => init.init_for(registry, &IndexKey::Unindexed),
            };
            let body = check_scalar_add(name, &IndexKey::Unindexed, first)?;
            debug!(component = %name, "Creating scalar var-like expression");
            return Ok(VarLikeExpression::Scalar(ScalarVarLikeExpression::new(name, body)));
        }

        let mut sets = args.index_sets.into_iter();
        let first = sets.next().unwrap_or_else(IndexSet::unindexed);
        let index_set = sets.fold(first, |acc, s| acc.product(&s));

        let mut indexed = IndexedVarLikeExpression::new(name, index_set.clone());
        let init = args.initialize.unwrap_or(ExprInitializer::Single(ExprInit::Null));
        for key in &index_set {
            let entry = init.init_for(registry, key);
            indexed.add(key.clone(), entry);
        }
        debug!(component = %name, entries = indexed.len(), "Creating indexed var-like expression");
        Ok(VarLikeExpression::Indexed(indexed))
    }

    pub fn name(&self) -> String {
        match self {
            VarLikeExpression::Abstract(e) => e.name.clone(),
            VarLikeExpression::Scalar(e) => e.name(),
            VarLikeExpression::Indexed(e) => e.name.clone(),
        }
    }

    pub fn is_indexed(&self) -> bool { matches!(self, VarLikeExpression::Indexed(_)) }
    pub fn is_constructed(&self) -> bool { !matches!(self, VarLikeExpression::Abstract(_)) }

    /// Runs the deferred build step of an abstract scalar. Constructed shapes are left untouched.
    pub fn construct(&mut self, body: Option<NodeId>) {
        if let VarLikeExpression::Abstract(e) = self {
            let abstract_expr = AbstractScalarVarLikeExpression { name: std::mem::take(&mut e.name) };
            *self = VarLikeExpression::Scalar(abstract_expr.construct(body));
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarVarLikeExpression> {
        match self {
            VarLikeExpression::Scalar(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_scalar_mut(&mut self) -> Option<&mut ScalarVarLikeExpression> {
        match self {
            VarLikeExpression::Scalar(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_indexed(&self) -> Option<&IndexedVarLikeExpression> {
        match self {
            VarLikeExpression::Indexed(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_indexed_mut(&mut self) -> Option<&mut IndexedVarLikeExpression> {
        match self {
            VarLikeExpression::Indexed(e) => Some(e),
            _ => None,
        }
    }

    /// Body of a scalar, or of the entry at `index` of an indexed expression.
    pub fn expr(&self, index: &IndexKey) -> Result<Option<NodeId>, ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.expr(),
            VarLikeExpression::Scalar(e) => match index {
                IndexKey::Unindexed => Ok(e.expr()),
                other => Err(ComponentError::InvalidIndex { name: e.name(), index: other.clone() }),
            },
            VarLikeExpression::Indexed(e) => Ok(e.get(index)?.expr()),
        }
    }

    pub fn value(&self, registry: &Registry, index: &IndexKey) -> Result<Option<f64>, ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.value(registry),
            VarLikeExpression::Scalar(e) => match index {
                IndexKey::Unindexed => e.value(registry),
                other => Err(ComponentError::InvalidIndex { name: e.name(), index: other.clone() }),
            },
            VarLikeExpression::Indexed(e) => e.value(registry, index),
        }
    }

    /// Replaces the body of a scalar, or of the existing entry at `index`.
    pub fn set_expr(&mut self, index: &IndexKey, body: Option<NodeId>) -> Result<(), ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.set_expr(body),
            VarLikeExpression::Scalar(e) => match index {
                IndexKey::Unindexed => {
                    e.set_expr(body);
                    Ok(())
                }
                other => Err(ComponentError::InvalidIndex { name: e.name(), index: other.clone() }),
            },
            VarLikeExpression::Indexed(e) => {
                e.get_mut(index)?.set_expr(body);
                Ok(())
            }
        }
    }

    pub fn is_constant(&self) -> Result<bool, ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.is_constant(),
            VarLikeExpression::Scalar(e) => Ok(e.is_constant()),
            VarLikeExpression::Indexed(_) => Ok(false),
        }
    }

    pub fn is_fixed(&self, registry: &Registry, index: &IndexKey) -> Result<bool, ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.is_fixed(registry),
            VarLikeExpression::Scalar(e) => match index {
                IndexKey::Unindexed => Ok(e.is_fixed(registry)),
                other => Err(ComponentError::InvalidIndex { name: e.name(), index: other.clone() }),
            },
            VarLikeExpression::Indexed(e) => Ok(e.get(index)?.is_fixed(registry)),
        }
    }

    // --- Variable-only operations; always rejected ---

    pub fn set_value(&self, registry: &mut Registry, value: f64) -> Result<(), ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.set_value(registry, value),
            VarLikeExpression::Scalar(e) => e.set_value(registry, value),
            VarLikeExpression::Indexed(e) => e.set_value(value),
        }
    }

    pub fn setlb(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.setlb(registry, value),
            VarLikeExpression::Scalar(e) => e.setlb(registry, value),
            VarLikeExpression::Indexed(e) => e.setlb(value),
        }
    }

    pub fn setub(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.setub(registry, value),
            VarLikeExpression::Scalar(e) => e.setub(registry, value),
            VarLikeExpression::Indexed(e) => e.setub(value),
        }
    }

    pub fn fix(&self, registry: &mut Registry, value: Option<f64>) -> Result<(), ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.fix(registry, value),
            VarLikeExpression::Scalar(e) => e.fix(registry, value),
            VarLikeExpression::Indexed(e) => e.fix(value),
        }
    }

    pub fn unfix(&self, registry: &mut Registry) -> Result<(), ComponentError> {
        match self {
            VarLikeExpression::Abstract(e) => e.unfix(registry),
            VarLikeExpression::Scalar(e) => e.unfix(registry),
            VarLikeExpression::Indexed(e) => e.unfix(),
        }
    }
}
