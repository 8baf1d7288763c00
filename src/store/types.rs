use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
}

/// Physical unit attached to a parameter or variable. `None` on the metadata
/// means the quantity is dimensionless / carries no units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub name: String,
    pub unit: Option<Unit>,
    pub doc: Option<String>,
}

impl NodeMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    /// `parents[0] ** parents[1]`
    Power,
    Negate,
}

impl Operation {
    pub fn arity(&self) -> usize {
        match self {
            Operation::Negate => 1,
            _ => 2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Power => "**",
            Operation::Negate => "-",
        }
    }
}

/// State of a decision variable. Lives in a side table of the registry so
/// `NodeKind` stays small.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarState {
    pub value: Option<f64>,
    pub lb: Option<f64>,
    pub ub: Option<f64>,
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Literal number baked into an expression.
    Constant(f64),
    /// Mutable model parameter. The value may be recalibrated after build.
    Param(f64),
    /// Index into `var_states`.
    Variable(u32),
    Formula(Operation),
}
