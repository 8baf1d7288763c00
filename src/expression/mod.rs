//! Expression containers and relations built on top of the node registry.
pub mod relation;
pub mod varlike;

pub use relation::{product_factors, Relation};
pub use varlike::{
    AbstractScalarVarLikeExpression, ExprInit, ExprInitializer, IndexedVarLikeExpression,
    ScalarVarLikeExpression, VarLikeArgs, VarLikeExpression, VarLikeExpressionData,
};
