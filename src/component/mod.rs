//! Indexed model components: parameters, variables and the index sets they live on.
pub mod error;
pub mod index;
pub mod param;
pub mod var;

pub use error::{ComponentError, ErrorKind};
pub use index::{IndexKey, IndexSet, Label};
pub use param::{extract_data, Initializer, Param};
pub use var::{Var, VarData, VarLike};
