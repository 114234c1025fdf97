//! Syntax tree of a single TL declaration.

mod category;
mod definition;
mod generic;
mod param;
mod ty;

pub use category::Category;
pub use definition::Definition;
pub use generic::Generic;
pub use param::{Flag, Parameter, ParameterType};
pub use ty::Type;
