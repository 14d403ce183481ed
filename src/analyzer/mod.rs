mod constructor;
mod function;
mod scope;
mod ty;
mod value;
mod variable;

pub use constructor::*;
pub use function::*;
pub use scope::*;
pub use ty::*;
pub use value::*;
pub use variable::*;
