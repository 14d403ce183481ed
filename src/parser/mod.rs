mod decorations;
mod expr;
mod node;
mod operators;
mod printer;
mod program;
mod types;

pub use decorations::*;
pub use expr::*;
pub use node::Node;
pub use operators::*;
pub use printer::*;
pub use program::*;
pub use types::*;
