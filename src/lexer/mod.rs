mod lexer;
mod preprocessor;
mod token;

pub use lexer::*;
pub use preprocessor::*;
pub use token::*;
