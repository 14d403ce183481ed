mod expr;
mod program;
mod writer;

pub use writer::*;

/// Pipeline stage the entry point is compiled for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ShaderStage {
    Vertex,
    #[default]
    Fragment,
}
