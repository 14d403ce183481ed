pub mod analyzer;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod shader_builder;

use log::{debug, info};

pub use codegen::ShaderStage;
use error::Diagnostics;
use lexer::Preprocessor;
use parser::Program;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    pub stage: ShaderStage,
    /// Language version, available to the source as `__VERSION__`.
    pub version: u32,
    /// Macros defined before the source is read, in order.
    pub defines: Vec<(String, String)>,
    /// Processed before the source, sharing its macros.
    pub preamble: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            stage: ShaderStage::default(),
            version: 450,
            defines: vec![],
            preamble: None,
        }
    }
}

/// Parses and checks `source`. Fails with every diagnostic found.
pub fn parse(source: &str, options: &CompileOptions) -> Result<Program, Diagnostics> {
    let mut defines = vec![("__VERSION__".to_string(), options.version.to_string())];
    defines.extend(options.defines.iter().cloned());

    let mut stream = Preprocessor::with_options(source, &defines, options.preamble.as_deref());
    let program = Program::parse(&mut stream);
    if let Some(version) = stream.version() {
        debug!("source requests version {}", version);
    }

    if stream.has_errors() {
        let diagnostics = Diagnostics(stream.take_diagnostics());
        info!("{} diagnostics", diagnostics.len());
        return Err(diagnostics);
    }
    Ok(program)
}

/// Compiles `source` into the words of a SPIR-V module.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Vec<u32>, Diagnostics> {
    let program = parse(source, options)?;
    let words = program.write_spv(options.stage);
    debug!("emitted {} words", words.len());
    Ok(words)
}
