use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use clap_stdin::FileOrStdin;
use log::info;
use thiserror::Error;

use slspv::error::Diagnostics;
use slspv::{CompileOptions, ShaderStage};

#[derive(Parser)]
#[command(name = "slspv")]
#[command(about = "Compiles a GLSL-like shading language to SPIR-V", long_about = None)]
struct Cli {
    /// Shader source, or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: FileOrStdin,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ShaderStage::Fragment)]
    stage: ShaderStage,

    /// Define a macro before the source is read
    #[arg(short = 'D', value_name = "NAME=VALUE", value_parser = parse_define)]
    defines: Vec<(String, String)>,

    /// File processed before the source
    #[arg(long, value_name = "FILE")]
    preamble: Option<PathBuf>,

    #[arg(long, default_value_t = 450)]
    version: u32,

    /// Print the parsed program instead of compiling it
    #[arg(long)]
    print: bool,
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot read input: {0}")]
    Input(#[from] clap_stdin::StdinError),

    #[error("{0}")]
    Compilation(#[from] Diagnostics),
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    let (name, value) = s.split_once('=').unwrap_or((s, "1"));
    if name.is_empty() {
        return Err(format!("invalid define \"{}\"", s));
    }
    Ok((name.to_string(), value.to_string()))
}

fn run(cli: Cli) -> Result<(), DriverError> {
    let source = cli.input.contents()?;
    let preamble = cli.preamble.map(fs::read_to_string).transpose()?;
    let options = CompileOptions {
        stage: cli.stage,
        version: cli.version,
        defines: cli.defines,
        preamble,
    };

    let bytes = if cli.print {
        slspv::parse(&source, &options)?.print().into_bytes()
    } else {
        let words = slspv::compile(&source, &options)?;
        info!("compiled {} words", words.len());
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    };

    match cli.output {
        Some(path) => fs::write(path, bytes)?,
        None => io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines() {
        assert_eq!(parse_define("A=2"), Ok(("A".to_string(), "2".to_string())));
        assert_eq!(parse_define("A"), Ok(("A".to_string(), "1".to_string())));
        assert!(parse_define("=2").is_err());
    }
}
