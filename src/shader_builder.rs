//! Fallback path that hands GLSL text to the GL driver's own compiler.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::ShaderStage;

#[derive(Debug, Error)]
pub enum ShaderBuilderError {
    #[error("Cannot read shader resource {path}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Compilation failure in {stage} shader:\n{log}")]
    Compilation { stage: &'static str, log: String },

    #[error("Linking failure in shader:\n{log}")]
    Link { log: String },
}

/// The parts of a GL context the builder needs. Failures carry the driver's info log.
pub trait GlDriver {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<u32, String>;
    fn delete_shader(&mut self, shader: u32);
    fn create_program(&mut self) -> u32;
    fn attach_shader(&mut self, program: u32, shader: u32);
    fn detach_shader(&mut self, program: u32, shader: u32);
    fn link_program(&mut self, program: u32) -> Result<(), String>;
    fn delete_program(&mut self, program: u32);
}

fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShaderBuilder {
    resource_base_path: Option<PathBuf>,
    vertex_preamble: Option<String>,
    fragment_preamble: Option<String>,
    version: u32,
    defines: Vec<(String, String)>,
}

impl ShaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_resource_base_path(&mut self, path: impl Into<PathBuf>) {
        self.resource_base_path = Some(path.into());
    }

    pub fn set_vertex_preamble(&mut self, file: &str) {
        self.vertex_preamble = Some(file.to_string());
    }

    pub fn set_fragment_preamble(&mut self, file: &str) {
        self.fragment_preamble = Some(file.to_string());
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn add_define(&mut self, name: &str, value: &str) {
        if name.is_empty() || value.is_empty() {
            warn!("ignoring define with an empty name or value: {:?}={:?}", name, value);
            return;
        }
        self.defines.push((name.to_string(), value.to_string()));
    }

    fn read_resource(&self, file: &str) -> Result<String, ShaderBuilderError> {
        let path = match &self.resource_base_path {
            Some(base) => base.join(file),
            None => Path::new(file).to_path_buf(),
        };
        fs::read_to_string(&path).map_err(|source| ShaderBuilderError::Resource { path, source })
    }

    /// Full text of a stage: version, defines, preamble, then the body in `file`.
    pub fn assemble_source(
        &self,
        stage: ShaderStage,
        file: &str,
    ) -> Result<String, ShaderBuilderError> {
        let mut code = String::new();

        if self.version > 0 {
            code.push_str(&format!("#version {}\n\n", self.version));
        }
        for (name, value) in &self.defines {
            code.push_str(&format!("#define {} {}\n", name, value));
        }
        if !self.defines.is_empty() {
            code.push('\n');
        }

        let preamble = match stage {
            ShaderStage::Vertex => &self.vertex_preamble,
            ShaderStage::Fragment => &self.fragment_preamble,
        };
        if let Some(preamble) = preamble {
            code.push_str(&self.read_resource(preamble)?);
        }
        code.push('\n');
        code.push_str(&self.read_resource(file)?);

        Ok(code)
    }

    fn compile_stage(
        &self,
        driver: &mut impl GlDriver,
        stage: ShaderStage,
        file: &str,
    ) -> Result<u32, ShaderBuilderError> {
        let source = self.assemble_source(stage, file)?;
        debug!("compiling {} shader from {}:\n{}", stage_name(stage), file, source);
        driver
            .compile_shader(stage, &source)
            .map_err(|log| ShaderBuilderError::Compilation {
                stage: stage_name(stage),
                log,
            })
    }

    /// Compiles and links a program. Shader objects are released whatever happens.
    pub fn create_program(
        &self,
        driver: &mut impl GlDriver,
        vertex: &str,
        fragment: &str,
    ) -> Result<u32, ShaderBuilderError> {
        let vertex_id = self.compile_stage(driver, ShaderStage::Vertex, vertex)?;
        let fragment_id = match self.compile_stage(driver, ShaderStage::Fragment, fragment) {
            Ok(id) => id,
            Err(e) => {
                driver.delete_shader(vertex_id);
                return Err(e);
            }
        };

        let program = driver.create_program();
        driver.attach_shader(program, vertex_id);
        driver.attach_shader(program, fragment_id);
        let linked = driver.link_program(program);

        for shader in [vertex_id, fragment_id] {
            driver.detach_shader(program, shader);
            driver.delete_shader(shader);
        }

        match linked {
            Ok(()) => Ok(program),
            Err(log) => {
                driver.delete_program(program);
                Err(ShaderBuilderError::Link { log })
            }
        }
    }
}
