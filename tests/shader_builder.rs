use std::fs;
use std::path::PathBuf;

use slspv::shader_builder::{GlDriver, ShaderBuilder, ShaderBuilderError};
use slspv::ShaderStage;

#[derive(Debug, PartialEq, Eq)]
enum Call {
    Compile(ShaderStage),
    DeleteShader(u32),
    CreateProgram,
    Attach(u32),
    Detach(u32),
    Link,
    DeleteProgram,
}

/// Records every call and fails where it is told to.
#[derive(Default)]
struct MockDriver {
    calls: Vec<Call>,
    sources: Vec<String>,
    fail_fragment: bool,
    fail_link: bool,
    next_id: u32,
}

impl GlDriver for MockDriver {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        self.calls.push(Call::Compile(stage));
        self.sources.push(source.to_string());
        if self.fail_fragment && stage == ShaderStage::Fragment {
            return Err("0:1: syntax error".to_string());
        }
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn delete_shader(&mut self, shader: u32) {
        self.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&mut self) -> u32 {
        self.calls.push(Call::CreateProgram);
        100
    }

    fn attach_shader(&mut self, _program: u32, shader: u32) {
        self.calls.push(Call::Attach(shader));
    }

    fn detach_shader(&mut self, _program: u32, shader: u32) {
        self.calls.push(Call::Detach(shader));
    }

    fn link_program(&mut self, _program: u32) -> Result<(), String> {
        self.calls.push(Call::Link);
        if self.fail_link {
            return Err("unresolved symbol".to_string());
        }
        Ok(())
    }

    fn delete_program(&mut self, _program: u32) {
        self.calls.push(Call::DeleteProgram);
    }
}

/// A fresh directory holding the shader files every test reads.
fn resources(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slspv-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("preamble.vs.glsl"), "in vec2 aPosition;").unwrap();
    fs::write(dir.join("preamble.fs.glsl"), "out vec4 outColor;").unwrap();
    fs::write(dir.join("blit.vs.glsl"), "void main() {}").unwrap();
    fs::write(dir.join("blit.fs.glsl"), "void main() { outColor = vec4(1); }").unwrap();
    dir
}

fn builder(dir: PathBuf) -> ShaderBuilder {
    let mut builder = ShaderBuilder::new();
    builder.set_resource_base_path(dir);
    builder.set_vertex_preamble("preamble.vs.glsl");
    builder.set_fragment_preamble("preamble.fs.glsl");
    builder.set_version(150);
    builder
}

#[test]
fn source_layout() {
    let mut builder = builder(resources("layout"));
    builder.add_define("GSK_GL3", "1");
    builder.add_define("", "1");
    builder.add_define("GSK_LEGACY", "");

    let source = builder
        .assemble_source(ShaderStage::Fragment, "blit.fs.glsl")
        .unwrap();
    assert_eq!(
        source,
        "#version 150\n\n\
         #define GSK_GL3 1\n\n\
         out vec4 outColor;\n\
         void main() { outColor = vec4(1); }"
    );

    let source = builder
        .assemble_source(ShaderStage::Vertex, "blit.vs.glsl")
        .unwrap();
    assert!(source.contains("in vec2 aPosition;\nvoid main() {}"));
}

#[test]
fn no_version_line_without_a_version() {
    let mut builder = builder(resources("version"));
    builder.set_version(0);
    let source = builder
        .assemble_source(ShaderStage::Vertex, "blit.vs.glsl")
        .unwrap();
    assert!(source.starts_with("in vec2 aPosition;"));
}

#[test]
fn links_a_program() {
    let builder = builder(resources("link"));
    let mut driver = MockDriver::default();
    let program = builder
        .create_program(&mut driver, "blit.vs.glsl", "blit.fs.glsl")
        .unwrap();
    assert_eq!(program, 100);
    assert_eq!(
        driver.calls,
        vec![
            Call::Compile(ShaderStage::Vertex),
            Call::Compile(ShaderStage::Fragment),
            Call::CreateProgram,
            Call::Attach(1),
            Call::Attach(2),
            Call::Link,
            Call::Detach(1),
            Call::DeleteShader(1),
            Call::Detach(2),
            Call::DeleteShader(2),
        ]
    );
}

#[test]
fn failed_fragment_releases_the_vertex_shader() {
    let builder = builder(resources("fragment"));
    let mut driver = MockDriver {
        fail_fragment: true,
        ..Default::default()
    };
    let err = builder
        .create_program(&mut driver, "blit.vs.glsl", "blit.fs.glsl")
        .unwrap_err();
    assert!(matches!(
        err,
        ShaderBuilderError::Compilation {
            stage: "fragment",
            ..
        }
    ));
    assert_eq!(err.to_string(), "Compilation failure in fragment shader:\n0:1: syntax error");
    assert_eq!(driver.calls.last(), Some(&Call::DeleteShader(1)));
    assert!(!driver.calls.contains(&Call::CreateProgram));
}

#[test]
fn failed_link_deletes_the_program() {
    let builder = builder(resources("unlinked"));
    let mut driver = MockDriver {
        fail_link: true,
        ..Default::default()
    };
    let err = builder
        .create_program(&mut driver, "blit.vs.glsl", "blit.fs.glsl")
        .unwrap_err();
    assert!(matches!(err, ShaderBuilderError::Link { .. }));
    assert_eq!(driver.calls.last(), Some(&Call::DeleteProgram));
    assert_eq!(
        driver
            .calls
            .iter()
            .filter(|c| matches!(c, Call::DeleteShader(_)))
            .count(),
        2
    );
}

#[test]
fn missing_resource() {
    let builder = builder(resources("missing"));
    let mut driver = MockDriver::default();
    let err = builder
        .create_program(&mut driver, "nothing.vs.glsl", "blit.fs.glsl")
        .unwrap_err();
    assert!(matches!(err, ShaderBuilderError::Resource { .. }));
    assert!(driver.calls.is_empty());
}
