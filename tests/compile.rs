use rspirv::dr::{load_words, Instruction, Module, Operand};
use rspirv::spirv::{Capability, Decoration, ExecutionModel, Op};

use slspv::error::DiagnosticKind;
use slspv::{CompileOptions, ShaderStage};

fn compile_with(source: &str, options: &CompileOptions) -> Module {
    let _ = env_logger::builder().is_test(true).try_init();
    let words = match slspv::compile(source, options) {
        Ok(words) => words,
        Err(diagnostics) => panic!("{}\n{}", source, diagnostics),
    };
    load_words(words).expect("emitted module should load")
}

fn compile(source: &str) -> Module {
    compile_with(source, &CompileOptions::default())
}

/// Instructions of the last function, which is `main` in every test.
fn main_body(module: &Module) -> Vec<&Instruction> {
    let main = module.functions.last().expect("no functions");
    main.blocks.iter().flat_map(|b| &b.instructions).collect()
}

fn count(instructions: &[&Instruction], op: Op) -> usize {
    instructions.iter().filter(|i| i.class.opcode == op).count()
}

fn has_capability(module: &Module, capability: Capability) -> bool {
    module
        .capabilities
        .iter()
        .any(|i| i.operands == [Operand::Capability(capability)])
}

fn decorations(module: &Module, decoration: Decoration) -> usize {
    module
        .annotations
        .iter()
        .filter(|i| i.operands.get(1) == Some(&Operand::Decoration(decoration)))
        .count()
}

#[test]
fn empty_fragment_shader() {
    let module = compile("void main() {}");
    assert!(has_capability(&module, Capability::Shader));
    assert!(!has_capability(&module, Capability::Float64));
    assert!(module.memory_model.is_some());

    assert_eq!(module.entry_points.len(), 1);
    assert_eq!(
        module.entry_points[0].operands[0],
        Operand::ExecutionModel(ExecutionModel::Fragment)
    );
    assert_eq!(module.execution_modes.len(), 1);

    let body = main_body(&module);
    assert_eq!(body.last().map(|i| i.class.opcode), Some(Op::Return));
}

#[test]
fn vertex_shaders_have_no_origin() {
    let options = CompileOptions {
        stage: ShaderStage::Vertex,
        ..Default::default()
    };
    let module = compile_with("in vec4 position; void main() {}", &options);
    assert_eq!(
        module.entry_points[0].operands[0],
        Operand::ExecutionModel(ExecutionModel::Vertex)
    );
    assert!(module.execution_modes.is_empty());
}

#[test]
fn inputs_and_outputs_are_the_interface() {
    let module = compile(
        "in vec4 color;
         in mat4 transform;
         in vec2 uv;
         out vec4 result;
         void main() { result = transform * color * 2.0; }",
    );
    // model, main, "main", then four variables
    assert_eq!(module.entry_points[0].operands.len(), 7);
    assert_eq!(decorations(&module, Decoration::Location), 4);

    let locations: Vec<_> = module
        .annotations
        .iter()
        .filter_map(|i| match i.operands.as_slice() {
            [_, Operand::Decoration(Decoration::Location), Operand::LiteralBit32(n)] => Some(*n),
            _ => None,
        })
        .collect();
    assert_eq!(locations, vec![0, 1, 5, 0]);

    let body = main_body(&module);
    assert_eq!(count(&body, Op::MatrixTimesVector), 1);
    assert_eq!(count(&body, Op::VectorTimesScalar), 1);
    assert_eq!(count(&body, Op::Store), 1);
}

#[test]
fn integer_inputs_are_flat() {
    let module = compile("in int id; out float r; void main() { r = float(id); }");
    assert_eq!(decorations(&module, Decoration::Flat), 1);
    assert_eq!(count(&main_body(&module), Op::ConvertSToF), 1);
}

#[test]
fn doubles_need_a_capability() {
    let module = compile("out float r; void main() { double d = 1.5lf; r = float(d); }");
    assert!(has_capability(&module, Capability::Float64));
    assert_eq!(count(&main_body(&module), Op::FConvert), 1);
}

#[test]
fn constants_are_folded() {
    let module = compile("out float r; void main() { r = 2.0 * 3.0 + 1.0; }");
    let body = main_body(&module);
    assert_eq!(count(&body, Op::FMul), 0);
    assert_eq!(count(&body, Op::FAdd), 0);
    assert_eq!(count(&body, Op::Store), 1);
}

#[test]
fn calls_copy_out_parameters_back() {
    let module = compile(
        "void split(float v, out float a, inout float b) { a = v; b = b + v; }
         out vec4 result;
         void main() {
           float x;
           float y = 1.0;
           split(2, x, y);
           result = vec4(x, y, 0, 1);
         }",
    );
    assert_eq!(module.functions.len(), 2);

    let split = &module.functions[0];
    assert_eq!(split.parameters.len(), 3);

    let body = main_body(&module);
    assert_eq!(count(&body, Op::FunctionCall), 1);
    // two temporaries, x, y
    assert_eq!(count(&body, Op::Variable), 4);
    // y into its temporary, both temporaries back, result
    assert_eq!(count(&body, Op::Store), 4);
}

#[test]
fn logical_operators_short_circuit() {
    let module = compile(
        "in float v;
         out float r;
         void main() { bool b = v > 0.0 && v < 1.0; r = float(b); }",
    );
    let main = module.functions.last().unwrap();
    assert_eq!(main.blocks.len(), 3);
    assert_eq!(count(&main_body(&module), Op::Phi), 1);
    assert_eq!(count(&main_body(&module), Op::Select), 1);
}

#[test]
fn swizzles_merge_into_the_vector() {
    let module = compile(
        "out vec4 result;
         void main() { result.zx = vec2(1.0, 2.0); result.y = 3.0; }",
    );
    let body = main_body(&module);
    assert_eq!(count(&body, Op::VectorShuffle), 1);
    assert_eq!(count(&body, Op::AccessChain), 1);
    assert_eq!(count(&body, Op::Store), 2);
}

#[test]
fn stores_through_nested_swizzles() {
    let module = compile(
        "out vec4 result;
         void main() {
           vec4 v = vec4(0.0);
           v.xy.x = 1.0;
           v.yx.x++;
           v.wzyx.yx = vec2(2.0, 3.0);
           result = v;
         }",
    );
    let body = main_body(&module);

    let constant = |id: Option<&Operand>| {
        let Some(Operand::IdRef(id)) = id else {
            return None;
        };
        module
            .types_global_values
            .iter()
            .find(|i| i.result_id == Some(*id))
            .and_then(|i| match i.operands.as_slice() {
                [Operand::LiteralBit32(n)] => Some(*n),
                _ => None,
            })
    };
    let indices: Vec<_> = body
        .iter()
        .filter(|i| i.class.opcode == Op::AccessChain)
        .map(|i| constant(i.operands.get(1)))
        .collect();
    assert_eq!(indices, vec![Some(0), Some(1)]);

    // reading v.yx, then merging into v.zw
    assert_eq!(count(&body, Op::VectorShuffle), 2);
    assert_eq!(count(&body, Op::Store), 4);
}

#[test]
fn structs_are_named() {
    let module = compile(
        "struct Light { vec3 color; float power; };
         in float scale;
         out vec4 result;
         void main() {
           Light l = Light(vec3(1), scale);
           l.power *= 2;
           result = vec4(l.color * l.power, 1.0);
         }",
    );
    let member_names = module
        .debug_names
        .iter()
        .filter(|i| i.class.opcode == Op::MemberName)
        .count();
    assert_eq!(member_names, 2);

    let body = main_body(&module);
    assert_eq!(count(&body, Op::CompositeConstruct), 2);
    assert_eq!(count(&body, Op::AccessChain), 1);
}

#[test]
fn global_initializers_run_first_in_main() {
    let module = compile(
        "in float v;
         float g = v * 2.0;
         float h = 3.0;
         out float r;
         void main() { r = g + h; }",
    );
    let body = main_body(&module);
    let first_store = body.iter().position(|i| i.class.opcode == Op::Store);
    let first_add = body.iter().position(|i| i.class.opcode == Op::FAdd);
    assert!(first_store < first_add);
    assert_eq!(count(&body, Op::Store), 2);
}

#[test]
fn helpers_return_values() {
    let module = compile(
        "float twice(const float x) { return x * 2; }
         out float r;
         void main() { r = twice(4); }",
    );
    let twice = &module.functions[0];
    let instructions: Vec<_> = twice.blocks.iter().flat_map(|b| &b.instructions).collect();
    assert_eq!(count(&instructions, Op::ReturnValue), 1);
    // const parameters are used directly
    assert_eq!(count(&instructions, Op::Variable), 0);
}

#[test]
fn defines_and_preamble() {
    let options = CompileOptions {
        defines: vec![("SCALE".to_string(), "2.0".to_string())],
        preamble: Some("#define OUTPUT out float r;\n".to_string()),
        ..Default::default()
    };
    compile_with("OUTPUT void main() { r = SCALE; }", &options);

    let diagnostics = slspv::compile(
        "out float r; void main() { r = SCALE; }",
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert_eq!(diagnostics.count(DiagnosticKind::Scope), 1);
}

#[test]
fn broken_programs_report_every_problem() {
    let diagnostics = slspv::compile(
        "void f() { int x = ; }
         void f() { }",
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert_eq!(diagnostics.count(DiagnosticKind::Syntax), 1);
    // redefinition of f and missing main
    assert_eq!(diagnostics.count(DiagnosticKind::Scope), 2);
    assert_eq!(
        diagnostics.iter().last().unwrap().message,
        "No main() function defined"
    );
}

#[test]
fn printed_programs_parse_back() {
    let source = "struct S { int a; vec2 b; };
                  in vec4 color;
                  out vec4 result;
                  float helper(in float x, out int y) { y = 1; return x * 2.0; }
                  void main() {
                    struct L { float k; } l;
                    l.k = 0.5;
                    int n;
                    result = color * helper(color.x, n) * l.k;
                  }";
    let printed = slspv::parse(source, &CompileOptions::default())
        .unwrap()
        .print();
    let reprinted = slspv::parse(&printed, &CompileOptions::default())
        .unwrap()
        .print();
    assert_eq!(printed, reprinted);
    assert!(printed.starts_with("struct S {\n  int a;\n  vec2 b;\n};\n"));
    assert!(printed.contains("  struct L {\n    float k;\n  } l;\n  l.k = 0.5;\n"));
}
