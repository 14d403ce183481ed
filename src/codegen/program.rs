use std::rc::Rc;

use log::debug;
use spirv::{Decoration, ExecutionMode, ExecutionModel, FunctionControl, Op, StorageClass, Word};

use crate::analyzer::{Function, Scalar, Storage, Type, Variable};
use crate::parser::{Expression, Node, Program};

use super::expr::convert;
use super::writer::{Section, SpvWriter};
use super::ShaderStage;

/// Number of interface locations a value of `ty` takes up.
fn location_count(ty: &Type) -> u32 {
    match ty {
        Type::Vector(Scalar::Double, n) if *n > 2 => 2,
        Type::Matrix(s, cols, rows) => cols * location_count(&Type::Vector(*s, *rows)),
        Type::Struct(st) => st.fields.iter().map(|f| location_count(&f.ty)).sum(),
        _ => 1,
    }
}

impl Node {
    /// Writes the statement. Returns the id of the declared variable or of the expression's
    /// value, if any. Constants are not declared and give the id of their value.
    pub fn write_spv(&self, w: &mut SpvWriter) -> Option<Word> {
        match self {
            Node::Empty => None,
            Node::Declaration {
                variable, initial, ..
            } => {
                if let Some(value) = variable.constant_value() {
                    return Some(w.id_for_value(value));
                }
                let id = w.id_for_variable(variable);
                if let Some(initial) = initial {
                    if variable.initial_value().is_none() {
                        let value = initial.write_spv(w);
                        let value = convert(w, value, &initial.ty(), variable.ty());
                        w.add(Section::Code, Op::Store, &[id, value]);
                    }
                }
                Some(id)
            }
            Node::Expression(expr) => Some(expr.write_spv(w)),
            Node::Return { .. } => unreachable!("returns end the function that contains them"),
        }
    }
}

fn write_return(w: &mut SpvWriter, value: Option<&Expression>, return_type: &Type) {
    match value {
        Some(value) => {
            let id = value.write_spv(w);
            let id = convert(w, id, &value.ty(), return_type);
            w.add(Section::Code, Op::ReturnValue, &[id]);
        }
        None => w.add(Section::Code, Op::Return, &[]),
    }
}

/// Writes a function of the shader. `initializers` are stored before the body runs.
fn write_function(
    w: &mut SpvWriter,
    function: &Rc<Function>,
    initializers: &[(&Rc<Variable>, &Expression)],
) {
    let Some(f) = function.as_declared() else {
        return;
    };
    debug!("writing function {}", f.name);

    let id = w.id_for_function(function);
    let return_type = w.id_for_type(&f.return_type);
    let parameter_types: Vec<_> = f
        .parameters
        .iter()
        .map(|p| {
            if p.pointer_type().access().writes() {
                w.id_for_pointer_type(p.ty(), StorageClass::Function)
            } else {
                w.id_for_type(p.ty())
            }
        })
        .collect();
    let function_type = w.id_for_function_type(return_type, &parameter_types);
    w.add(
        Section::Declare,
        Op::Function,
        &[return_type, id, FunctionControl::NONE.bits(), function_type],
    );
    w.add_name(id, &f.name);

    // Parameters taken by value are copied to locals so the body can write to them.
    let mut copies = vec![];
    for (parameter, ty) in f.parameters.iter().zip(&parameter_types) {
        let parameter_id = w.next_id();
        w.add(Section::Declare, Op::FunctionParameter, &[*ty, parameter_id]);
        let pointer_type = parameter.pointer_type();
        if pointer_type.access().writes() || !pointer_type.is_pointer() {
            w.set_id_for_variable(parameter, parameter_id);
        } else {
            copies.push((parameter, parameter_id));
        }
    }

    let label = w.next_id();
    w.start_block(Section::Declare, label);
    for (parameter, value) in copies {
        let local = w.id_for_variable(parameter);
        w.add(Section::Code, Op::Store, &[local, value]);
    }
    for (variable, initial) in initializers {
        let id = w.id_for_variable(variable);
        let value = initial.write_spv(w);
        let value = convert(w, value, &initial.ty(), variable.ty());
        w.add(Section::Code, Op::Store, &[id, value]);
    }

    let mut returned = false;
    for node in &f.body {
        if let Node::Return { value } = node {
            write_return(w, value.as_ref(), &f.return_type);
            returned = true;
            break;
        }
        node.write_spv(w);
    }
    if !returned {
        let op = if f.return_type.is_void() {
            Op::Return
        } else {
            Op::Unreachable
        };
        w.add(Section::Code, op, &[]);
    }

    w.add(Section::Code, Op::FunctionEnd, &[]);
    w.commit_function();
}

impl Program {
    /// Compiles the program into a SPIR-V module with `main` as the entry point of `stage`.
    pub fn write_spv(&self, stage: ShaderStage) -> Vec<Word> {
        let mut w = SpvWriter::new();
        let mut interface = vec![];
        let mut initializers = vec![];
        let (mut inputs, mut outputs) = (0, 0);

        for (variable, initial) in self.globals() {
            if variable.constant_value().is_some() {
                continue;
            }
            let id = w.id_for_variable(variable);
            if let Some(initial) = initial {
                if variable.initial_value().is_none() {
                    initializers.push((variable, initial));
                }
            }

            let storage = variable.pointer_type().storage();
            let location = match storage {
                Storage::Input => &mut inputs,
                Storage::Output => &mut outputs,
                Storage::Private | Storage::Function => continue,
            };
            w.add(
                Section::Decorate,
                Op::Decorate,
                &[id, Decoration::Location as Word, *location],
            );
            *location += location_count(variable.ty());

            let flat = variable
                .ty()
                .scalar()
                .is_some_and(|s| s.is_integer() || s == Scalar::Double);
            if stage == ShaderStage::Fragment && storage == Storage::Input && flat {
                w.add(Section::Decorate, Op::Decorate, &[id, Decoration::Flat as Word]);
            }
            interface.push(id);
        }

        let main = self.main();
        for function in self.functions() {
            let is_main = main.is_some_and(|m| Rc::ptr_eq(m, function));
            let initializers: &[_] = if is_main { &initializers } else { &[] };
            write_function(&mut w, function, initializers);
        }

        if let Some(main) = main {
            let id = w.id_for_function(main);
            let model = match stage {
                ShaderStage::Vertex => ExecutionModel::Vertex,
                ShaderStage::Fragment => ExecutionModel::Fragment,
            };
            w.add_entry_point(model, id, &interface);
            if stage == ShaderStage::Fragment {
                w.add(
                    Section::Header,
                    Op::ExecutionMode,
                    &[id, ExecutionMode::OriginUpperLeft as Word],
                );
            }
        }

        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Component, Scope};
    use crate::lexer::Preprocessor;

    fn declare(scope: &mut Scope, source: &str) -> Node {
        let mut stream = Preprocessor::new(source);
        let node = Node::parse_statement(scope, &mut stream);
        assert!(!stream.has_errors(), "{:?}", stream.diagnostics());
        node
    }

    #[test]
    fn declarations_give_an_id() {
        let mut scope = Scope::new(None, None);
        let mut w = SpvWriter::new();

        let constant = declare(&mut scope, "const int k = 3;");
        let id = constant.write_spv(&mut w);
        assert_eq!(id, Some(w.id_for_component(Component::Int(3))));

        let folded = declare(&mut scope, "float x = 2.0;");
        let Node::Declaration { variable, .. } = &folded else {
            panic!("expected a declaration, got {:?}", folded);
        };
        let id = folded.write_spv(&mut w);
        assert_eq!(id, Some(w.id_for_variable(variable)));
        assert_eq!(Node::Empty.write_spv(&mut w), None);
    }

    #[test]
    fn locations_of_wide_types() {
        assert_eq!(location_count(&Type::Vector(Scalar::Float, 4)), 1);
        assert_eq!(location_count(&Type::Vector(Scalar::Double, 3)), 2);
        assert_eq!(location_count(&Type::Matrix(Scalar::Float, 4, 4)), 4);
        assert_eq!(location_count(&Type::Matrix(Scalar::Double, 2, 4)), 4);
    }
}
