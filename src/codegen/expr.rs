use spirv::{Op, SelectionControl, Word};

use crate::analyzer::{
    constructor_layout, Component, ComponentSource, DeclaredFunction, Function, Scalar, Type,
    Value,
};
use crate::parser::{BinaryOp, Expression, UnaryOp};

use super::writer::{storage_class, Section, SpvWriter};

fn opcode(op: BinaryOp, scalar: Scalar) -> Op {
    let float = scalar.is_float();
    match op {
        BinaryOp::LogicalOr => Op::LogicalOr,
        BinaryOp::LogicalAnd => Op::LogicalAnd,
        BinaryOp::LogicalXor => Op::LogicalNotEqual,
        BinaryOp::BitwiseOr => Op::BitwiseOr,
        BinaryOp::BitwiseXor => Op::BitwiseXor,
        BinaryOp::BitwiseAnd => Op::BitwiseAnd,
        BinaryOp::Equal => match scalar {
            Scalar::Bool => Op::LogicalEqual,
            _ if float => Op::FOrdEqual,
            _ => Op::IEqual,
        },
        BinaryOp::NotEqual => match scalar {
            Scalar::Bool => Op::LogicalNotEqual,
            _ if float => Op::FUnordNotEqual,
            _ => Op::INotEqual,
        },
        BinaryOp::Less => match scalar {
            Scalar::Int => Op::SLessThan,
            Scalar::Uint => Op::ULessThan,
            _ => Op::FOrdLessThan,
        },
        BinaryOp::Greater => match scalar {
            Scalar::Int => Op::SGreaterThan,
            Scalar::Uint => Op::UGreaterThan,
            _ => Op::FOrdGreaterThan,
        },
        BinaryOp::LessEqual => match scalar {
            Scalar::Int => Op::SLessThanEqual,
            Scalar::Uint => Op::ULessThanEqual,
            _ => Op::FOrdLessThanEqual,
        },
        BinaryOp::GreaterEqual => match scalar {
            Scalar::Int => Op::SGreaterThanEqual,
            Scalar::Uint => Op::UGreaterThanEqual,
            _ => Op::FOrdGreaterThanEqual,
        },
        BinaryOp::LeftShift => Op::ShiftLeftLogical,
        BinaryOp::RightShift if scalar == Scalar::Int => Op::ShiftRightArithmetic,
        BinaryOp::RightShift => Op::ShiftRightLogical,
        BinaryOp::Add if float => Op::FAdd,
        BinaryOp::Add => Op::IAdd,
        BinaryOp::Sub if float => Op::FSub,
        BinaryOp::Sub => Op::ISub,
        BinaryOp::Mul if float => Op::FMul,
        BinaryOp::Mul => Op::IMul,
        BinaryOp::Div if float => Op::FDiv,
        BinaryOp::Div if scalar == Scalar::Int => Op::SDiv,
        BinaryOp::Div => Op::UDiv,
        BinaryOp::Mod if scalar == Scalar::Int => Op::SMod,
        BinaryOp::Mod => Op::UMod,
    }
}

/// A constant of type `ty` with every component set to `component`.
fn constant_splat(w: &mut SpvWriter, component: Component, ty: &Type) -> Word {
    let components = vec![component; ty.component_count()];
    w.id_for_value(&Value::new(ty.clone(), components))
}

/// Repeats a scalar into a vector or matrix of the same element type.
fn splat(w: &mut SpvWriter, id: Word, target: &Type) -> Word {
    match target {
        Type::Vector(_, n) => {
            let ty = w.id_for_type(target);
            w.add_code(Op::CompositeConstruct, ty, &vec![id; *n as usize])
        }
        Type::Matrix(s, cols, rows) => {
            let column = splat(w, id, &Type::Vector(*s, *rows));
            let ty = w.id_for_type(target);
            w.add_code(Op::CompositeConstruct, ty, &vec![column; *cols as usize])
        }
        _ => id,
    }
}

/// Applies `op` to operands that all have type `ty`, column by column for matrices.
fn componentwise(w: &mut SpvWriter, op: Op, ty: &Type, operands: &[Word]) -> Word {
    let type_id = w.id_for_type(ty);
    let Type::Matrix(s, cols, rows) = ty else {
        return w.add_code(op, type_id, operands);
    };

    let column_id = w.id_for_type(&Type::Vector(*s, *rows));
    let mut columns = Vec::with_capacity(*cols as usize);
    for c in 0..*cols {
        let parts: Vec<_> = operands
            .iter()
            .map(|&operand| w.add_code(Op::CompositeExtract, column_id, &[operand, c]))
            .collect();
        columns.push(w.add_code(op, column_id, &parts));
    }
    w.add_code(Op::CompositeConstruct, type_id, &columns)
}

/// Converts `id` from `from` to `to`, which has the same shape. Implicit promotions and the
/// explicit conversions done by constructors both end up here.
pub(super) fn convert(w: &mut SpvWriter, id: Word, from: &Type, to: &Type) -> Word {
    if from == to {
        return id;
    }
    let (Some(source), Some(target)) = (from.scalar(), to.scalar()) else {
        return id;
    };

    if let Type::Matrix(_, cols, rows) = to {
        let from_column = Type::Vector(source, *rows);
        let to_column = Type::Vector(target, *rows);
        let from_column_id = w.id_for_type(&from_column);
        let mut columns = Vec::with_capacity(*cols as usize);
        for c in 0..*cols {
            let column = w.add_code(Op::CompositeExtract, from_column_id, &[id, c]);
            columns.push(convert(w, column, &from_column, &to_column));
        }
        let ty = w.id_for_type(to);
        return w.add_code(Op::CompositeConstruct, ty, &columns);
    }

    let ty = w.id_for_type(to);
    match (source, target) {
        (Scalar::Bool, _) => {
            let one = constant_splat(w, Component::one(target), to);
            let zero = constant_splat(w, Component::zero(target), to);
            w.add_code(Op::Select, ty, &[id, one, zero])
        }
        (_, Scalar::Bool) => {
            let zero = constant_splat(w, Component::zero(source), from);
            let op = if source.is_float() {
                Op::FUnordNotEqual
            } else {
                Op::INotEqual
            };
            w.add_code(op, ty, &[id, zero])
        }
        (Scalar::Int, Scalar::Uint) | (Scalar::Uint, Scalar::Int) => {
            w.add_code(Op::Bitcast, ty, &[id])
        }
        (Scalar::Int, _) => w.add_code(Op::ConvertSToF, ty, &[id]),
        (Scalar::Uint, _) => w.add_code(Op::ConvertUToF, ty, &[id]),
        (_, Scalar::Int) => w.add_code(Op::ConvertFToS, ty, &[id]),
        (_, Scalar::Uint) => w.add_code(Op::ConvertFToU, ty, &[id]),
        _ => w.add_code(Op::FConvert, ty, &[id]),
    }
}

/// Writes `left op right` for operands that have been computed already.
fn write_binary(
    w: &mut SpvWriter,
    op: BinaryOp,
    (left, left_ty): (Word, &Type),
    (right, right_ty): (Word, &Type),
    result: &Type,
) -> Word {
    if op.is_shift() {
        let right = match (left_ty, right_ty) {
            (Type::Vector(_, n), Type::Scalar(s)) => splat(w, right, &Type::Vector(*s, *n)),
            _ => right,
        };
        let type_id = w.id_for_type(result);
        let scalar = left_ty.scalar().unwrap_or(Scalar::Int);
        return w.add_code(opcode(op, scalar), type_id, &[left, right]);
    }

    let Some(common) = op.operand_scalar(left_ty, right_ty) else {
        unreachable!("operands of {} were type checked", op.symbol());
    };
    let converted_left = left_ty.with_scalar(common);
    let converted_right = right_ty.with_scalar(common);
    let left = convert(w, left, left_ty, &converted_left);
    let right = convert(w, right, right_ty, &converted_right);
    let (left_ty, right_ty) = (converted_left, converted_right);
    let code = opcode(op, common);

    if op.is_logical() || op.is_relational() {
        let bool_id = w.id_for_type(&Type::BOOL);
        return w.add_code(code, bool_id, &[left, right]);
    }
    if op.is_equality() {
        let bool_id = w.id_for_type(&Type::BOOL);
        let Type::Vector(_, n) = left_ty else {
            return w.add_code(code, bool_id, &[left, right]);
        };
        let bvec = w.id_for_type(&Type::Vector(Scalar::Bool, n));
        let each = w.add_code(code, bvec, &[left, right]);
        let reduce = if op == BinaryOp::Equal {
            Op::All
        } else {
            Op::Any
        };
        return w.add_code(reduce, bool_id, &[each]);
    }

    let type_id = w.id_for_type(result);
    let multiply = op == BinaryOp::Mul;
    match (&left_ty, &right_ty) {
        (Type::Matrix(..), Type::Matrix(..)) if multiply => {
            w.add_code(Op::MatrixTimesMatrix, type_id, &[left, right])
        }
        (Type::Matrix(..), Type::Vector(..)) if multiply => {
            w.add_code(Op::MatrixTimesVector, type_id, &[left, right])
        }
        (Type::Vector(..), Type::Matrix(..)) if multiply => {
            w.add_code(Op::VectorTimesMatrix, type_id, &[left, right])
        }
        (Type::Matrix(..), Type::Scalar(_)) if multiply => {
            w.add_code(Op::MatrixTimesScalar, type_id, &[left, right])
        }
        (Type::Scalar(_), Type::Matrix(..)) if multiply => {
            w.add_code(Op::MatrixTimesScalar, type_id, &[right, left])
        }
        (Type::Vector(..), Type::Scalar(_)) if multiply && common.is_float() => {
            w.add_code(Op::VectorTimesScalar, type_id, &[left, right])
        }
        (Type::Scalar(_), Type::Vector(..)) if multiply && common.is_float() => {
            w.add_code(Op::VectorTimesScalar, type_id, &[right, left])
        }
        (_, Type::Scalar(_)) if !left_ty.is_scalar() => {
            let right = splat(w, right, &left_ty);
            componentwise(w, code, result, &[left, right])
        }
        (Type::Scalar(_), _) if !right_ty.is_scalar() => {
            let left = splat(w, left, &right_ty);
            componentwise(w, code, result, &[left, right])
        }
        _ => componentwise(w, code, result, &[left, right]),
    }
}

/// Builds a scalar, vector or matrix out of its flattened components.
fn assemble(w: &mut SpvWriter, ty: &Type, components: &[Word]) -> Word {
    let type_id = w.id_for_type(ty);
    match ty {
        Type::Matrix(s, _, rows) => {
            let column_id = w.id_for_type(&Type::Vector(*s, *rows));
            let columns: Vec<_> = components
                .chunks(*rows as usize)
                .map(|column| w.add_code(Op::CompositeConstruct, column_id, column))
                .collect();
            w.add_code(Op::CompositeConstruct, type_id, &columns)
        }
        Type::Vector(..) => w.add_code(Op::CompositeConstruct, type_id, components),
        _ => components[0],
    }
}

fn write_constructor(w: &mut SpvWriter, ty: &Type, arguments: &[Expression]) -> Word {
    let types: Vec<_> = arguments.iter().map(|a| a.ty()).collect();
    let ids: Vec<_> = arguments.iter().map(|a| a.write_spv(w)).collect();
    let Some(target) = ty.scalar() else {
        unreachable!("{} has no built-in constructor", ty);
    };

    // Same shape: a plain conversion.
    if let [argument] = types.as_slice() {
        if argument.with_scalar(target) == *ty {
            return convert(w, ids[0], argument, ty);
        }
    }

    let layout = match constructor_layout(ty, &types) {
        Ok(layout) => layout,
        Err(message) => unreachable!("{}", message),
    };
    let target_ty = Type::Scalar(target);
    let mut components = Vec::with_capacity(layout.len());
    for source in layout {
        let id = match source {
            ComponentSource::Zero => w.id_for_component(Component::zero(target)),
            ComponentSource::One => w.id_for_component(Component::one(target)),
            ComponentSource::Argument {
                argument,
                component,
            } => {
                let argument_ty = &types[argument];
                let scalar_ty = Type::Scalar(argument_ty.scalar().unwrap_or(target));
                let scalar_id = w.id_for_type(&scalar_ty);
                let component = component as Word;
                let id = match argument_ty {
                    Type::Vector(..) => {
                        w.add_code(Op::CompositeExtract, scalar_id, &[ids[argument], component])
                    }
                    Type::Matrix(_, _, rows) => w.add_code(
                        Op::CompositeExtract,
                        scalar_id,
                        &[ids[argument], component / rows, component % rows],
                    ),
                    _ => ids[argument],
                };
                convert(w, id, &scalar_ty, &target_ty)
            }
        };
        components.push(id);
    }
    assemble(w, ty, &components)
}

/// Calls a function of the shader. `out` and `inout` arguments go through temporaries that
/// are copied back after the call.
fn write_call(
    w: &mut SpvWriter,
    id: Word,
    function: &DeclaredFunction,
    arguments: &[Expression],
) -> Word {
    let mut operands = vec![id];
    let mut write_backs = vec![];

    for (parameter, argument) in function.parameters.iter().zip(arguments) {
        let access = parameter.pointer_type().access();
        if access.writes() {
            let temporary = w.declare_temporary(parameter.ty());
            if access.reads() {
                let value = argument.write_spv(w);
                w.add(Section::Code, Op::Store, &[temporary, value]);
            }
            operands.push(temporary);
            write_backs.push((temporary, argument));
        } else {
            let value = argument.write_spv(w);
            operands.push(convert(w, value, &argument.ty(), parameter.ty()));
        }
    }

    let return_type = w.id_for_type(&function.return_type);
    let result = w.add_code(Op::FunctionCall, return_type, &operands);
    for (temporary, argument) in write_backs {
        let ty = w.id_for_type(&argument.ty());
        let value = w.add_code(Op::Load, ty, &[temporary]);
        argument.write_store(w, value);
    }
    result
}

impl Expression {
    /// Writes the code computing the expression and returns the id holding its value.
    pub fn write_spv(&self, w: &mut SpvWriter) -> Word {
        if let Some(value) = self.constant() {
            return w.id_for_value(&value);
        }

        match self {
            Expression::Constant(value) => w.id_for_value(value),
            Expression::Reference(variable) => {
                let id = w.id_for_variable(variable);
                if !variable.pointer_type().is_pointer() {
                    return id;
                }
                let ty = w.id_for_type(variable.ty());
                w.add_code(Op::Load, ty, &[id])
            }
            Expression::Assignment { op, lvalue, rvalue } => {
                let target = lvalue.ty();
                let rvalue_ty = rvalue.ty();
                let value = match op {
                    None => {
                        let value = rvalue.write_spv(w);
                        convert(w, value, &rvalue_ty, &target)
                    }
                    Some(op) => {
                        let current = lvalue.write_spv(w);
                        let value = rvalue.write_spv(w);
                        let result = op.result_type(&target, &rvalue_ty).unwrap_or(target.clone());
                        let value =
                            write_binary(w, *op, (current, &target), (value, &rvalue_ty), &result);
                        convert(w, value, &result, &target)
                    }
                };
                lvalue.write_store(w, value);
                value
            }
            Expression::Binary {
                op, left, right, ..
            } if matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr) => {
                let left = left.write_spv(w);
                let start = w.current_block();
                let evaluate_right = w.next_id();
                let merge = w.next_id();
                w.add(
                    Section::Code,
                    Op::SelectionMerge,
                    &[merge, SelectionControl::NONE.bits()],
                );
                let targets = if *op == BinaryOp::LogicalAnd {
                    [left, evaluate_right, merge]
                } else {
                    [left, merge, evaluate_right]
                };
                w.add(Section::Code, Op::BranchConditional, &targets);

                w.start_block(Section::Code, evaluate_right);
                let right = right.write_spv(w);
                let end = w.current_block();
                w.add(Section::Code, Op::Branch, &[merge]);

                w.start_block(Section::Code, merge);
                let bool_id = w.id_for_type(&Type::BOOL);
                w.add_code(Op::Phi, bool_id, &[left, start, right, end])
            }
            Expression::Binary {
                op,
                left,
                right,
                ty,
            } => {
                let left_ty = left.ty();
                let right_ty = right.ty();
                let left = left.write_spv(w);
                let right = right.write_spv(w);
                write_binary(w, *op, (left, &left_ty), (right, &right_ty), ty)
            }
            Expression::Unary { op, operand } => {
                let ty = operand.ty();
                let id = operand.write_spv(w);
                match op {
                    UnaryOp::Plus => id,
                    UnaryOp::Negate if ty.scalar().is_some_and(Scalar::is_float) => {
                        componentwise(w, Op::FNegate, &ty, &[id])
                    }
                    UnaryOp::Negate => componentwise(w, Op::SNegate, &ty, &[id]),
                    UnaryOp::LogicalNot => componentwise(w, Op::LogicalNot, &ty, &[id]),
                    UnaryOp::BitwiseNot => componentwise(w, Op::Not, &ty, &[id]),
                }
            }
            Expression::IncDec { op, operand } => {
                let ty = operand.ty();
                let scalar = ty.scalar().unwrap_or(Scalar::Int);
                let old = operand.write_spv(w);
                let one = constant_splat(w, Component::one(scalar), &ty);
                let arithmetic = if op.is_increment() {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                let new = componentwise(w, opcode(arithmetic, scalar), &ty, &[old, one]);
                operand.write_store(w, new);
                if op.is_prefix() {
                    new
                } else {
                    old
                }
            }
            Expression::Call {
                function,
                arguments,
            } => match &**function {
                Function::Constructor(ty @ Type::Struct(st)) => {
                    let mut fields = Vec::with_capacity(arguments.len());
                    for (field, argument) in st.fields.iter().zip(arguments) {
                        let value = argument.write_spv(w);
                        fields.push(convert(w, value, &argument.ty(), &field.ty));
                    }
                    let type_id = w.id_for_type(ty);
                    w.add_code(Op::CompositeConstruct, type_id, &fields)
                }
                Function::Constructor(ty) => write_constructor(w, ty, arguments),
                Function::Declared(declared) => {
                    let id = w.id_for_function(function);
                    write_call(w, id, declared, arguments)
                }
            },
            Expression::Member { expr, index, ty } => {
                let base = expr.write_spv(w);
                let type_id = w.id_for_type(ty);
                w.add_code(Op::CompositeExtract, type_id, &[base, *index as Word])
            }
            Expression::Swizzle {
                expr,
                components,
                ty,
                ..
            } => {
                let base = expr.write_spv(w);
                let type_id = w.id_for_type(ty);
                if let [component] = components.as_slice() {
                    return w.add_code(Op::CompositeExtract, type_id, &[base, *component]);
                }
                let mut operands = vec![base, base];
                operands.extend(components);
                w.add_code(Op::VectorShuffle, type_id, &operands)
            }
            Expression::Error(_) => unreachable!("erroneous expressions are never compiled"),
        }
    }

    /// The vector a swizzle finally selects from, with the picked components of that vector.
    /// Swizzles of swizzles like `v.zyx.xy` collapse into `v.zy`.
    fn swizzle_base(&self) -> Option<(&Expression, Vec<u32>)> {
        let Expression::Swizzle {
            expr, components, ..
        } = self
        else {
            return None;
        };
        match expr.swizzle_base() {
            Some((base, inner)) => {
                let composed = components.iter().map(|&c| inner[c as usize]).collect();
                Some((base, composed))
            }
            None => Some((expr, components.clone())),
        }
    }

    /// Pointer to the storage an lvalue refers to.
    fn write_pointer(&self, w: &mut SpvWriter) -> Word {
        let swizzle = self.swizzle_base();
        let (base, index, ty) = match (self, &swizzle) {
            (Expression::Reference(variable), _) => return w.id_for_variable(variable),
            (Expression::Member { expr, index, ty }, _) => (&**expr, *index as Word, ty),
            (Expression::Swizzle { ty, .. }, Some((base, components))) if components.len() == 1 => {
                (*base, components[0], ty)
            }
            _ => unreachable!("{} is not an lvalue", self.print()),
        };

        let Some(variable) = self.lvalue_variable() else {
            unreachable!("{} is not an lvalue", self.print());
        };
        let class = storage_class(variable.pointer_type().storage());
        let base = base.write_pointer(w);
        let pointer = w.id_for_pointer_type(ty, class);
        let index = w.id_for_component(Component::Int(index as i32));
        w.add_code(Op::AccessChain, pointer, &[base, index])
    }

    /// Stores `value` into an lvalue. Swizzles of several components merge `value` into the
    /// vector they select from.
    fn write_store(&self, w: &mut SpvWriter, value: Word) {
        if let Some((base, components)) = self.swizzle_base() {
            if components.len() > 1 {
                let vector = base.ty();
                let size = vector.length();
                let mut operands = vec![base.write_spv(w), value];
                operands.extend(0..size);
                for (i, component) in components.iter().enumerate() {
                    operands[2 + *component as usize] = size + i as Word;
                }
                let type_id = w.id_for_type(&vector);
                let merged = w.add_code(Op::VectorShuffle, type_id, &operands);
                base.write_store(w, merged);
                return;
            }
        }

        let pointer = self.write_pointer(w);
        w.add(Section::Code, Op::Store, &[pointer, value]);
    }
}
