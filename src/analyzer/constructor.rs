use super::{Component, Type, Value};

/// Where one component of a constructed value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentSource {
    /// Flattened component `component` of argument `argument`.
    Argument { argument: usize, component: usize },
    Zero,
    One,
}

/// Checks the arguments of a scalar, vector or matrix constructor and returns, for every
/// component of the result, where it comes from.
///
/// A single scalar fills a vector and the diagonal of a matrix. A single matrix is resized
/// into a matrix with the identity filling the rest. Everything else is consumed component
/// by component, column-major, and every argument must contribute at least one component.
pub fn constructor_layout(ty: &Type, arguments: &[Type]) -> Result<Vec<ComponentSource>, String> {
    if !ty.is_basic() {
        return Err(format!("Cannot construct {} from a list of values", ty));
    }
    if arguments.is_empty() {
        return Err(format!("Constructor of {} needs at least one argument", ty));
    }
    if let Some(bad) = arguments.iter().find(|a| !a.is_basic()) {
        return Err(format!("Cannot construct {} from {}", ty, bad));
    }

    let single = |argument: usize, component: usize| ComponentSource::Argument {
        argument,
        component,
    };

    match (ty, arguments) {
        (Type::Scalar(_), [_]) => Ok(vec![single(0, 0)]),
        (Type::Scalar(_), _) => Err(format!("Too many arguments given to constructor of {}", ty)),
        (Type::Vector(_, n), [arg]) if arg.is_scalar() => Ok(vec![single(0, 0); *n as usize]),
        (Type::Matrix(_, cols, rows), [arg]) if arg.is_scalar() => Ok((0..*cols)
            .flat_map(|c| (0..*rows).map(move |r| (c, r)))
            .map(|(c, r)| if c == r { single(0, 0) } else { ComponentSource::Zero })
            .collect()),
        (Type::Matrix(_, cols, rows), [Type::Matrix(_, arg_cols, arg_rows)]) => Ok((0..*cols)
            .flat_map(|c| (0..*rows).map(move |r| (c, r)))
            .map(|(c, r)| {
                if c < *arg_cols && r < *arg_rows {
                    single(0, (c * arg_rows + r) as usize)
                } else if c == r {
                    ComponentSource::One
                } else {
                    ComponentSource::Zero
                }
            })
            .collect()),
        (Type::Matrix(_, _, _), _) if arguments.iter().any(|a| a.is_matrix()) => Err(format!(
            "Matrix arguments to the constructor of {} must be the only argument",
            ty
        )),
        _ => {
            let needed = ty.component_count();
            let mut sources = Vec::with_capacity(needed);
            for (i, arg) in arguments.iter().enumerate() {
                if sources.len() == needed {
                    return Err(format!(
                        "Too many arguments given to constructor of {}, only the first {} are used",
                        ty, i
                    ));
                }
                let take = arg.component_count().min(needed - sources.len());
                sources.extend((0..take).map(|k| single(i, k)));
            }
            if sources.len() < needed {
                return Err(format!(
                    "Not enough components for constructor of {}: need {}, got {}",
                    ty,
                    needed,
                    sources.len()
                ));
            }
            Ok(sources)
        }
    }
}

/// Folds a constructor call whose arguments are all constants.
pub fn construct_constant(ty: &Type, arguments: &[Value]) -> Option<Value> {
    if let Type::Struct(st) = ty {
        if st.fields.len() != arguments.len() {
            return None;
        }
        let mut components = vec![];
        for (field, arg) in st.fields.iter().zip(arguments) {
            components.extend(arg.convert(&field.ty)?.into_components());
        }
        return Some(Value::new(ty.clone(), components));
    }

    let scalar = ty.scalar()?;
    let types: Vec<_> = arguments.iter().map(|a| a.ty().clone()).collect();
    let layout = constructor_layout(ty, &types).ok()?;
    let components = layout
        .into_iter()
        .map(|source| match source {
            ComponentSource::Argument {
                argument,
                component,
            } => arguments[argument].components()[component].convert(scalar),
            ComponentSource::Zero => Component::zero(scalar),
            ComponentSource::One => Component::one(scalar),
        })
        .collect();
    Some(Value::new(ty.clone(), components))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Field, Scalar};

    fn float(v: f32) -> Value {
        Value::from_component(Component::Float(v))
    }

    fn floats(value: &Value) -> Vec<f32> {
        value
            .components()
            .iter()
            .map(|c| match c {
                Component::Float(f) => *f,
                other => panic!("not a float: {:?}", other),
            })
            .collect()
    }

    #[test]
    fn vector_from_scalar_splats() {
        let v = construct_constant(&Type::Vector(Scalar::Float, 3), &[float(2.0)]).unwrap();
        assert_eq!(floats(&v), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn vector_from_mixed_arguments() {
        let vec2 = construct_constant(&Type::Vector(Scalar::Float, 2), &[float(1.0), float(2.0)])
            .unwrap();
        let ivec = Value::from_component(Component::Int(3));
        let v = construct_constant(&Type::Vector(Scalar::Float, 3), &[vec2, ivec]).unwrap();
        assert_eq!(floats(&v), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn matrix_diagonal_and_resize() {
        let m = construct_constant(&Type::Matrix(Scalar::Float, 2, 2), &[float(3.0)]).unwrap();
        assert_eq!(floats(&m), vec![3.0, 0.0, 0.0, 3.0]);

        let big = construct_constant(&Type::Matrix(Scalar::Float, 3, 3), &[m]).unwrap();
        assert_eq!(
            floats(&big),
            vec![3.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn layout_errors() {
        let vec2 = Type::Vector(Scalar::Float, 2);
        let vec3 = Type::Vector(Scalar::Float, 3);
        assert!(constructor_layout(&vec3, &[vec2.clone()]).is_err());
        assert!(constructor_layout(&vec2, &[vec2.clone(), Type::FLOAT]).is_err());
        assert!(constructor_layout(&vec2, &[]).is_err());
        assert!(constructor_layout(&Type::FLOAT, &[Type::FLOAT, Type::FLOAT]).is_err());
        assert!(constructor_layout(
            &Type::Matrix(Scalar::Float, 2, 2),
            &[Type::Matrix(Scalar::Float, 2, 2), Type::FLOAT]
        )
        .is_err());
        // a partially used last argument is fine
        assert!(constructor_layout(&vec2, &[vec3]).is_ok());
    }

    #[test]
    fn struct_constant_converts_fields() {
        let st = Type::new_struct(
            Some("S".to_string()),
            vec![Field {
                name: "a".to_string(),
                ty: Type::FLOAT,
            }],
        );
        let v = construct_constant(&st, &[Value::from_component(Component::Int(1))]).unwrap();
        assert_eq!(v.print(), "S(1.0)");
    }
}
