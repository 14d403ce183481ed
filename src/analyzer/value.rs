use super::{Scalar, Type};

/// One scalar slot of a constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Component {
    Bool(bool),
    Int(i32),
    Uint(u32),
    Float(f32),
    Double(f64),
}

impl Component {
    pub fn zero(scalar: Scalar) -> Self {
        Component::Int(0).convert(scalar)
    }

    pub fn one(scalar: Scalar) -> Self {
        Component::Int(1).convert(scalar)
    }

    pub fn scalar(self) -> Scalar {
        match self {
            Component::Bool(_) => Scalar::Bool,
            Component::Int(_) => Scalar::Int,
            Component::Uint(_) => Scalar::Uint,
            Component::Float(_) => Scalar::Float,
            Component::Double(_) => Scalar::Double,
        }
    }

    /// Explicit conversion, as done by constructors. Any scalar kind to any other.
    pub fn convert(self, target: Scalar) -> Component {
        match target {
            Scalar::Bool => Component::Bool(match self {
                Component::Bool(b) => b,
                Component::Int(i) => i != 0,
                Component::Uint(u) => u != 0,
                Component::Float(f) => f != 0.0,
                Component::Double(d) => d != 0.0,
            }),
            Scalar::Int => Component::Int(match self {
                Component::Bool(b) => b as i32,
                Component::Int(i) => i,
                Component::Uint(u) => u as i32,
                Component::Float(f) => f as i32,
                Component::Double(d) => d as i32,
            }),
            Scalar::Uint => Component::Uint(match self {
                Component::Bool(b) => b as u32,
                Component::Int(i) => i as u32,
                Component::Uint(u) => u,
                Component::Float(f) => f as u32,
                Component::Double(d) => d as u32,
            }),
            Scalar::Float => Component::Float(match self {
                Component::Bool(b) => b as u32 as f32,
                Component::Int(i) => i as f32,
                Component::Uint(u) => u as f32,
                Component::Float(f) => f,
                Component::Double(d) => d as f32,
            }),
            Scalar::Double => Component::Double(match self {
                Component::Bool(b) => b as u32 as f64,
                Component::Int(i) => i as f64,
                Component::Uint(u) => u as f64,
                Component::Float(f) => f as f64,
                Component::Double(d) => d,
            }),
        }
    }

    /// Raw bit pattern, used to memoize constants.
    pub fn bits(self) -> u64 {
        match self {
            Component::Bool(b) => b as u64,
            Component::Int(i) => i as u32 as u64,
            Component::Uint(u) => u as u64,
            Component::Float(f) => f.to_bits() as u64,
            Component::Double(d) => d.to_bits(),
        }
    }

    pub fn print(self) -> String {
        match self {
            Component::Bool(b) => b.to_string(),
            Component::Int(i) => i.to_string(),
            Component::Uint(u) => format!("{}u", u),
            Component::Float(f) if f.is_finite() => format!("{:?}", f),
            Component::Double(d) if d.is_finite() => format!("{:?}lf", d),
            Component::Float(f) => print_non_finite(f as f64, ""),
            Component::Double(d) => print_non_finite(d, "lf"),
        }
    }
}

/// Infinities and NaN have no literal, so they are written as the division producing them.
fn print_non_finite(v: f64, suffix: &str) -> String {
    let dividend = if v.is_nan() {
        "0.0"
    } else if v < 0.0 {
        "-1.0"
    } else {
        "1.0"
    };
    format!("({}{} / 0.0{})", dividend, suffix, suffix)
}

/// A compile-time constant of some type. Components are stored flattened: vectors in order,
/// matrices column-major, structs field after field.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    ty: Type,
    components: Vec<Component>,
}

impl Value {
    pub fn new(ty: Type, components: Vec<Component>) -> Self {
        debug_assert_eq!(ty.component_count(), components.len());
        Self { ty, components }
    }

    pub fn from_component(component: Component) -> Self {
        Self {
            ty: Type::Scalar(component.scalar()),
            components: vec![component],
        }
    }

    pub fn zero(ty: &Type) -> Self {
        let components = match ty {
            Type::Struct(st) => st
                .fields
                .iter()
                .flat_map(|f| Value::zero(&f.ty).components)
                .collect(),
            t => match t.scalar() {
                Some(s) => vec![Component::zero(s); t.component_count()],
                None => vec![],
            },
        };
        Self::new(ty.clone(), components)
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    /// Implicit conversion to `target`. `None` when `target` can't be promoted to.
    pub fn convert(&self, target: &Type) -> Option<Value> {
        if !target.can_convert(&self.ty) {
            return None;
        }
        let Some(scalar) = target.scalar() else {
            return Some(Value::new(target.clone(), self.components.clone()));
        };
        let components = self.components.iter().map(|c| c.convert(scalar)).collect();
        Some(Value::new(target.clone(), components))
    }

    /// Vector element, matrix column or struct field.
    pub fn extract(&self, index: usize) -> Option<Value> {
        match &self.ty {
            Type::Vector(s, _) => {
                let c = *self.components.get(index)?;
                Some(Value::new(Type::Scalar(*s), vec![c]))
            }
            Type::Matrix(s, _, r) => {
                let r = *r as usize;
                let column = self.components.get(index * r..(index + 1) * r)?;
                Some(Value::new(Type::Vector(*s, r as u32), column.to_vec()))
            }
            Type::Struct(st) => {
                let field = st.fields.get(index)?;
                let start: usize = st.fields[..index]
                    .iter()
                    .map(|f| f.ty.component_count())
                    .sum();
                let end = start + field.ty.component_count();
                Some(Value::new(
                    field.ty.clone(),
                    self.components[start..end].to_vec(),
                ))
            }
            _ => None,
        }
    }

    /// Renders the constant as source text that parses back to the same value.
    pub fn print(&self) -> String {
        match &self.ty {
            Type::Scalar(_) => self.components[0].print(),
            Type::Vector(_, _) | Type::Matrix(_, _, _) => {
                let args: Vec<_> = self.components.iter().map(|c| c.print()).collect();
                format!("{}({})", self.ty.name(), args.join(", "))
            }
            Type::Struct(st) => {
                let args: Vec<_> = (0..st.fields.len())
                    .filter_map(|i| self.extract(i))
                    .map(|v| v.print())
                    .collect();
                format!("{}({})", self.ty.name(), args.join(", "))
            }
            Type::Void => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Field;

    #[test]
    fn convert_promotes_components() {
        let v = Value::from_component(Component::Int(2));
        let f = v.convert(&Type::FLOAT).unwrap();
        assert_eq!(f.components(), &[Component::Float(2.0)]);
        assert!(f.convert(&Type::INT).is_none());
    }

    #[test]
    fn explicit_component_conversions() {
        assert_eq!(Component::Float(2.7).convert(Scalar::Int), Component::Int(2));
        assert_eq!(Component::Int(0).convert(Scalar::Bool), Component::Bool(false));
        assert_eq!(Component::Bool(true).convert(Scalar::Double), Component::Double(1.0));
    }

    #[test]
    fn extract_matrix_column_and_struct_field() {
        let m = Value::new(
            Type::Matrix(Scalar::Float, 2, 2),
            [1.0, 2.0, 3.0, 4.0].into_iter().map(Component::Float).collect(),
        );
        let column = m.extract(1).unwrap();
        assert_eq!(column.ty(), &Type::Vector(Scalar::Float, 2));
        assert_eq!(column.components(), &[Component::Float(3.0), Component::Float(4.0)]);

        let st = Type::new_struct(
            Some("S".into()),
            vec![
                Field { name: "a".into(), ty: Type::INT },
                Field { name: "b".into(), ty: Type::Vector(Scalar::Float, 2) },
            ],
        );
        let v = Value::new(
            st,
            vec![Component::Int(1), Component::Float(2.0), Component::Float(3.0)],
        );
        assert_eq!(v.extract(1).unwrap().print(), "vec2(2.0, 3.0)");
        assert_eq!(v.print(), "S(1, vec2(2.0, 3.0))");
    }

    #[test]
    fn print_literals() {
        assert_eq!(Value::from_component(Component::Uint(3)).print(), "3u");
        assert_eq!(Value::from_component(Component::Float(1.0)).print(), "1.0");
        assert_eq!(Value::from_component(Component::Double(0.5)).print(), "0.5lf");
        assert_eq!(Component::Float(f32::INFINITY).print(), "(1.0 / 0.0)");
        assert_eq!(Component::Double(f64::NEG_INFINITY).print(), "(-1.0lf / 0.0lf)");
        assert_eq!(Component::Float(f32::NAN).print(), "(0.0 / 0.0)");
    }
}
