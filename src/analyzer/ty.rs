use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    Int,
    Uint,
    Float,
    Double,
}

impl Scalar {
    pub fn name(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::Int => "int",
            Scalar::Uint => "uint",
            Scalar::Float => "float",
            Scalar::Double => "double",
        }
    }

    fn vector_prefix(self) -> &'static str {
        match self {
            Scalar::Bool => "b",
            Scalar::Int => "i",
            Scalar::Uint => "u",
            Scalar::Float => "",
            Scalar::Double => "d",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Scalar::Int | Scalar::Uint)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::Float | Scalar::Double)
    }

    pub fn is_numeric(self) -> bool {
        self != Scalar::Bool
    }

    /// Implicit promotion: int -> uint -> float -> double, never the other way.
    pub fn can_convert(self, source: Scalar) -> bool {
        match (self, source) {
            (t, s) if t == s => true,
            (Scalar::Uint, Scalar::Int) => true,
            (Scalar::Float, Scalar::Int | Scalar::Uint) => true,
            (Scalar::Double, Scalar::Int | Scalar::Uint | Scalar::Float) => true,
            _ => false,
        }
    }

    /// The type both operands of an arithmetic operation get promoted to.
    pub fn common(a: Scalar, b: Scalar) -> Option<Scalar> {
        if a.can_convert(b) {
            Some(a)
        } else if b.can_convert(a) {
            Some(b)
        } else {
            None
        }
    }
}

/// Types nameable by a single keyword. Copy + const-constructible so the keyword table can
/// hold them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BasicType {
    Void,
    Scalar(Scalar),
    Vector(Scalar, u32),
    Matrix(Scalar, u32, u32),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructType {
    pub name: Option<String>,
    pub fields: Vec<Field>,
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Scalar(Scalar),
    Vector(Scalar, u32),
    /// element type, columns, rows
    Matrix(Scalar, u32, u32),
    Struct(Rc<StructType>),
}

impl From<BasicType> for Type {
    fn from(basic: BasicType) -> Self {
        match basic {
            BasicType::Void => Type::Void,
            BasicType::Scalar(s) => Type::Scalar(s),
            BasicType::Vector(s, n) => Type::Vector(s, n),
            BasicType::Matrix(s, c, r) => Type::Matrix(s, c, r),
        }
    }
}

impl Type {
    pub const BOOL: Type = Type::Scalar(Scalar::Bool);
    pub const INT: Type = Type::Scalar(Scalar::Int);
    pub const UINT: Type = Type::Scalar(Scalar::Uint);
    pub const FLOAT: Type = Type::Scalar(Scalar::Float);
    pub const DOUBLE: Type = Type::Scalar(Scalar::Double);

    pub fn new_struct(name: Option<String>, fields: Vec<Field>) -> Self {
        Type::Struct(Rc::new(StructType { name, fields }))
    }

    pub fn name(&self) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Scalar(s) => s.name().to_string(),
            Type::Vector(s, n) => format!("{}vec{}", s.vector_prefix(), n),
            Type::Matrix(s, c, r) if c == r => format!("{}mat{}", s.vector_prefix(), c),
            Type::Matrix(s, c, r) => format!("{}mat{}x{}", s.vector_prefix(), c, r),
            Type::Struct(st) => st.name.clone().unwrap_or_else(|| "struct".to_string()),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Scalar(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector(_, _))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Type::Matrix(_, _, _))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    /// Scalars, vectors and matrices: the types with built-in constructors.
    pub fn is_basic(&self) -> bool {
        self.scalar().is_some()
    }

    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            Type::Scalar(s) | Type::Vector(s, _) | Type::Matrix(s, _, _) => Some(*s),
            Type::Void | Type::Struct(_) => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(st) => Some(st),
            _ => None,
        }
    }

    /// Vector size or matrix column count.
    pub fn length(&self) -> u32 {
        match self {
            Type::Vector(_, n) => *n,
            Type::Matrix(_, c, _) => *c,
            Type::Struct(st) => st.fields.len() as u32,
            Type::Scalar(_) => 1,
            Type::Void => 0,
        }
    }

    pub fn component_count(&self) -> usize {
        match self {
            Type::Void => 0,
            Type::Scalar(_) => 1,
            Type::Vector(_, n) => *n as usize,
            Type::Matrix(_, c, r) => (*c * *r) as usize,
            Type::Struct(st) => st.fields.iter().map(|f| f.ty.component_count()).sum(),
        }
    }

    /// Same shape, different element type.
    pub fn with_scalar(&self, scalar: Scalar) -> Type {
        match self {
            Type::Scalar(_) => Type::Scalar(scalar),
            Type::Vector(_, n) => Type::Vector(scalar, *n),
            Type::Matrix(_, c, r) => Type::Matrix(scalar, *c, *r),
            t => t.clone(),
        }
    }

    pub fn can_convert(&self, source: &Type) -> bool {
        self.conversion_cost(source).is_some()
    }

    /// 0 for identical types, 1 for an implicit promotion, `None` when not convertible.
    pub fn conversion_cost(&self, source: &Type) -> Option<u32> {
        if self == source {
            return Some(0);
        }
        let convertible = match (self, source) {
            (Type::Scalar(t), Type::Scalar(s)) => t.can_convert(*s),
            (Type::Vector(t, n), Type::Vector(s, m)) => n == m && t.can_convert(*s),
            (Type::Matrix(t, c1, r1), Type::Matrix(s, c2, r2)) => {
                c1 == c2 && r1 == r2 && t.can_convert(*s)
            }
            _ => false,
        };
        convertible.then_some(1)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Caller access of a parameter (`in`, `out`, `inout`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Access {
    #[default]
    Default,
    In,
    Out,
    InOut,
}

impl Access {
    pub fn reads(self) -> bool {
        !matches!(self, Access::Out)
    }

    pub fn writes(self) -> bool {
        matches!(self, Access::Out | Access::InOut)
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Access::Default => None,
            Access::In => Some("in"),
            Access::Out => Some("out"),
            Access::InOut => Some("inout"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Storage {
    #[default]
    Function,
    Private,
    Input,
    Output,
}

impl Storage {
    pub fn is_global(self) -> bool {
        self != Storage::Function
    }
}

/// A value type decorated with how it is stored and who may access it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PointerType {
    ty: Type,
    is_pointer: bool,
    access: Access,
    storage: Storage,
}

impl PointerType {
    pub fn new(ty: Type, is_pointer: bool, access: Access) -> Self {
        Self {
            ty,
            is_pointer,
            access,
            storage: Storage::Function,
        }
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_pointer(&self) -> bool {
        self.is_pointer
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn storage(&self) -> Storage {
        self.storage
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.access.keyword() {
            write!(f, "{} ", keyword)?;
        }
        write!(f, "{}", self.ty)
    }
}
