use std::ops;

use crate::analyzer::{Component, Scalar, Type, Value};
use crate::lexer::TokenKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    LogicalOr,
    LogicalXor,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LeftShift,
    RightShift,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalXor => "^^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::DoublePipe => BinaryOp::LogicalOr,
            TokenKind::DoubleHat => BinaryOp::LogicalXor,
            TokenKind::DoubleAmpersand => BinaryOp::LogicalAnd,
            TokenKind::Pipe => BinaryOp::BitwiseOr,
            TokenKind::Hat => BinaryOp::BitwiseXor,
            TokenKind::Ampersand => BinaryOp::BitwiseAnd,
            TokenKind::DoubleEqual => BinaryOp::Equal,
            TokenKind::NotEqual => BinaryOp::NotEqual,
            TokenKind::LessThan => BinaryOp::Less,
            TokenKind::GreaterThan => BinaryOp::Greater,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::LeftShift => BinaryOp::LeftShift,
            TokenKind::RightShift => BinaryOp::RightShift,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    /// Binding strength, higher binds tighter. Assignment is 1, unary operators 13.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LogicalOr => 2,
            BinaryOp::LogicalXor => 3,
            BinaryOp::LogicalAnd => 4,
            BinaryOp::BitwiseOr => 5,
            BinaryOp::BitwiseXor => 6,
            BinaryOp::BitwiseAnd => 7,
            BinaryOp::Equal | BinaryOp::NotEqual => 8,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => 9,
            BinaryOp::LeftShift | BinaryOp::RightShift => 10,
            BinaryOp::Add | BinaryOp::Sub => 11,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 12,
        }
    }

    /// The operator a compound assignment token stands for.
    pub fn from_assignment(kind: &TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::PlusEqual => BinaryOp::Add,
            TokenKind::MinusEqual => BinaryOp::Sub,
            TokenKind::StarEqual => BinaryOp::Mul,
            TokenKind::SlashEqual => BinaryOp::Div,
            TokenKind::PercentEqual => BinaryOp::Mod,
            TokenKind::LeftShiftEqual => BinaryOp::LeftShift,
            TokenKind::RightShiftEqual => BinaryOp::RightShift,
            TokenKind::AmpersandEqual => BinaryOp::BitwiseAnd,
            TokenKind::PipeEqual => BinaryOp::BitwiseOr,
            TokenKind::HatEqual => BinaryOp::BitwiseXor,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOp::LogicalOr | BinaryOp::LogicalXor | BinaryOp::LogicalAnd
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::LeftShift | BinaryOp::RightShift)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::BitwiseOr | BinaryOp::BitwiseXor | BinaryOp::BitwiseAnd | BinaryOp::Mod
        )
    }

    /// `*` between matrices and vectors is linear algebra, not component-wise.
    pub fn is_linear_algebra(self, left: &Type, right: &Type) -> bool {
        self == BinaryOp::Mul
            && (left.is_matrix() && !right.is_scalar() || right.is_matrix() && !left.is_scalar())
    }

    /// Element type both operands get converted to before the operation. Shift operands keep
    /// their own types.
    pub fn operand_scalar(self, left: &Type, right: &Type) -> Option<Scalar> {
        if self.is_shift() {
            return None;
        }
        Scalar::common(left.scalar()?, right.scalar()?)
    }

    /// Type checks the operands and computes the result type. The error is a message ready
    /// for a diagnostic.
    pub fn result_type(self, left: &Type, right: &Type) -> Result<Type, String> {
        let (Some(ls), Some(rs)) = (left.scalar(), right.scalar()) else {
            return Err(format!(
                "Operator {} cannot be applied to {} and {}",
                self.symbol(),
                left,
                right
            ));
        };

        if self.is_logical() {
            if *left != Type::BOOL || *right != Type::BOOL {
                return Err(format!(
                    "Operands to {} must be bool, got {} and {}",
                    self.symbol(),
                    left,
                    right
                ));
            }
            return Ok(Type::BOOL);
        }

        if self.is_shift() {
            if !ls.is_integer() || !rs.is_integer() {
                return Err(format!("Shift operands must be integers, got {} and {}", left, right));
            }
            return match (left, right) {
                (Type::Scalar(_), Type::Scalar(_)) | (Type::Vector(_, _), Type::Scalar(_)) => {
                    Ok(left.clone())
                }
                (Type::Vector(_, n), Type::Vector(_, m)) if n == m => Ok(left.clone()),
                _ => Err(format!("Cannot shift {} by {}", left, right)),
            };
        }

        let Some(common) = Scalar::common(ls, rs) else {
            return Err(format!(
                "Operand types {} and {} do not share a common type",
                left, right
            ));
        };

        if self.is_equality() {
            let shapes_match = match (left, right) {
                (Type::Scalar(_), Type::Scalar(_)) => true,
                (Type::Vector(_, n), Type::Vector(_, m)) => n == m,
                _ => false,
            };
            if !shapes_match {
                return Err(format!("Cannot compare {} and {}", left, right));
            }
            return Ok(Type::BOOL);
        }

        if self.is_relational() {
            if !left.is_scalar() || !right.is_scalar() || !common.is_numeric() {
                return Err(format!(
                    "Operator {} only works on numeric scalars, got {} and {}",
                    self.symbol(),
                    left,
                    right
                ));
            }
            return Ok(Type::BOOL);
        }

        if !common.is_numeric() {
            return Err(format!(
                "Cannot perform arithmetic on {} and {}",
                left, right
            ));
        }
        if self.is_bitwise() && !common.is_integer() {
            return Err(format!(
                "Operator {} only works on integers, got {} and {}",
                self.symbol(),
                left,
                right
            ));
        }
        if self.is_bitwise() && (left.is_matrix() || right.is_matrix()) {
            return Err(format!("Operator {} does not work on matrices", self.symbol()));
        }

        if self.is_linear_algebra(left, right) {
            return match (left, right) {
                (Type::Matrix(_, lc, lr), Type::Matrix(_, rc, rr)) if lc == rr => {
                    Ok(Type::Matrix(common, *rc, *lr))
                }
                (Type::Matrix(_, c, r), Type::Vector(_, n)) if c == n => {
                    Ok(Type::Vector(common, *r))
                }
                (Type::Vector(_, n), Type::Matrix(_, c, r)) if r == n => {
                    Ok(Type::Vector(common, *c))
                }
                _ => Err(format!(
                    "Cannot multiply {} with {}, sizes don't match",
                    left, right
                )),
            };
        }

        match (left, right) {
            (Type::Scalar(_), other) | (other, Type::Scalar(_)) => Ok(other.with_scalar(common)),
            (Type::Vector(_, n), Type::Vector(_, m)) if n == m => Ok(left.with_scalar(common)),
            (Type::Matrix(_, lc, lr), Type::Matrix(_, rc, rr)) if lc == rc && lr == rr => {
                Ok(left.with_scalar(common))
            }
            _ => Err(format!(
                "Operand types {} and {} have different sizes",
                left, right
            )),
        }
    }

    /// Evaluates the operation on constants. `None` when the result isn't known at compile
    /// time (integer division by zero, out of range shifts, linear algebra).
    pub fn fold(self, left: &Value, right: &Value, result: &Type) -> Option<Value> {
        if self.is_linear_algebra(left.ty(), right.ty()) {
            return None;
        }

        let (lhs, rhs) = match self.operand_scalar(left.ty(), right.ty()) {
            Some(common) => (
                convert_components(left, common),
                convert_components(right, common),
            ),
            None => {
                let target = left.ty().scalar()?;
                (
                    left.components().to_vec(),
                    convert_components(right, target),
                )
            }
        };

        let count = lhs.len().max(rhs.len());
        let pick = |components: &[Component], i: usize| {
            if components.len() == 1 {
                components[0]
            } else {
                components[i]
            }
        };
        let components = (0..count)
            .map(|i| self.fold_component(pick(&lhs, i), pick(&rhs, i)))
            .collect::<Option<Vec<_>>>()?;

        // vectors compare as a whole
        if self.is_equality() {
            let value = match self {
                BinaryOp::Equal => components.iter().all(|c| *c == Component::Bool(true)),
                _ => components.iter().any(|c| *c == Component::Bool(true)),
            };
            return Some(Value::from_component(Component::Bool(value)));
        }

        Some(Value::new(result.clone(), components))
    }

    fn fold_component(self, a: Component, b: Component) -> Option<Component> {
        match (a, b) {
            (Component::Bool(a), Component::Bool(b)) => {
                let v = match self {
                    BinaryOp::LogicalAnd => a && b,
                    BinaryOp::LogicalOr => a || b,
                    BinaryOp::LogicalXor | BinaryOp::NotEqual => a != b,
                    BinaryOp::Equal => a == b,
                    _ => return None,
                };
                Some(Component::Bool(v))
            }
            (Component::Int(a), Component::Int(b)) => {
                self.fold_integer(a as i64, b as i64, |v| Component::Int(v as i32))
            }
            (Component::Uint(a), Component::Uint(b)) => {
                self.fold_integer(a as i64, b as i64, |v| Component::Uint(v as u32))
            }
            (Component::Float(a), Component::Float(b)) => self.fold_float(a, b, Component::Float),
            (Component::Double(a), Component::Double(b)) => {
                self.fold_float(a, b, Component::Double)
            }
            _ => None,
        }
    }

    /// 32 bit integers widened to i64, truncated back by `wrap`.
    fn fold_integer(self, a: i64, b: i64, wrap: fn(i64) -> Component) -> Option<Component> {
        let v = match self {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => a.checked_div(b)?,
            BinaryOp::Mod => a.checked_rem(b)?,
            BinaryOp::BitwiseAnd => a & b,
            BinaryOp::BitwiseOr => a | b,
            BinaryOp::BitwiseXor => a ^ b,
            BinaryOp::LeftShift | BinaryOp::RightShift if !(0..32).contains(&(b as u32)) => {
                return None
            }
            BinaryOp::LeftShift => a << (b as u32),
            BinaryOp::RightShift => a >> (b as u32),
            _ => return self.compare(a, b),
        };
        Some(wrap(v))
    }

    fn fold_float<T>(self, a: T, b: T, wrap: fn(T) -> Component) -> Option<Component>
    where
        T: Copy
            + PartialOrd
            + ops::Add<Output = T>
            + ops::Sub<Output = T>
            + ops::Mul<Output = T>
            + ops::Div<Output = T>,
    {
        let v = match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            _ => return self.compare(a, b),
        };
        Some(wrap(v))
    }

    fn compare<T: PartialOrd>(self, a: T, b: T) -> Option<Component> {
        let v = match self {
            BinaryOp::Equal => a == b,
            BinaryOp::NotEqual => a != b,
            BinaryOp::Less => a < b,
            BinaryOp::Greater => a > b,
            BinaryOp::LessEqual => a <= b,
            BinaryOp::GreaterEqual => a >= b,
            _ => return None,
        };
        Some(Component::Bool(v))
    }
}

fn convert_components(value: &Value, scalar: Scalar) -> Vec<Component> {
    value.components().iter().map(|c| c.convert(scalar)).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Negate,
    LogicalNot,
    BitwiseNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Negate => "-",
            UnaryOp::LogicalNot => "!",
            UnaryOp::BitwiseNot => "~",
        }
    }

    pub fn result_type(self, operand: &Type) -> Result<Type, String> {
        let ok = match (self, operand.scalar()) {
            (UnaryOp::Plus | UnaryOp::Negate, Some(s)) => s.is_numeric(),
            (UnaryOp::LogicalNot, _) => *operand == Type::BOOL,
            (UnaryOp::BitwiseNot, Some(s)) => s.is_integer() && !operand.is_matrix(),
            (_, None) => false,
        };
        if ok {
            Ok(operand.clone())
        } else {
            Err(format!(
                "Operator {} cannot be applied to {}",
                self.symbol(),
                operand
            ))
        }
    }

    pub fn fold(self, operand: &Value) -> Option<Value> {
        let components = operand
            .components()
            .iter()
            .map(|c| match (self, *c) {
                (UnaryOp::Plus, c) => Some(c),
                (UnaryOp::Negate, Component::Int(i)) => Some(Component::Int(i.wrapping_neg())),
                (UnaryOp::Negate, Component::Uint(u)) => Some(Component::Uint(u.wrapping_neg())),
                (UnaryOp::Negate, Component::Float(f)) => Some(Component::Float(-f)),
                (UnaryOp::Negate, Component::Double(d)) => Some(Component::Double(-d)),
                (UnaryOp::LogicalNot, Component::Bool(b)) => Some(Component::Bool(!b)),
                (UnaryOp::BitwiseNot, Component::Int(i)) => Some(Component::Int(!i)),
                (UnaryOp::BitwiseNot, Component::Uint(u)) => Some(Component::Uint(!u)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Value::new(operand.ty().clone(), components))
    }
}

/// `++` and `--`, before or after the operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IncDecOp {
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl IncDecOp {
    pub fn symbol(self) -> &'static str {
        match self {
            IncDecOp::PreIncrement | IncDecOp::PostIncrement => "++",
            IncDecOp::PreDecrement | IncDecOp::PostDecrement => "--",
        }
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, IncDecOp::PreIncrement | IncDecOp::PreDecrement)
    }

    pub fn is_increment(self) -> bool {
        matches!(self, IncDecOp::PreIncrement | IncDecOp::PostIncrement)
    }

    pub fn check(self, operand: &Type) -> Result<(), String> {
        match operand.scalar() {
            Some(s) if s.is_numeric() => Ok(()),
            _ => Err(format!(
                "Operator {} cannot be applied to {}",
                self.symbol(),
                operand
            )),
        }
    }
}
