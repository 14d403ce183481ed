use std::rc::Rc;

use log::trace;

use crate::analyzer::{
    construct_constant, constructor_layout, Component, Function, FunctionMatcher, MatchError,
    Scope, Storage, Type, Value, Variable,
};
use crate::error::DiagnosticKind;
use crate::lexer::{Preprocessor, TokenKind};

use super::{BinaryOp, IncDecOp, UnaryOp};

const SWIZZLE_SETS: [&str; 3] = ["xyzw", "rgba", "stpq"];

/// What a call expression calls.
#[derive(Clone, Debug)]
pub enum Callee {
    /// `T(...)` where `T` names a type.
    Constructor(Type),
    /// A function name, resolved against the overloads visible in scope.
    Named(String),
}

#[derive(Debug)]
pub enum Expression {
    Constant(Value),
    Reference(Rc<Variable>),
    /// `lvalue = rvalue`, or `lvalue op= rvalue` when `op` is set.
    Assignment {
        op: Option<BinaryOp>,
        lvalue: Box<Expression>,
        rvalue: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        ty: Type,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    IncDec {
        op: IncDecOp,
        operand: Box<Expression>,
    },
    Call {
        function: Rc<Function>,
        arguments: Vec<Expression>,
    },
    Member {
        expr: Box<Expression>,
        index: usize,
        ty: Type,
    },
    Swizzle {
        expr: Box<Expression>,
        components: Vec<u32>,
        name: String,
        ty: Type,
    },
    /// Stands in for something that failed to parse or type check. The failure has been
    /// reported already, so checks involving it are skipped.
    Error(Type),
}

impl Expression {
    /// expression = assignment
    pub fn parse(scope: &Scope, stream: &mut Preprocessor) -> Expression {
        Self::parse_assignment(scope, stream)
    }

    /// assignment = binary
    ///            | binary ("=" | "+=" | "-=" | "*=" | "/=" | "%=" | "<<=" | ">>="
    ///                      | "&=" | "|=" | "^=") assignment
    pub fn parse_assignment(scope: &Scope, stream: &mut Preprocessor) -> Expression {
        let lvalue = Self::parse_binary(scope, stream, 2);

        let kind = stream.peek().kind.clone();
        let op = match kind {
            TokenKind::Equal => None,
            ref kind => match BinaryOp::from_assignment(kind) {
                Some(op) => Some(op),
                None => return lvalue,
            },
        };
        stream.consume();

        let rvalue = Self::parse_assignment(scope, stream);
        Self::new_assignment(stream, op, lvalue, rvalue)
    }

    /// binary = unary (binary_op unary)*
    ///
    /// Operators of at least `min_precedence` are folded in here, left associative; see
    /// `BinaryOp::precedence` for the table.
    fn parse_binary(scope: &Scope, stream: &mut Preprocessor, min_precedence: u8) -> Expression {
        let mut left = Self::parse_unary(scope, stream);

        while let Some(op) = BinaryOp::from_token(&stream.peek().kind) {
            if op.precedence() < min_precedence {
                break;
            }
            stream.consume();
            let right = Self::parse_binary(scope, stream, op.precedence() + 1);
            left = Self::new_binary(stream, op, left, right);
        }

        left
    }

    /// unary = ("+" | "-" | "!" | "~") unary
    ///       | ("++" | "--") unary
    ///       | postfix
    fn parse_unary(scope: &Scope, stream: &mut Preprocessor) -> Expression {
        let op = match stream.peek().kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Not => UnaryOp::LogicalNot,
            TokenKind::Tilde => UnaryOp::BitwiseNot,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if stream.peek().is(&TokenKind::PlusPlus) {
                    IncDecOp::PreIncrement
                } else {
                    IncDecOp::PreDecrement
                };
                stream.consume();
                let operand = Self::parse_unary(scope, stream);
                return Self::new_inc_dec(stream, op, operand);
            }
            _ => return Self::parse_postfix(scope, stream),
        };
        stream.consume();

        let operand = Self::parse_unary(scope, stream);
        if operand.is_error() {
            return operand;
        }
        match op.result_type(&operand.ty()) {
            Ok(_) => Expression::Unary {
                op,
                operand: Box::new(operand),
            },
            Err(message) => {
                stream.error(DiagnosticKind::TypeMismatch, message);
                Expression::Error(operand.ty())
            }
        }
    }

    /// postfix = primary ("." ident | "++" | "--")*
    fn parse_postfix(scope: &Scope, stream: &mut Preprocessor) -> Expression {
        let mut expr = Self::parse_primary(scope, stream);

        loop {
            match stream.peek().kind {
                TokenKind::Dot => {
                    stream.consume();
                    let Some(name) = stream.peek().ident().map(str::to_string) else {
                        stream.error(DiagnosticKind::Syntax, "Expected a member name after \".\"");
                        return Expression::Error(expr.ty());
                    };
                    expr = Self::new_selection(stream, expr, name);
                    stream.consume();
                }
                TokenKind::PlusPlus => {
                    stream.consume();
                    expr = Self::new_inc_dec(stream, IncDecOp::PostIncrement, expr);
                }
                TokenKind::MinusMinus => {
                    stream.consume();
                    expr = Self::new_inc_dec(stream, IncDecOp::PostDecrement, expr);
                }
                _ => return expr,
            }
        }
    }

    /// primary = int_const | uint_const | float_const | double_const | "true" | "false"
    ///         | ident
    ///         | ident "(" arguments ")"
    ///         | builtin_type "(" arguments ")"
    ///         | "(" expression ")"
    fn parse_primary(scope: &Scope, stream: &mut Preprocessor) -> Expression {
        let token = stream.peek().clone();
        let constant = |c| Expression::Constant(Value::from_component(c));

        match token.kind {
            TokenKind::IntConst(i) => {
                stream.consume();
                constant(Component::Int(i))
            }
            TokenKind::UintConst(u) => {
                stream.consume();
                constant(Component::Uint(u))
            }
            TokenKind::FloatConst(f) => {
                stream.consume();
                constant(Component::Float(f))
            }
            TokenKind::DoubleConst(d) => {
                stream.consume();
                constant(Component::Double(d))
            }
            TokenKind::True | TokenKind::False => {
                stream.consume();
                constant(Component::Bool(token.is(&TokenKind::True)))
            }
            TokenKind::LeftParen => {
                stream.consume();
                let expr = Self::parse(scope, stream);
                if !stream.expect(&TokenKind::RightParen, "after expression") {
                    return Expression::Error(expr.ty());
                }
                expr
            }
            TokenKind::BuiltinType(basic) => {
                stream.consume();
                Self::parse_function_call(scope, stream, Callee::Constructor(Type::from(basic)))
            }
            TokenKind::Ident(name) => {
                if stream.peek_nth(1).is(&TokenKind::LeftParen) {
                    stream.consume();
                    let callee = match scope.lookup_type(&name) {
                        Some(ty) => Callee::Constructor(ty.clone()),
                        None => Callee::Named(name),
                    };
                    return Self::parse_function_call(scope, stream, callee);
                }
                let expr = match scope.lookup_variable(&name) {
                    Some(variable) => Expression::Reference(variable.clone()),
                    None => {
                        stream.error(
                            DiagnosticKind::Scope,
                            format!("No variable named \"{}\"", name),
                        );
                        Expression::Error(Type::Void)
                    }
                };
                stream.consume();
                expr
            }
            kind => {
                stream.error(
                    DiagnosticKind::Syntax,
                    format!("Expected an expression, got \"{}\"", kind),
                );
                Expression::Error(Type::Void)
            }
        }
    }

    /// call = "(" (assignment ("," assignment)*)? ")"
    ///
    /// The callee has been consumed already. Constructors of scalars, vectors and matrices
    /// are checked by their component layout, everything else through overload matching,
    /// narrowed down argument by argument.
    pub fn parse_function_call(
        scope: &Scope,
        stream: &mut Preprocessor,
        callee: Callee,
    ) -> Expression {
        let (name, candidates) = match &callee {
            Callee::Constructor(ty) => (ty.name(), vec![Function::new_constructor(ty.clone())]),
            Callee::Named(name) => (name.clone(), scope.lookup_functions(name)),
        };
        let fallback = candidates
            .first()
            .map(|f| f.return_type().clone())
            .unwrap_or(Type::Void);
        let builtin = matches!(&callee, Callee::Constructor(ty) if !ty.is_struct());
        trace!("call to {} with {} candidates", name, candidates.len());

        if !stream.expect(&TokenKind::LeftParen, "to start the argument list") {
            return Expression::Error(fallback);
        }

        if candidates.is_empty() {
            stream.error(
                DiagnosticKind::Scope,
                format!("No function named \"{}\"", name),
            );
        }
        let mut matcher = FunctionMatcher::new(candidates.clone());
        let mut failed = candidates.is_empty();
        let mut arguments = vec![];

        if !stream.consume_if(&TokenKind::RightParen) {
            loop {
                let argument = Self::parse_assignment(scope, stream);
                failed |= argument.is_error();
                if !failed && !builtin {
                    matcher.match_argument(arguments.len(), &argument.ty());
                    if !matcher.has_matches() {
                        stream.error(
                            DiagnosticKind::TypeMismatch,
                            format!(
                                "No overload of \"{}\" takes a {} as argument {}",
                                name,
                                argument.ty(),
                                arguments.len() + 1
                            ),
                        );
                        failed = true;
                    }
                }
                arguments.push(argument);

                if stream.consume_if(&TokenKind::Comma) {
                    continue;
                }
                if !stream.expect(&TokenKind::RightParen, "to end the argument list") {
                    return Expression::Error(fallback);
                }
                break;
            }
        }

        if failed {
            return Expression::Error(fallback);
        }

        if builtin {
            let ty = fallback;
            let types: Vec<_> = arguments.iter().map(|a| a.ty()).collect();
            if let Err(message) = constructor_layout(&ty, &types) {
                stream.error(DiagnosticKind::TypeMismatch, message);
                return Expression::Error(ty);
            }
            return Expression::Call {
                function: Function::new_constructor(ty),
                arguments,
            };
        }

        matcher.match_n_arguments(arguments.len());
        let function = match matcher.best_match() {
            Ok((function, _)) => function,
            Err(MatchError::NoMatch) => {
                stream.error(
                    DiagnosticKind::TypeMismatch,
                    format!("No overload of \"{}\" takes {} arguments", name, arguments.len()),
                );
                return Expression::Error(fallback);
            }
            Err(MatchError::Ambiguous(n)) => {
                stream.error(
                    DiagnosticKind::TypeMismatch,
                    format!("Call to \"{}\" is ambiguous, {} overloads match", name, n),
                );
                return Expression::Error(fallback);
            }
        };

        for (i, argument) in arguments.iter().enumerate() {
            let writes = function
                .parameter(i)
                .map(|(_, access)| access.writes())
                .unwrap_or(false);
            if writes && !argument.check_writable(stream) {
                return Expression::Error(function.return_type().clone());
            }
        }

        Expression::Call {
            function,
            arguments,
        }
    }

    fn new_binary(
        stream: &mut Preprocessor,
        op: BinaryOp,
        left: Expression,
        right: Expression,
    ) -> Expression {
        if left.is_error() || right.is_error() {
            return Expression::Error(Type::Void);
        }
        match op.result_type(&left.ty(), &right.ty()) {
            Ok(ty) => Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty,
            },
            Err(message) => {
                stream.error(DiagnosticKind::TypeMismatch, message);
                Expression::Error(Type::Void)
            }
        }
    }

    fn new_inc_dec(stream: &mut Preprocessor, op: IncDecOp, operand: Expression) -> Expression {
        if operand.is_error() {
            return operand;
        }
        let ty = operand.ty();
        if let Err(message) = op.check(&ty) {
            stream.error(DiagnosticKind::TypeMismatch, message);
            return Expression::Error(ty);
        }
        if !operand.check_writable(stream) {
            return Expression::Error(ty);
        }
        Expression::IncDec {
            op,
            operand: Box::new(operand),
        }
    }

    fn new_assignment(
        stream: &mut Preprocessor,
        op: Option<BinaryOp>,
        lvalue: Expression,
        rvalue: Expression,
    ) -> Expression {
        let target = lvalue.ty();
        if lvalue.is_error() || rvalue.is_error() || !lvalue.check_writable(stream) {
            return Expression::Error(target);
        }

        let source = match op {
            None => rvalue.ty(),
            Some(op) => match op.result_type(&target, &rvalue.ty()) {
                Ok(ty) => ty,
                Err(message) => {
                    stream.error(DiagnosticKind::TypeMismatch, message);
                    return Expression::Error(target);
                }
            },
        };
        if !target.can_convert(&source) {
            stream.error(
                DiagnosticKind::TypeMismatch,
                format!("Cannot assign a value of type {} to {}", source, target),
            );
            return Expression::Error(target);
        }

        Expression::Assignment {
            op,
            lvalue: Box::new(lvalue),
            rvalue: Box::new(rvalue),
        }
    }

    /// `expr.name`: a struct member or a vector swizzle.
    fn new_selection(stream: &mut Preprocessor, expr: Expression, name: String) -> Expression {
        if expr.is_error() {
            return expr;
        }
        let ty = expr.ty();

        match &ty {
            Type::Struct(st) => match st.field(&name) {
                Some((index, field)) => Expression::Member {
                    ty: field.ty.clone(),
                    expr: Box::new(expr),
                    index,
                },
                None => {
                    stream.error(
                        DiagnosticKind::TypeMismatch,
                        format!("Struct {} has no member named \"{}\"", ty, name),
                    );
                    Expression::Error(Type::Void)
                }
            },
            Type::Vector(scalar, n) => match parse_swizzle(&name, *n) {
                Some(components) => Expression::Swizzle {
                    ty: if components.len() == 1 {
                        Type::Scalar(*scalar)
                    } else {
                        Type::Vector(*scalar, components.len() as u32)
                    },
                    expr: Box::new(expr),
                    components,
                    name,
                },
                None => {
                    stream.error(
                        DiagnosticKind::TypeMismatch,
                        format!("Invalid swizzle \"{}\" for {}", name, ty),
                    );
                    Expression::Error(Type::Void)
                }
            },
            _ => {
                stream.error(
                    DiagnosticKind::TypeMismatch,
                    format!("Cannot access members of {}", ty),
                );
                Expression::Error(Type::Void)
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expression::Error(_))
    }

    pub fn ty(&self) -> Type {
        match self {
            Expression::Constant(value) => value.ty().clone(),
            Expression::Reference(variable) => variable.ty().clone(),
            Expression::Assignment { lvalue, .. } => lvalue.ty(),
            Expression::Unary { operand, .. } | Expression::IncDec { operand, .. } => {
                operand.ty()
            }
            Expression::Call { function, .. } => function.return_type().clone(),
            Expression::Binary { ty, .. }
            | Expression::Member { ty, .. }
            | Expression::Swizzle { ty, .. }
            | Expression::Error(ty) => ty.clone(),
        }
    }

    /// The value of the expression if it can be computed at compile time.
    pub fn constant(&self) -> Option<Value> {
        match self {
            Expression::Constant(value) => Some(value.clone()),
            Expression::Reference(variable) => variable.constant_value().cloned(),
            Expression::Binary {
                op,
                left,
                right,
                ty,
            } => op.fold(&left.constant()?, &right.constant()?, ty),
            Expression::Unary { op, operand } => op.fold(&operand.constant()?),
            Expression::Call {
                function,
                arguments,
            } => match &**function {
                Function::Constructor(ty) => {
                    let values = arguments
                        .iter()
                        .map(|a| a.constant())
                        .collect::<Option<Vec<_>>>()?;
                    construct_constant(ty, &values)
                }
                Function::Declared(_) => None,
            },
            Expression::Member { expr, index, .. } => expr.constant()?.extract(*index),
            Expression::Swizzle {
                expr,
                components,
                ty,
                ..
            } => {
                let value = expr.constant()?;
                let picked = components
                    .iter()
                    .map(|&c| value.components()[c as usize])
                    .collect();
                Some(Value::new(ty.clone(), picked))
            }
            Expression::Assignment { .. } | Expression::IncDec { .. } | Expression::Error(_) => {
                None
            }
        }
    }

    /// The variable written to when assigning to this expression, if it can be assigned to.
    pub fn lvalue_variable(&self) -> Option<&Rc<Variable>> {
        match self {
            Expression::Reference(variable) => Some(variable),
            Expression::Member { expr, .. } => expr.lvalue_variable(),
            Expression::Swizzle {
                expr, components, ..
            } => {
                let unique = components
                    .iter()
                    .enumerate()
                    .all(|(i, c)| !components[..i].contains(c));
                if unique {
                    expr.lvalue_variable()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn check_writable(&self, stream: &mut Preprocessor) -> bool {
        let Some(variable) = self.lvalue_variable() else {
            stream.error(
                DiagnosticKind::Syntax,
                format!("Cannot assign to \"{}\"", self.print()),
            );
            return false;
        };
        let name = variable.name().unwrap_or_default();
        if variable.is_const() {
            stream.error(
                DiagnosticKind::Constant,
                format!("Cannot assign to constant \"{}\"", name),
            );
            false
        } else if variable.pointer_type().storage() == Storage::Input {
            stream.error(
                DiagnosticKind::Constant,
                format!("Cannot assign to input variable \"{}\"", name),
            );
            false
        } else {
            true
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Assignment { .. } => 1,
            Expression::Binary { op, .. } => op.precedence(),
            Expression::Unary { .. } => 13,
            Expression::IncDec { op, .. } if op.is_prefix() => 13,
            Expression::Constant(value) if value.print().starts_with('-') => 13,
            _ => 14,
        }
    }

    fn print_operand(&self, min_precedence: u8) -> String {
        let s = self.print();
        if self.precedence() < min_precedence {
            format!("({})", s)
        } else {
            s
        }
    }

    /// Renders the expression as source text, adding parentheses where precedence needs
    /// them.
    pub fn print(&self) -> String {
        match self {
            Expression::Constant(value) => value.print(),
            Expression::Reference(variable) => variable.name().unwrap_or_default().to_string(),
            Expression::Assignment { op, lvalue, rvalue } => format!(
                "{} {}= {}",
                lvalue.print_operand(13),
                op.map(|op| op.symbol()).unwrap_or_default(),
                rvalue.print_operand(1)
            ),
            Expression::Binary {
                op, left, right, ..
            } => format!(
                "{} {} {}",
                left.print_operand(op.precedence()),
                op.symbol(),
                right.print_operand(op.precedence() + 1)
            ),
            Expression::Unary { op, operand } => {
                let s = operand.print_operand(13);
                if s.starts_with(['-', '+']) {
                    format!("{}({})", op.symbol(), s)
                } else {
                    format!("{}{}", op.symbol(), s)
                }
            }
            Expression::IncDec { op, operand } if op.is_prefix() => {
                format!("{}{}", op.symbol(), operand.print_operand(14))
            }
            Expression::IncDec { op, operand } => {
                format!("{}{}", operand.print_operand(14), op.symbol())
            }
            Expression::Call {
                function,
                arguments,
            } => {
                let args: Vec<_> = arguments.iter().map(|a| a.print()).collect();
                format!("{}({})", function.name(), args.join(", "))
            }
            Expression::Member { expr, index, .. } => {
                let ty = expr.ty();
                let field = ty
                    .as_struct()
                    .and_then(|st| st.fields.get(*index))
                    .map(|f| f.name.clone())
                    .unwrap_or_default();
                format!("{}.{}", expr.print_operand(14), field)
            }
            Expression::Swizzle { expr, name, .. } => {
                format!("{}.{}", expr.print_operand(14), name)
            }
            Expression::Error(_) => "/* error */".to_string(),
        }
    }
}

/// Component indices of a swizzle like `xzy` on a vector of `size` components.
fn parse_swizzle(name: &str, size: u32) -> Option<Vec<u32>> {
    let first = name.chars().next()?;
    let set = SWIZZLE_SETS.iter().find(|set| set.contains(first))?;
    if name.chars().count() > 4 {
        return None;
    }
    name.chars()
        .map(|c| {
            let index = set.find(c)? as u32;
            (index < size).then_some(index)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Access, PointerType, Scalar};

    fn scope_with(variables: &[(&str, Type, bool)]) -> Scope<'static> {
        let mut scope = Scope::new(None, None);
        for (name, ty, is_const) in variables {
            let initial = is_const.then(|| Value::zero(ty));
            scope.add_variable(Variable::new(
                PointerType::new(ty.clone(), true, Access::Default),
                Some(name.to_string()),
                initial,
                *is_const,
            ));
        }
        scope
    }

    fn parse(scope: &Scope, source: &str) -> (Expression, Preprocessor) {
        let mut stream = Preprocessor::new(source);
        let expr = Expression::parse(scope, &mut stream);
        (expr, stream)
    }

    #[test]
    fn precedence_and_folding() {
        let scope = scope_with(&[]);
        let (expr, stream) = parse(&scope, "1 + 2 * 3 - 4");
        assert!(!stream.has_errors());
        assert_eq!(expr.ty(), Type::INT);
        assert_eq!(expr.constant().unwrap().components(), &[Component::Int(3)]);
        assert_eq!(expr.print(), "1 + 2 * 3 - 4");

        let (expr, _) = parse(&scope, "(1 + 2) * 3");
        assert_eq!(expr.print(), "(1 + 2) * 3");
        assert_eq!(expr.constant().unwrap().components(), &[Component::Int(9)]);

        let (expr, _) = parse(&scope, "1 - (2 - 3)");
        assert_eq!(expr.print(), "1 - (2 - 3)");
    }

    #[test]
    fn promotion_in_binary_expressions() {
        let scope = scope_with(&[("v", Type::Vector(Scalar::Float, 2), false)]);
        let (expr, stream) = parse(&scope, "v * 2");
        assert!(!stream.has_errors());
        assert_eq!(expr.ty(), Type::Vector(Scalar::Float, 2));
        assert!(expr.constant().is_none());
    }

    #[test]
    fn constructors() {
        let scope = scope_with(&[]);
        let (expr, stream) = parse(&scope, "vec3(vec2(1, 2), 3).zy");
        assert!(!stream.has_errors());
        assert_eq!(expr.ty(), Type::Vector(Scalar::Float, 2));
        assert_eq!(
            expr.constant().unwrap().components(),
            &[Component::Float(3.0), Component::Float(2.0)]
        );

        let (expr, stream) = parse(&scope, "vec3(1, 2)");
        assert!(expr.is_error());
        assert_eq!(stream.diagnostics()[0].kind, DiagnosticKind::TypeMismatch);
    }

    #[test]
    fn assignments_need_writable_targets() {
        let scope = scope_with(&[("x", Type::FLOAT, false), ("k", Type::FLOAT, true)]);

        let (expr, stream) = parse(&scope, "x += 2");
        assert!(!stream.has_errors());
        assert_eq!(expr.print(), "x += 2");

        let (expr, stream) = parse(&scope, "k = 1.0");
        assert!(expr.is_error());
        assert_eq!(stream.diagnostics()[0].kind, DiagnosticKind::Constant);

        let (_, stream) = parse(&scope, "1 = x");
        assert_eq!(stream.diagnostics()[0].kind, DiagnosticKind::Syntax);
    }

    #[test]
    fn swizzles() {
        let scope = scope_with(&[("v", Type::Vector(Scalar::Float, 4), false)]);
        let (expr, stream) = parse(&scope, "v.rgb");
        assert!(!stream.has_errors());
        assert_eq!(expr.ty(), Type::Vector(Scalar::Float, 3));
        assert!(expr.lvalue_variable().is_some());

        let (expr, _) = parse(&scope, "v.xx");
        assert!(expr.lvalue_variable().is_none());

        let (_, stream) = parse(&scope, "v.xr");
        assert_eq!(stream.diagnostics().len(), 1);
        assert_eq!(parse_swizzle("w", 3), None);
    }

    #[test]
    fn unknown_names_are_reported_once() {
        let scope = scope_with(&[]);
        let (expr, stream) = parse(&scope, "y + 1 * 2");
        assert!(expr.is_error());
        assert_eq!(stream.diagnostics().len(), 1);
        assert_eq!(stream.diagnostics()[0].kind, DiagnosticKind::Scope);
    }

    #[test]
    fn unary_printing_keeps_signs_apart() {
        let scope = scope_with(&[]);
        let (expr, _) = parse(&scope, "-(-1)");
        assert_eq!(expr.print(), "-(-1)");
        assert_eq!(expr.constant().unwrap().components(), &[Component::Int(1)]);
    }

    #[test]
    fn overflowing_literals_print_as_divisions() {
        let scope = scope_with(&[]);
        let (expr, _) = parse(&scope, "-1e40 * 2.0");
        assert_eq!(expr.print(), "-(1.0 / 0.0) * 2.0");

        let (reparsed, stream) = parse(&scope, &expr.print());
        assert!(!stream.has_errors());
        assert_eq!(
            reparsed.constant().unwrap().components(),
            &[Component::Float(f32::NEG_INFINITY)]
        );
    }
}
