use std::rc::Rc;

use log::trace;

use crate::analyzer::{Access, PointerType, Scope, Storage, Type, Variable};
use crate::error::DiagnosticKind;
use crate::lexer::{Preprocessor, TokenKind};

use super::{parse_type, print_struct, Callee, Decorations, Expression};

/// A statement.
#[derive(Debug)]
pub enum Node {
    Empty,
    Declaration {
        variable: Rc<Variable>,
        initial: Option<Expression>,
        /// The struct defined as part of the declaration, as in `struct S { int a; } s;`.
        structure: Option<Type>,
    },
    Return {
        value: Option<Expression>,
    },
    Expression(Expression),
}

impl Node {
    /// statement = ";"
    ///           | decorations type "(" arguments ")" ";"
    ///           | decorations type ident? ("=" assignment)? ";"
    ///           | "return" expression? ";"
    ///           | expression ";"
    ///
    /// Always produces a node. Problems are reported to `stream` and parsing resumes after
    /// the next `;`.
    pub fn parse_statement(scope: &mut Scope, stream: &mut Preprocessor) -> Node {
        let token = stream.peek().clone();
        trace!("statement at {}: {}", token.position, token.kind);

        let node = match &token.kind {
            TokenKind::SemiColon => Node::Empty,
            TokenKind::Eof => {
                stream.error(DiagnosticKind::Syntax, "Unexpected end of document");
                return Node::Empty;
            }
            TokenKind::Return => Self::parse_return(scope, stream),
            TokenKind::Reserved(word) => {
                stream.error(
                    DiagnosticKind::Unsupported,
                    format!("\"{}\" is not supported", word),
                );
                stream.sync(&TokenKind::SemiColon);
                stream.consume();
                return Node::Empty;
            }
            kind if kind.is_type_introducer() => Self::parse_typed(scope, stream),
            TokenKind::Ident(name) if scope.lookup_type(name).is_some() => {
                Self::parse_typed(scope, stream)
            }
            _ => Node::Expression(Expression::parse(scope, stream)),
        };

        finish_statement(stream);
        node
    }

    fn parse_typed(scope: &mut Scope, stream: &mut Preprocessor) -> Node {
        let decorations = Decorations::parse(stream);
        let defines_struct = stream.peek().is(&TokenKind::Struct);
        let Some(ty) = parse_type(scope, stream) else {
            return Node::Empty;
        };

        if stream.peek().is(&TokenKind::LeftParen) {
            if !decorations.is_empty() {
                stream.error(
                    DiagnosticKind::Syntax,
                    "Qualifiers are only allowed on declarations",
                );
            }
            let expr = Expression::parse_function_call(scope, stream, Callee::Constructor(ty));
            return Node::Expression(expr);
        }

        if let Some(keyword) = decorations.access.keyword() {
            stream.error(
                DiagnosticKind::Syntax,
                format!(
                    "\"{}\" is only allowed on global variables and parameters",
                    keyword
                ),
            );
        }
        let structure = defines_struct.then(|| ty.clone());
        let mut node = Self::parse_declaration(scope, stream, &decorations, ty, Storage::Function);
        if let Node::Declaration { structure: s, .. } = &mut node {
            *s = structure;
        }
        node
    }

    /// declaration = ident? ("=" assignment)?
    ///
    /// The decorations and the type have been parsed already. An initializer that doesn't
    /// convert to the variable's type is reported and dropped. A constant initializer is
    /// folded into the variable's initial value.
    pub fn parse_declaration(
        scope: &mut Scope,
        stream: &mut Preprocessor,
        decorations: &Decorations,
        ty: Type,
        storage: Storage,
    ) -> Node {
        let mut name = None;
        let mut initial = None;
        let mut value = None;

        if let Some(ident) = stream.peek().ident().map(str::to_string) {
            stream.consume();
            name = Some(ident);

            if stream.consume_if(&TokenKind::Equal) {
                let expr = Expression::parse_assignment(scope, stream);
                if expr.is_error() {
                    // already reported
                } else if !ty.can_convert(&expr.ty()) {
                    stream.error(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "Cannot convert from initializer type {} to variable type {}",
                            expr.ty(),
                            ty
                        ),
                    );
                } else {
                    value = expr.constant().and_then(|v| v.convert(&ty));
                    initial = Some(expr);
                }
            }
        }

        if ty.is_void() {
            stream.error(
                DiagnosticKind::TypeMismatch,
                "Cannot declare a variable of type void",
            );
        }
        if decorations.is_const && name.is_some() && initial.is_none() {
            stream.error(
                DiagnosticKind::Constant,
                "Constant variables must be initialized",
            );
        }

        let pointer_type = PointerType::new(ty, true, decorations.access).with_storage(storage);
        let variable = Variable::new(pointer_type, name, value, decorations.is_const);
        if let Some(previous) = scope.add_variable(variable.clone()) {
            stream.error(
                DiagnosticKind::Scope,
                format!(
                    "Redeclaration of variable \"{}\"",
                    previous.name().unwrap_or_default()
                ),
            );
        }

        Node::Declaration {
            variable,
            initial,
            structure: None,
        }
    }

    /// return = "return" expression?
    fn parse_return(scope: &Scope, stream: &mut Preprocessor) -> Node {
        stream.consume();
        let value = if stream.peek().is(&TokenKind::SemiColon) {
            None
        } else {
            Some(Expression::parse(scope, stream))
        };

        match (scope.return_type(), &value) {
            (None, _) => stream.error(DiagnosticKind::Scope, "Cannot return from here."),
            (Some(return_type), None) if !return_type.is_void() => {
                let message = format!("Function expects a return value of type {}", return_type);
                stream.error(DiagnosticKind::TypeMismatch, message);
            }
            (Some(return_type), Some(_)) if return_type.is_void() => stream.error(
                DiagnosticKind::TypeMismatch,
                "Cannot return a value from a void function.",
            ),
            (Some(return_type), Some(value))
                if !value.is_error() && !return_type.can_convert(&value.ty()) =>
            {
                let message = format!(
                    "Cannot convert type {} to return type {}.",
                    value.ty(),
                    return_type
                );
                stream.error(DiagnosticKind::TypeMismatch, message);
            }
            _ => {}
        }

        Node::Return { value }
    }

    /// Source text of the statement, without the trailing `;`.
    pub fn print(&self) -> String {
        match self {
            Node::Empty => String::new(),
            Node::Declaration {
                variable,
                initial,
                structure,
            } => {
                let declared = match structure {
                    Some(ty) => variable.print_declared(&print_struct(ty)),
                    None => variable.print(),
                };
                match initial {
                    Some(initial) => format!("{} = {}", declared, initial.print()),
                    None => declared,
                }
            }
            Node::Return { value: Some(value) } => format!("return {}", value.print()),
            Node::Return { value: None } => "return".to_string(),
            Node::Expression(expr) => expr.print(),
        }
    }
}

/// Requires the `;` ending a statement, skipping ahead to the next one if it's missing.
pub(super) fn finish_statement(stream: &mut Preprocessor) {
    if !stream.peek().is(&TokenKind::SemiColon) {
        stream.error(DiagnosticKind::Syntax, "No semicolon at end of statement.");
        stream.sync(&TokenKind::SemiColon);
    }
    stream.consume();
}

/// Storage of a global declared with the given caller access.
pub(super) fn global_storage(access: Access) -> Storage {
    match access {
        Access::In => Storage::Input,
        Access::Out => Storage::Output,
        Access::Default | Access::InOut => Storage::Private,
    }
}
