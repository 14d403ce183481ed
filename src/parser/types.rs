use log::debug;

use crate::analyzer::{Field, Function, Scope, Type};
use crate::error::DiagnosticKind;
use crate::lexer::{Preprocessor, TokenKind};

/// type = builtin_type
///      | ident
///      | "struct" ident? "{" (type ident ("," ident)* ";")* "}"
///
/// Named struct definitions are registered in `scope`, together with their constructor.
/// `None` after reporting a diagnostic when there is no type to parse.
pub fn parse_type(scope: &mut Scope, stream: &mut Preprocessor) -> Option<Type> {
    let token = stream.peek().clone();
    match token.kind {
        TokenKind::BuiltinType(basic) => {
            stream.consume();
            Some(Type::from(basic))
        }
        TokenKind::Struct => {
            stream.consume();
            Some(parse_struct(scope, stream))
        }
        TokenKind::Ident(name) => match scope.lookup_type(&name) {
            Some(ty) => {
                let ty = ty.clone();
                stream.consume();
                Some(ty)
            }
            None => {
                stream.error(
                    DiagnosticKind::Syntax,
                    format!("\"{}\" is not a type", name),
                );
                None
            }
        },
        kind => {
            stream.error(
                DiagnosticKind::Syntax,
                format!("Expected a type, got \"{}\"", kind),
            );
            None
        }
    }
}

fn parse_struct(scope: &mut Scope, stream: &mut Preprocessor) -> Type {
    let name = stream.peek().ident().map(str::to_string);
    if name.is_some() {
        stream.consume();
    }

    let mut fields: Vec<Field> = vec![];
    if stream.expect(&TokenKind::LeftBrace, "after struct name") {
        while !stream.consume_if(&TokenKind::RightBrace) {
            if stream.peek().is(&TokenKind::Eof) {
                stream.error(DiagnosticKind::Syntax, "Unterminated struct definition");
                break;
            }
            parse_members(scope, stream, &mut fields);
        }
    }

    if fields.is_empty() {
        stream.error(
            DiagnosticKind::Syntax,
            "Structs must have at least one member",
        );
    }

    let ty = Type::new_struct(name.clone(), fields);
    if let Some(name) = name {
        if scope.has_local_type(&name) {
            stream.error(
                DiagnosticKind::Scope,
                format!("Redefinition of struct \"{}\"", name),
            );
        } else if scope.lookup_variable(&name).is_some() {
            stream.error(
                DiagnosticKind::Scope,
                format!("\"{}\" is already used as a variable name", name),
            );
        }
        debug!("struct {} with {} components", name, ty.component_count());
        scope.add_type(&name, ty.clone());
        scope.add_function(Function::new_constructor(ty.clone()));
    }
    ty
}

/// member = type ident ("," ident)* ";"
fn parse_members(scope: &mut Scope, stream: &mut Preprocessor, fields: &mut Vec<Field>) {
    let Some(ty) = parse_type(scope, stream) else {
        stream.sync(&TokenKind::SemiColon);
        stream.consume();
        return;
    };
    if ty.is_void() {
        stream.error(DiagnosticKind::TypeMismatch, "Struct members cannot be void");
    }

    loop {
        match stream.peek().ident().map(str::to_string) {
            Some(name) => {
                if fields.iter().any(|f| f.name == name) {
                    stream.error(
                        DiagnosticKind::Scope,
                        format!("Duplicate member name \"{}\"", name),
                    );
                } else {
                    fields.push(Field {
                        name,
                        ty: ty.clone(),
                    });
                }
                stream.consume();
            }
            None => {
                stream.error(DiagnosticKind::Syntax, "Expected a member name");
                break;
            }
        }
        if !stream.consume_if(&TokenKind::Comma) {
            break;
        }
    }

    if !stream.expect(&TokenKind::SemiColon, "after struct member") {
        stream.sync(&TokenKind::SemiColon);
        stream.consume();
    }
}

/// Prints the definition of a named or anonymous struct.
pub fn print_struct(ty: &Type) -> String {
    let Some(st) = ty.as_struct() else {
        return ty.name();
    };
    let mut s = String::from("struct");
    if let Some(name) = &st.name {
        s.push(' ');
        s.push_str(name);
    }
    s.push_str(" {\n");
    for field in &st.fields {
        s.push_str(&format!("  {} {};\n", field.ty, field.name));
    }
    s.push('}');
    s
}
