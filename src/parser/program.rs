use std::rc::Rc;

use log::{debug, trace};

use crate::analyzer::{
    Access, DeclaredFunction, Function, PointerType, Scope, Storage, Type, Variable,
};
use crate::error::DiagnosticKind;
use crate::lexer::{Preprocessor, TokenKind};

use super::node::{finish_statement, global_storage};
use super::{parse_type, print_struct, Decorations, Expression, Node, Printer};

/// A top level item, in source order.
#[derive(Debug)]
pub enum Item {
    /// A struct definition that doesn't declare anything else.
    Struct(Type),
    /// A global, always a `Node::Declaration`.
    Variable(Node),
    Function(Rc<Function>),
}

/// A parsed translation unit.
#[derive(Debug, Default)]
pub struct Program {
    items: Vec<Item>,
    main: Option<Rc<Function>>,
}

impl Program {
    /// program = (";" | global | function)*
    /// global = decorations type (ident ("=" assignment)?)? ";"
    /// function = decorations type ident "(" parameters ")" "{" statement* "}"
    pub fn parse(stream: &mut Preprocessor) -> Program {
        let mut scope = Scope::new(None, None);
        let mut program = Program::default();

        loop {
            match stream.peek().kind {
                TokenKind::Eof => break,
                TokenKind::SemiColon => stream.consume(),
                _ => program.parse_item(&mut scope, stream),
            }
        }

        let main = scope
            .lookup_functions("main")
            .into_iter()
            .find(|f| f.parameter_count() == 0);
        if main.is_none() {
            stream.error(DiagnosticKind::Scope, "No main() function defined");
        }
        program.main = main;
        program
    }

    fn parse_item(&mut self, scope: &mut Scope, stream: &mut Preprocessor) {
        let decorations = Decorations::parse(stream);
        let defines_struct = stream.peek().is(&TokenKind::Struct);
        let Some(ty) = parse_type(scope, stream) else {
            skip_item(stream);
            return;
        };

        if defines_struct {
            self.items.push(Item::Struct(ty.clone()));
            if stream.consume_if(&TokenKind::SemiColon) {
                return;
            }
        }

        if stream.peek().ident().is_some() && stream.peek_nth(1).is(&TokenKind::LeftParen) {
            if !decorations.is_empty() {
                stream.error(
                    DiagnosticKind::Syntax,
                    "Functions cannot have qualifiers",
                );
            }
            if let Some(function) = parse_function(scope, stream, ty) {
                self.items.push(Item::Function(function));
            }
            return;
        }

        if decorations.access == Access::InOut {
            stream.error(
                DiagnosticKind::Syntax,
                "\"inout\" is not allowed on global variables",
            );
        }
        let storage = global_storage(decorations.access);
        let node = Node::parse_declaration(scope, stream, &decorations, ty, storage);
        if let Node::Declaration {
            variable,
            initial: Some(_),
            ..
        } = &node
        {
            if storage == Storage::Input {
                stream.error(
                    DiagnosticKind::Syntax,
                    format!(
                        "Input variable \"{}\" cannot be initialized",
                        variable.name().unwrap_or_default()
                    ),
                );
            }
        }
        finish_statement(stream);
        self.items.push(Item::Variable(node));
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Global variables with their initializers.
    pub fn globals(&self) -> impl Iterator<Item = (&Rc<Variable>, Option<&Expression>)> {
        self.items.iter().filter_map(|item| match item {
            Item::Variable(Node::Declaration {
                variable, initial, ..
            }) => Some((variable, initial.as_ref())),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &Rc<Function>> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn main(&self) -> Option<&Rc<Function>> {
        self.main.as_ref()
    }

    /// Renders the program as source text that parses back to an equivalent program.
    pub fn print(&self) -> String {
        let mut printer = Printer::new();

        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Struct(ty) => printer.line(&format!("{};", print_struct(ty))),
                Item::Variable(node) => printer.line(&format!("{};", node.print())),
                Item::Function(function) => {
                    let Some(f) = function.as_declared() else {
                        continue;
                    };
                    if i > 0 {
                        printer.line("");
                    }
                    let parameters: Vec<_> = f.parameters.iter().map(|p| p.print()).collect();
                    printer.line(&format!(
                        "{} {}({}) {{",
                        f.return_type,
                        f.name,
                        parameters.join(", ")
                    ));
                    printer.indent();
                    for node in &f.body {
                        printer.line(&format!("{};", node.print()));
                    }
                    printer.dedent();
                    printer.line("}");
                }
            }
        }

        printer.finish()
    }
}

/// Skips a broken top level item: up to and including the next `;`, or past a `{ }` block.
fn skip_item(stream: &mut Preprocessor) {
    let mut depth = 0usize;
    loop {
        match stream.peek().kind {
            TokenKind::Eof => return,
            TokenKind::SemiColon if depth == 0 => {
                stream.consume();
                return;
            }
            TokenKind::LeftBrace => depth += 1,
            TokenKind::RightBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    stream.consume();
                    return;
                }
            }
            _ => {}
        }
        stream.consume();
    }
}

fn parse_function(
    scope: &mut Scope,
    stream: &mut Preprocessor,
    return_type: Type,
) -> Option<Rc<Function>> {
    let name = stream.peek().ident()?.to_string();
    stream.consume();
    stream.consume();
    trace!("function {}", name);

    let mut function_scope = Scope::new(Some(&*scope), Some(return_type.clone()));
    let parameters = parse_parameters(&mut function_scope, stream);

    if stream.peek().is(&TokenKind::SemiColon) {
        stream.error(
            DiagnosticKind::Unsupported,
            "Function declarations without a body are not supported",
        );
        stream.consume();
        return None;
    }
    if !stream.expect(&TokenKind::LeftBrace, "to start the function body") {
        skip_item(stream);
        return None;
    }

    let mut body = vec![];
    loop {
        if stream.consume_if(&TokenKind::RightBrace) {
            break;
        }
        if stream.peek().is(&TokenKind::Eof) {
            stream.error(
                DiagnosticKind::Syntax,
                format!("Unterminated body of function \"{}\"", name),
            );
            break;
        }
        body.push(Node::parse_statement(&mut function_scope, stream));
    }
    drop(function_scope);

    let parameter_types: Vec<_> = parameters.iter().map(|p| p.ty().clone()).collect();
    let redefined = scope
        .lookup_functions(&name)
        .iter()
        .any(|f| f.parameter_types() == parameter_types);
    if redefined {
        stream.error(
            DiagnosticKind::Scope,
            format!("Redefinition of function \"{}\"", name),
        );
    }
    if name == "main" && (!return_type.is_void() || !parameters.is_empty()) {
        stream.error(
            DiagnosticKind::TypeMismatch,
            "main() must be declared as \"void main()\"",
        );
    }

    debug!(
        "function {}({}) with {} statements",
        name,
        parameter_types
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", "),
        body.len()
    );
    let function = Rc::new(Function::Declared(DeclaredFunction {
        name,
        return_type,
        parameters,
        body,
    }));
    scope.add_function(function.clone());
    Some(function)
}

/// parameters = "void"? | parameter ("," parameter)*
/// parameter = decorations type ident?
fn parse_parameters(scope: &mut Scope, stream: &mut Preprocessor) -> Vec<Rc<Variable>> {
    let mut parameters = vec![];

    let void = TokenKind::BuiltinType(crate::analyzer::BasicType::Void);
    if stream.peek().is(&void) && stream.peek_nth(1).is(&TokenKind::RightParen) {
        stream.consume();
    }
    if stream.consume_if(&TokenKind::RightParen) {
        return parameters;
    }

    loop {
        let decorations = Decorations::parse(stream);
        let Some(ty) = parse_type(scope, stream) else {
            stream.sync(&TokenKind::RightParen);
            stream.consume();
            return parameters;
        };
        if ty.is_void() {
            stream.error(DiagnosticKind::TypeMismatch, "Parameters cannot be void");
        }
        if decorations.is_const && decorations.access.writes() {
            stream.error(
                DiagnosticKind::Syntax,
                "\"const\" cannot be combined with \"out\" or \"inout\"",
            );
        }

        let name = stream.peek().ident().map(str::to_string);
        if name.is_some() {
            stream.consume();
        }

        let is_pointer = !(decorations.is_const && !decorations.access.writes());
        let pointer_type = PointerType::new(ty, is_pointer, decorations.access);
        let parameter = Variable::new(pointer_type, name, None, decorations.is_const);
        if let Some(previous) = scope.add_variable(parameter.clone()) {
            stream.error(
                DiagnosticKind::Scope,
                format!(
                    "Duplicate parameter name \"{}\"",
                    previous.name().unwrap_or_default()
                ),
            );
        }
        parameters.push(parameter);

        if stream.consume_if(&TokenKind::Comma) {
            continue;
        }
        if !stream.expect(&TokenKind::RightParen, "after the parameters") {
            stream.sync(&TokenKind::RightParen);
            stream.consume();
        }
        return parameters;
    }
}
