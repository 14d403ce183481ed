use slspv::analyzer::{Component, Function, Scope, Type};
use slspv::error::DiagnosticKind;
use slspv::lexer::{Preprocessor, TokenKind};
use slspv::parser::{Expression, Node};

fn parse_statements(scope: &mut Scope, source: &str) -> (Vec<Node>, Preprocessor) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut stream = Preprocessor::new(source);
    let mut nodes = vec![];
    while !stream.peek().is(&TokenKind::Eof) {
        nodes.push(Node::parse_statement(scope, &mut stream));
    }
    (nodes, stream)
}

fn messages(stream: &Preprocessor) -> Vec<(DiagnosticKind, String)> {
    stream
        .diagnostics()
        .iter()
        .map(|d| (d.kind, d.message.clone()))
        .collect()
}

#[test]
fn declaration_with_constant_initializer() {
    let mut scope = Scope::new(None, None);
    let (nodes, stream) = parse_statements(&mut scope, "int x = 1;");
    assert!(!stream.has_errors());
    assert_eq!(nodes.len(), 1);

    let Node::Declaration {
        variable, initial, ..
    } = &nodes[0]
    else {
        panic!("expected a declaration, got {:?}", nodes[0]);
    };
    assert_eq!(variable.name(), Some("x"));
    assert_eq!(variable.ty(), &Type::INT);
    assert!(initial.is_some());
    assert_eq!(
        variable.initial_value().unwrap().components(),
        &[Component::Int(1)]
    );
    assert!(scope.lookup_variable("x").is_some());
}

#[test]
fn printed_statements_parse_back() {
    let sources = [
        "int x = 1",
        "const float k = 2.5",
        "vec2 v = vec2(1, 2)",
        "float a",
        "struct T { int a; vec2 b; } t",
        "struct { float k; } c",
    ];
    for source in sources {
        let mut scope = Scope::new(None, None);
        let (nodes, stream) = parse_statements(&mut scope, &format!("{};", source));
        assert!(!stream.has_errors(), "{}", source);
        let printed = nodes[0].print();

        let mut scope = Scope::new(None, None);
        let (reparsed, stream) = parse_statements(&mut scope, &format!("{};", printed));
        assert!(!stream.has_errors(), "{}", printed);
        assert_eq!(reparsed[0].print(), printed);
    }
}

#[test]
fn assignment_promotes_the_value() {
    let mut scope = Scope::new(None, None);
    let (nodes, stream) = parse_statements(&mut scope, "float a; a = 2;");
    assert!(!stream.has_errors());
    assert_eq!(nodes.len(), 2);

    let Node::Expression(expr @ Expression::Assignment { op: None, .. }) = &nodes[1] else {
        panic!("expected an assignment, got {:?}", nodes[1]);
    };
    assert_eq!(expr.ty(), Type::FLOAT);
    assert_eq!(nodes[1].print(), "a = 2");
}

#[test]
fn mismatched_initializer_is_dropped() {
    let mut scope = Scope::new(None, None);
    let (nodes, stream) = parse_statements(&mut scope, "int x = 1.5;");
    assert_eq!(
        messages(&stream),
        vec![(
            DiagnosticKind::TypeMismatch,
            "Cannot convert from initializer type float to variable type int".to_string()
        )]
    );
    let Node::Declaration {
        variable, initial, ..
    } = &nodes[0]
    else {
        panic!("expected a declaration, got {:?}", nodes[0]);
    };
    assert!(initial.is_none());
    assert!(variable.initial_value().is_none());
}

#[test]
fn returns_are_checked_against_the_function() {
    let cases = [
        (Some(Type::FLOAT), "return 1;", None),
        (Some(Type::Void), "return;", None),
        (
            Some(Type::FLOAT),
            "return;",
            Some((
                DiagnosticKind::TypeMismatch,
                "Function expects a return value of type float",
            )),
        ),
        (
            Some(Type::Void),
            "return 1;",
            Some((
                DiagnosticKind::TypeMismatch,
                "Cannot return a value from a void function.",
            )),
        ),
        (
            Some(Type::FLOAT),
            "return true;",
            Some((
                DiagnosticKind::TypeMismatch,
                "Cannot convert type bool to return type float.",
            )),
        ),
        (
            None,
            "return;",
            Some((DiagnosticKind::Scope, "Cannot return from here.")),
        ),
        (
            None,
            "return 1;",
            Some((DiagnosticKind::Scope, "Cannot return from here.")),
        ),
    ];

    for (return_type, source, expected) in cases {
        let mut scope = Scope::new(None, return_type);
        let (nodes, stream) = parse_statements(&mut scope, source);
        assert!(matches!(nodes[..], [Node::Return { .. }]), "{}", source);
        let expected: Vec<_> = expected
            .into_iter()
            .map(|(kind, message)| (kind, message.to_string()))
            .collect();
        assert_eq!(messages(&stream), expected, "{}", source);
    }
}

#[test]
fn struct_constructor_call() {
    let mut scope = Scope::new(None, None);
    let (nodes, stream) = parse_statements(&mut scope, "struct S { int a; }; S(1);");
    assert!(!stream.has_errors(), "{:?}", stream.diagnostics());
    assert_eq!(nodes.len(), 2);

    let Node::Expression(Expression::Call {
        function,
        arguments,
    }) = &nodes[1]
    else {
        panic!("expected a call, got {:?}", nodes[1]);
    };
    assert!(matches!(**function, Function::Constructor(_)));
    assert_eq!(function.return_type().name(), "S");
    assert_eq!(arguments.len(), 1);
    assert_eq!(nodes[1].print(), "S(1)");
}

#[test]
fn missing_semicolon_skips_to_the_next_statement() {
    let mut scope = Scope::new(None, None);
    let (nodes, stream) = parse_statements(&mut scope, "int x = 1 int y; x = 2;");
    assert_eq!(
        messages(&stream),
        vec![(
            DiagnosticKind::Syntax,
            "No semicolon at end of statement.".to_string()
        )]
    );
    assert_eq!(nodes.len(), 2);
    assert!(scope.lookup_variable("y").is_none());
    assert_eq!(nodes[1].print(), "x = 2");
}

#[test]
fn end_of_input_is_reported() {
    let mut scope = Scope::new(None, None);
    let mut stream = Preprocessor::new("");
    let node = Node::parse_statement(&mut scope, &mut stream);
    assert!(matches!(node, Node::Empty));
    assert_eq!(
        messages(&stream),
        vec![(
            DiagnosticKind::Syntax,
            "Unexpected end of document".to_string()
        )]
    );
}

#[test]
fn every_statement_produces_one_node() {
    let mut scope = Scope::new(None, None);
    let (nodes, stream) = parse_statements(
        &mut scope,
        "; discard; int x; float x; const int k; y = 1; x = 2;",
    );
    assert_eq!(nodes.len(), 7);
    assert!(matches!(nodes[0], Node::Empty));
    assert!(matches!(nodes[1], Node::Empty));
    assert!(matches!(nodes[6], Node::Expression(_)));

    let kinds: Vec<_> = stream.diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::Unsupported,
            DiagnosticKind::Scope,
            DiagnosticKind::Constant,
            DiagnosticKind::Scope,
        ]
    );
}

#[test]
fn qualified_constructor_calls_are_rejected() {
    let mut scope = Scope::new(None, None);
    let (nodes, stream) = parse_statements(&mut scope, "const vec2(1, 2);");
    assert!(matches!(nodes[..], [Node::Expression(Expression::Call { .. })]));
    assert_eq!(
        messages(&stream),
        vec![(
            DiagnosticKind::Syntax,
            "Qualifiers are only allowed on declarations".to_string()
        )]
    );
}

#[test]
fn local_qualifiers_are_rejected() {
    let mut scope = Scope::new(None, None);
    let (_, stream) = parse_statements(&mut scope, "in float f;");
    assert_eq!(stream.diagnostics().len(), 1);
    assert_eq!(stream.diagnostics()[0].kind, DiagnosticKind::Syntax);
}
