use std::collections::HashMap;

use log::{debug, trace};

use crate::error::{Diagnostic, DiagnosticKind, Position};

use super::{Lexer, Token, TokenKind};

#[derive(Debug)]
struct Condition {
    active: bool,
    seen_else: bool,
}

/// Runs directives and macro expansion over the raw token stream.
#[derive(Debug, Default)]
struct Expander {
    macros: HashMap<String, Vec<Token>>,
    conditions: Vec<Condition>,
    output: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    version: Option<u32>,
}

impl Expander {
    fn error(&mut self, position: Position, message: String) {
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::Preprocessor,
            message,
            position,
        });
    }

    fn is_active(&self) -> bool {
        self.conditions.iter().all(|c| c.active)
    }

    fn define(&mut self, name: &str, value: &str) {
        let mut body = Lexer::tokenize(value);
        body.pop();
        debug!("predefined macro {} = {}", name, value);
        self.macros.insert(name.to_string(), body);
    }

    fn process(&mut self, source: &str) -> Position {
        let tokens = Lexer::tokenize(source);
        let mut index = 0;
        let mut last_line = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            if token.is(&TokenKind::Eof) {
                return token.position;
            }

            let starts_line = token.position.line > last_line;
            last_line = token.position.line;

            if starts_line && token.is(&TokenKind::Hash) {
                let line = token.position.line;
                let end = tokens[index + 1..]
                    .iter()
                    .position(|t| t.position.line != line || t.is(&TokenKind::Eof))
                    .map(|i| index + 1 + i)
                    .unwrap_or(tokens.len());
                self.directive(token.position, &tokens[index + 1..end]);
                index = end;
                continue;
            }

            index += 1;
            if !self.is_active() {
                continue;
            }
            if let TokenKind::Error(message) = &token.kind {
                self.diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::Syntax,
                    message: message.clone(),
                    position: token.position,
                });
                continue;
            }
            self.expand(token.clone(), &mut vec![]);
        }

        Position::default()
    }

    fn expand(&mut self, token: Token, active: &mut Vec<String>) {
        if let TokenKind::Ident(name) = &token.kind {
            if !active.contains(name) {
                if let Some(body) = self.macros.get(name).cloned() {
                    trace!("expanding macro {}", name);
                    active.push(name.clone());
                    for t in body {
                        let t = Token {
                            kind: t.kind,
                            position: token.position,
                        };
                        self.expand(t, active);
                    }
                    active.pop();
                    return;
                }
            }
        }
        self.output.push(token);
    }

    fn directive(&mut self, position: Position, tokens: &[Token]) {
        let Some(first) = tokens.first() else {
            return;
        };
        let Some(name) = first.ident() else {
            if self.is_active() {
                self.error(first.position, format!("Invalid preprocessor directive \"{}\"", first.kind));
            }
            return;
        };
        let args = &tokens[1..];

        match name {
            "ifdef" | "ifndef" => {
                let defined = match args.first().and_then(|t| t.ident()) {
                    Some(macro_name) => self.macros.contains_key(macro_name),
                    None => {
                        self.error(position, format!("Expected a macro name after #{}", name));
                        false
                    }
                };
                let active = if name == "ifdef" { defined } else { !defined };
                self.conditions.push(Condition {
                    active,
                    seen_else: false,
                });
            }
            "if" | "elif" => {
                self.error(position, format!("#{} is not supported", name));
                self.conditions.push(Condition {
                    active: false,
                    seen_else: false,
                });
            }
            "else" => match self.conditions.last_mut() {
                Some(c) if !c.seen_else => {
                    c.active = !c.active;
                    c.seen_else = true;
                }
                Some(_) => self.error(position, "#else after #else".to_string()),
                None => self.error(position, "#else without #ifdef".to_string()),
            },
            "endif" => {
                if self.conditions.pop().is_none() {
                    self.error(position, "#endif without #ifdef".to_string());
                }
            }
            _ if !self.is_active() => {}
            "define" => self.directive_define(position, args),
            "undef" => match args.first().and_then(|t| t.ident()) {
                Some(macro_name) => {
                    self.macros.remove(macro_name);
                }
                None => self.error(position, "Expected a macro name after #undef".to_string()),
            },
            "version" => match args.first().map(|t| &t.kind) {
                Some(TokenKind::IntConst(v)) if *v > 0 => self.version = Some(*v as u32),
                _ => self.error(position, "Expected a version number after #version".to_string()),
            },
            "error" => {
                let message: Vec<_> = args.iter().map(|t| t.kind.to_string()).collect();
                self.error(position, format!("#error {}", message.join(" ")));
            }
            "extension" | "pragma" | "line" => {
                debug!("ignoring #{} directive", name);
            }
            _ => self.error(position, format!("Unknown preprocessor directive #{}", name)),
        }
    }

    fn directive_define(&mut self, position: Position, args: &[Token]) {
        let Some(name_token) = args.first() else {
            self.error(position, "Expected a macro name after #define".to_string());
            return;
        };
        let Some(name) = name_token.ident() else {
            self.error(name_token.position, format!("Cannot define \"{}\"", name_token.kind));
            return;
        };
        let body = &args[1..];

        if let Some(paren) = body.first() {
            let name_end = name_token.position.column + name.len() as u32;
            if paren.is(&TokenKind::LeftParen) && paren.position.line == name_token.position.line
                && paren.position.column == name_end
            {
                self.diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::Unsupported,
                    message: format!("Function-like macro \"{}\" is not supported", name),
                    position,
                });
                return;
            }
        }
        if let Some(error) = body.iter().find(|t| matches!(t.kind, TokenKind::Error(_))) {
            let message = error.kind.to_string();
            self.error(error.position, message);
            return;
        }

        if let Some(previous) = self.macros.get(name) {
            let same = previous.len() == body.len()
                && previous.iter().zip(body).all(|(a, b)| a.kind == b.kind);
            if !same {
                self.error(position, format!("Redefinition of macro \"{}\"", name));
                return;
            }
        }
        self.macros.insert(name.to_string(), body.to_vec());
    }
}

/// Cursor over the preprocessed token stream, and the sink for every diagnostic of a
/// compile. Errors are recorded, never raised: parsing always carries on.
#[derive(Debug)]
pub struct Preprocessor {
    tokens: Vec<Token>,
    index: usize,
    diagnostics: Vec<Diagnostic>,
    version: Option<u32>,
}

impl Preprocessor {
    pub fn new(source: &str) -> Self {
        Self::with_options(source, &[], None)
    }

    /// `defines` are installed before anything is read, then `preamble` is processed, then
    /// `source`.
    pub fn with_options(
        source: &str,
        defines: &[(String, String)],
        preamble: Option<&str>,
    ) -> Self {
        let mut expander = Expander::default();
        for (name, value) in defines {
            expander.define(name, value);
        }
        if let Some(preamble) = preamble {
            expander.process(preamble);
        }
        let end = expander.process(source);

        for _ in expander.conditions.drain(..) {
            expander.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::Preprocessor,
                message: "Missing #endif".to_string(),
                position: end,
            });
        }
        expander.output.push(Token {
            kind: TokenKind::Eof,
            position: end,
        });

        Self {
            tokens: expander.output,
            index: 0,
            diagnostics: expander.diagnostics,
            version: expander.version,
        }
    }

    /// The current token. At the end of input this is `TokenKind::Eof`, forever.
    pub fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    pub fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + n).min(last)]
    }

    pub fn consume(&mut self) {
        if !self.peek().is(&TokenKind::Eof) {
            self.index += 1;
        }
    }

    /// Consumes the current token if it is `kind`.
    pub fn consume_if(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// Consumes `kind` or reports a syntax error naming `what` was being parsed.
    pub fn expect(&mut self, kind: &TokenKind, what: &str) -> bool {
        if self.consume_if(kind) {
            return true;
        }
        let message = format!("Expected \"{}\" {}, got \"{}\"", kind, what, self.peek().kind);
        self.error(DiagnosticKind::Syntax, message);
        false
    }

    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
            position: self.peek().position,
        };
        debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Skips ahead to the next `kind` (or the end of input) without consuming it.
    pub fn sync(&mut self, kind: &TokenKind) {
        while !self.peek().is(kind) && !self.peek().is(&TokenKind::Eof) {
            self.consume();
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// The number given by a `#version` directive, if any.
    pub fn version(&self) -> Option<u32> {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(p: &mut Preprocessor) -> Vec<TokenKind> {
        let mut kinds = vec![];
        loop {
            let kind = p.peek().kind.clone();
            if kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(kind);
            p.consume();
        }
    }

    #[test]
    fn defines_expand() {
        let defines = vec![("SIZE".to_string(), "4".to_string())];
        let mut p = Preprocessor::with_options("#define TWICE SIZE + SIZE\nTWICE", &defines, None);
        assert_eq!(
            kinds(&mut p),
            vec![TokenKind::IntConst(4), TokenKind::Plus, TokenKind::IntConst(4)]
        );
        assert!(!p.has_errors());
    }

    #[test]
    fn self_referencing_macro_terminates() {
        let mut p = Preprocessor::new("#define X X + 1\nX");
        assert_eq!(
            kinds(&mut p),
            vec![TokenKind::Ident("X".to_string()), TokenKind::Plus, TokenKind::IntConst(1)]
        );
    }

    #[test]
    fn conditionals() {
        let source = "#define A\n#ifdef A\n1\n#else\n2\n#endif\n#ifndef A\n3\n#endif\n";
        let mut p = Preprocessor::new(source);
        assert_eq!(kinds(&mut p), vec![TokenKind::IntConst(1)]);
        assert!(!p.has_errors());
    }

    #[test]
    fn version_and_unknown_directives() {
        let mut p = Preprocessor::new("#version 450 core\n#frobnicate\nx");
        assert_eq!(p.version(), Some(450));
        assert_eq!(kinds(&mut p), vec![TokenKind::Ident("x".to_string())]);
        assert_eq!(p.diagnostics().len(), 1);
        assert_eq!(p.diagnostics()[0].kind, DiagnosticKind::Preprocessor);
    }

    #[test]
    fn unterminated_conditional() {
        let p = Preprocessor::new("#ifdef A\nx");
        assert_eq!(p.diagnostics().len(), 1);
    }

    #[test]
    fn preamble_comes_first() {
        let mut p = Preprocessor::with_options("b", &[], Some("a"));
        assert_eq!(
            kinds(&mut p),
            vec![TokenKind::Ident("a".to_string()), TokenKind::Ident("b".to_string())]
        );
    }

    #[test]
    fn sync_stops_at_token_and_eof_is_sticky() {
        let mut p = Preprocessor::new("a b c ; d");
        p.sync(&TokenKind::SemiColon);
        assert!(p.peek().is(&TokenKind::SemiColon));
        p.consume();
        p.consume();
        p.consume();
        p.consume();
        assert!(p.peek().is(&TokenKind::Eof));
        p.sync(&TokenKind::SemiColon);
        assert!(p.peek().is(&TokenKind::Eof));
    }
}
