use log::trace;

use crate::analyzer::Access;
use crate::error::DiagnosticKind;
use crate::lexer::{Preprocessor, TokenKind};

/// Qualifiers in front of a declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decorations {
    pub is_const: bool,
    pub access: Access,
    pub invariant: bool,
    pub coherent: bool,
    pub volatile: bool,
    pub restrict: bool,
    pub readonly: bool,
    pub writeonly: bool,
}

impl Decorations {
    /// decorations = ("const" | "in" | "out" | "inout" | "invariant" | "coherent"
    ///               | "volatile" | "restrict" | "readonly" | "writeonly")*
    pub fn parse(stream: &mut Preprocessor) -> Self {
        let mut decorations = Decorations::default();

        loop {
            let kind = stream.peek().kind.clone();
            let flag = match kind {
                TokenKind::Const => &mut decorations.is_const,
                TokenKind::Invariant => &mut decorations.invariant,
                TokenKind::Coherent => &mut decorations.coherent,
                TokenKind::Volatile => &mut decorations.volatile,
                TokenKind::Restrict => &mut decorations.restrict,
                TokenKind::ReadOnly => &mut decorations.readonly,
                TokenKind::WriteOnly => &mut decorations.writeonly,
                TokenKind::In | TokenKind::Out | TokenKind::InOut => {
                    let access = match kind {
                        TokenKind::In => Access::In,
                        TokenKind::Out => Access::Out,
                        _ => Access::InOut,
                    };
                    if decorations.access != Access::Default {
                        stream.error(
                            DiagnosticKind::Syntax,
                            "Only one of \"in\", \"out\" and \"inout\" may be given",
                        );
                    } else {
                        decorations.access = access;
                    }
                    stream.consume();
                    continue;
                }
                _ => break,
            };

            if *flag {
                stream.error(
                    DiagnosticKind::Syntax,
                    format!("Duplicate \"{}\" qualifier", kind),
                );
            }
            *flag = true;
            trace!("qualifier {}", kind);
            stream.consume();
        }

        decorations
    }

    /// Whether any qualifier was given at all.
    pub fn is_empty(&self) -> bool {
        *self == Decorations::default()
    }
}
