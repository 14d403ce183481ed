use std::fmt;

use phf::phf_map;

use crate::analyzer::{BasicType, Scalar};
use crate::error::Position;

use Scalar::{Bool, Double, Float, Int, Uint};

pub(super) static KEYWORDS: phf::Map<&str, TokenKind> = phf_map! {
    "const" => TokenKind::Const,
    "in" => TokenKind::In,
    "out" => TokenKind::Out,
    "inout" => TokenKind::InOut,
    "invariant" => TokenKind::Invariant,
    "coherent" => TokenKind::Coherent,
    "volatile" => TokenKind::Volatile,
    "restrict" => TokenKind::Restrict,
    "readonly" => TokenKind::ReadOnly,
    "writeonly" => TokenKind::WriteOnly,
    "struct" => TokenKind::Struct,
    "return" => TokenKind::Return,
    "true" => TokenKind::True,
    "false" => TokenKind::False,

    "void" => TokenKind::BuiltinType(BasicType::Void),
    "bool" => TokenKind::BuiltinType(BasicType::Scalar(Bool)),
    "int" => TokenKind::BuiltinType(BasicType::Scalar(Int)),
    "uint" => TokenKind::BuiltinType(BasicType::Scalar(Uint)),
    "float" => TokenKind::BuiltinType(BasicType::Scalar(Float)),
    "double" => TokenKind::BuiltinType(BasicType::Scalar(Double)),
    "bvec2" => TokenKind::BuiltinType(BasicType::Vector(Bool, 2)),
    "bvec3" => TokenKind::BuiltinType(BasicType::Vector(Bool, 3)),
    "bvec4" => TokenKind::BuiltinType(BasicType::Vector(Bool, 4)),
    "ivec2" => TokenKind::BuiltinType(BasicType::Vector(Int, 2)),
    "ivec3" => TokenKind::BuiltinType(BasicType::Vector(Int, 3)),
    "ivec4" => TokenKind::BuiltinType(BasicType::Vector(Int, 4)),
    "uvec2" => TokenKind::BuiltinType(BasicType::Vector(Uint, 2)),
    "uvec3" => TokenKind::BuiltinType(BasicType::Vector(Uint, 3)),
    "uvec4" => TokenKind::BuiltinType(BasicType::Vector(Uint, 4)),
    "vec2" => TokenKind::BuiltinType(BasicType::Vector(Float, 2)),
    "vec3" => TokenKind::BuiltinType(BasicType::Vector(Float, 3)),
    "vec4" => TokenKind::BuiltinType(BasicType::Vector(Float, 4)),
    "dvec2" => TokenKind::BuiltinType(BasicType::Vector(Double, 2)),
    "dvec3" => TokenKind::BuiltinType(BasicType::Vector(Double, 3)),
    "dvec4" => TokenKind::BuiltinType(BasicType::Vector(Double, 4)),
    "mat2" => TokenKind::BuiltinType(BasicType::Matrix(Float, 2, 2)),
    "mat3" => TokenKind::BuiltinType(BasicType::Matrix(Float, 3, 3)),
    "mat4" => TokenKind::BuiltinType(BasicType::Matrix(Float, 4, 4)),
    "mat2x2" => TokenKind::BuiltinType(BasicType::Matrix(Float, 2, 2)),
    "mat2x3" => TokenKind::BuiltinType(BasicType::Matrix(Float, 2, 3)),
    "mat2x4" => TokenKind::BuiltinType(BasicType::Matrix(Float, 2, 4)),
    "mat3x2" => TokenKind::BuiltinType(BasicType::Matrix(Float, 3, 2)),
    "mat3x3" => TokenKind::BuiltinType(BasicType::Matrix(Float, 3, 3)),
    "mat3x4" => TokenKind::BuiltinType(BasicType::Matrix(Float, 3, 4)),
    "mat4x2" => TokenKind::BuiltinType(BasicType::Matrix(Float, 4, 2)),
    "mat4x3" => TokenKind::BuiltinType(BasicType::Matrix(Float, 4, 3)),
    "mat4x4" => TokenKind::BuiltinType(BasicType::Matrix(Float, 4, 4)),
    "dmat2" => TokenKind::BuiltinType(BasicType::Matrix(Double, 2, 2)),
    "dmat3" => TokenKind::BuiltinType(BasicType::Matrix(Double, 3, 3)),
    "dmat4" => TokenKind::BuiltinType(BasicType::Matrix(Double, 4, 4)),
    "dmat2x2" => TokenKind::BuiltinType(BasicType::Matrix(Double, 2, 2)),
    "dmat2x3" => TokenKind::BuiltinType(BasicType::Matrix(Double, 2, 3)),
    "dmat2x4" => TokenKind::BuiltinType(BasicType::Matrix(Double, 2, 4)),
    "dmat3x2" => TokenKind::BuiltinType(BasicType::Matrix(Double, 3, 2)),
    "dmat3x3" => TokenKind::BuiltinType(BasicType::Matrix(Double, 3, 3)),
    "dmat3x4" => TokenKind::BuiltinType(BasicType::Matrix(Double, 3, 4)),
    "dmat4x2" => TokenKind::BuiltinType(BasicType::Matrix(Double, 4, 2)),
    "dmat4x3" => TokenKind::BuiltinType(BasicType::Matrix(Double, 4, 3)),
    "dmat4x4" => TokenKind::BuiltinType(BasicType::Matrix(Double, 4, 4)),

    "if" => TokenKind::Reserved("if"),
    "else" => TokenKind::Reserved("else"),
    "for" => TokenKind::Reserved("for"),
    "while" => TokenKind::Reserved("while"),
    "do" => TokenKind::Reserved("do"),
    "switch" => TokenKind::Reserved("switch"),
    "case" => TokenKind::Reserved("case"),
    "default" => TokenKind::Reserved("default"),
    "break" => TokenKind::Reserved("break"),
    "continue" => TokenKind::Reserved("continue"),
    "discard" => TokenKind::Reserved("discard"),
    "uniform" => TokenKind::Reserved("uniform"),
    "buffer" => TokenKind::Reserved("buffer"),
    "layout" => TokenKind::Reserved("layout"),
};

pub(super) static THREE_SYMBOLS_TOKENS: phf::Map<&str, TokenKind> = phf_map! {
    "<<=" => TokenKind::LeftShiftEqual,
    ">>=" => TokenKind::RightShiftEqual,
};

pub(super) static TWO_SYMBOLS_TOKENS: phf::Map<&str, TokenKind> = phf_map! {
    "++" => TokenKind::PlusPlus,
    "--" => TokenKind::MinusMinus,
    "+=" => TokenKind::PlusEqual,
    "-=" => TokenKind::MinusEqual,
    "*=" => TokenKind::StarEqual,
    "/=" => TokenKind::SlashEqual,
    "%=" => TokenKind::PercentEqual,
    "&=" => TokenKind::AmpersandEqual,
    "|=" => TokenKind::PipeEqual,
    "^=" => TokenKind::HatEqual,
    "<<" => TokenKind::LeftShift,
    ">>" => TokenKind::RightShift,
    "<=" => TokenKind::LessEqual,
    ">=" => TokenKind::GreaterEqual,
    "==" => TokenKind::DoubleEqual,
    "!=" => TokenKind::NotEqual,
    "&&" => TokenKind::DoubleAmpersand,
    "||" => TokenKind::DoublePipe,
    "^^" => TokenKind::DoubleHat,
};

pub(super) static ONE_SYMBOL_TOKENS: phf::Map<char, TokenKind> = phf_map! {
    '(' => TokenKind::LeftParen,
    ')' => TokenKind::RightParen,
    '{' => TokenKind::LeftBrace,
    '}' => TokenKind::RightBrace,
    '[' => TokenKind::LeftBracket,
    ']' => TokenKind::RightBracket,
    ';' => TokenKind::SemiColon,
    ',' => TokenKind::Comma,
    '.' => TokenKind::Dot,
    '+' => TokenKind::Plus,
    '-' => TokenKind::Minus,
    '*' => TokenKind::Star,
    '/' => TokenKind::Slash,
    '%' => TokenKind::Percent,
    '<' => TokenKind::LessThan,
    '>' => TokenKind::GreaterThan,
    '=' => TokenKind::Equal,
    '!' => TokenKind::Not,
    '~' => TokenKind::Tilde,
    '&' => TokenKind::Ampersand,
    '|' => TokenKind::Pipe,
    '^' => TokenKind::Hat,
    '?' => TokenKind::Question,
    ':' => TokenKind::Colon,
    '#' => TokenKind::Hash,
};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Eof,
    /// Something the lexer could not make sense of, with a description.
    Error(String),

    Ident(String),
    IntConst(i32),
    UintConst(u32),
    FloatConst(f32),
    DoubleConst(f64),
    True,
    False,

    BuiltinType(BasicType),
    Struct,
    Return,
    Reserved(&'static str),

    Const,
    In,
    Out,
    InOut,
    Invariant,
    Coherent,
    Volatile,
    Restrict,
    ReadOnly,
    WriteOnly,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    SemiColon,
    Comma,
    Dot,
    Question,
    Colon,
    Hash,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    Tilde,
    Ampersand,
    Pipe,
    Hat,
    PlusPlus,
    MinusMinus,

    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    DoubleEqual,
    NotEqual,
    LeftShift,
    RightShift,
    DoubleAmpersand,
    DoublePipe,
    DoubleHat,

    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    AmpersandEqual,
    PipeEqual,
    HatEqual,
    LeftShiftEqual,
    RightShiftEqual,
}

impl TokenKind {
    /// Tokens that can start a declaration regardless of what is in scope.
    pub fn is_type_introducer(&self) -> bool {
        matches!(
            self,
            TokenKind::Const
                | TokenKind::In
                | TokenKind::Out
                | TokenKind::InOut
                | TokenKind::Invariant
                | TokenKind::Coherent
                | TokenKind::Volatile
                | TokenKind::Restrict
                | TokenKind::ReadOnly
                | TokenKind::WriteOnly
                | TokenKind::BuiltinType(_)
                | TokenKind::Struct
        )
    }

    fn lookup_symbol(&self) -> Option<String> {
        let three = THREE_SYMBOLS_TOKENS.entries().find(|(_, k)| *k == self);
        let two = TWO_SYMBOLS_TOKENS.entries().find(|(_, k)| *k == self);
        if let Some((s, _)) = three.or(two) {
            return Some(s.to_string());
        }
        ONE_SYMBOL_TOKENS
            .entries()
            .find(|(_, k)| *k == self)
            .map(|(c, _)| c.to_string())
    }

    fn lookup_keyword(&self) -> Option<&'static str> {
        KEYWORDS.entries().find(|(_, k)| *k == self).map(|(s, _)| *s)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => f.write_str("end of document"),
            TokenKind::Error(message) => f.write_str(message),
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::IntConst(i) => write!(f, "{}", i),
            TokenKind::UintConst(u) => write!(f, "{}u", u),
            TokenKind::FloatConst(v) => write!(f, "{:?}", v),
            TokenKind::DoubleConst(v) => write!(f, "{:?}lf", v),
            TokenKind::BuiltinType(basic) => {
                f.write_str(&crate::analyzer::Type::from(*basic).name())
            }
            kind => {
                if let Some(keyword) = kind.lookup_keyword() {
                    f.write_str(keyword)
                } else if let Some(symbol) = kind.lookup_symbol() {
                    f.write_str(&symbol)
                } else {
                    write!(f, "{:?}", kind)
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn is(&self, kind: &TokenKind) -> bool {
        &self.kind == kind
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}
