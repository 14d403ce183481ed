use crate::error::Position;

use super::{
    token::{KEYWORDS, ONE_SYMBOL_TOKENS, THREE_SYMBOLS_TOKENS, TWO_SYMBOLS_TOKENS},
    Token, TokenKind,
};

#[derive(Debug)]
pub struct Lexer {
    tokens: Vec<Token>,
    index: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    fn new() -> Self {
        Self {
            tokens: vec![],
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn skip(&mut self, chars: &[char], n: usize) {
        for &c in &chars[self.index..self.index + n] {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.index += n;
    }

    fn new_token(&mut self, chars: &[char], kind: TokenKind, len: usize) {
        self.tokens.push(Token {
            kind,
            position: self.position(),
        });
        self.skip(chars, len);
    }

    fn skip_comment(&mut self, chars: &[char]) -> bool {
        let rest = &chars[self.index..];
        match rest {
            ['/', '/', ..] => {
                let len = rest.iter().take_while(|&&c| c != '\n').count();
                self.skip(chars, len);
                true
            }
            ['/', '*', ..] => {
                let end = rest.windows(2).skip(2).position(|w| w == ['*', '/']);
                let len = match end {
                    Some(i) => i + 4,
                    None => {
                        self.tokens.push(Token {
                            kind: TokenKind::Error("Unterminated comment".to_string()),
                            position: self.position(),
                        });
                        rest.len()
                    }
                };
                self.skip(chars, len);
                true
            }
            _ => false,
        }
    }

    /// number = "0x" hex+ ("u")?
    ///        | digit* ("." digit*)? (("e" | "E") ("+" | "-")? digit+)? suffix?
    fn parse_number(&mut self, chars: &[char]) {
        let rest = &chars[self.index..];

        if rest.len() > 1 && rest[0] == '0' && (rest[1] == 'x' || rest[1] == 'X') {
            let digits: String = rest[2..].iter().take_while(|c| c.is_ascii_hexdigit()).collect();
            let mut len = 2 + digits.len();
            let unsigned = matches!(rest.get(len), Some('u' | 'U'));
            if unsigned {
                len += 1;
            }
            let kind = match u32::from_str_radix(&digits, 16) {
                Ok(v) => Self::integer_kind(v, unsigned),
                Err(_) => TokenKind::Error(format!("Invalid hexadecimal constant \"{}\"", digits)),
            };
            self.new_token(chars, kind, len);
            return;
        }

        let mut len = rest.iter().take_while(|c| c.is_ascii_digit()).count();
        let mut is_float = false;
        if rest.get(len) == Some(&'.') {
            is_float = true;
            len += 1;
            len += rest[len..].iter().take_while(|c| c.is_ascii_digit()).count();
        }
        if matches!(rest.get(len), Some('e' | 'E')) {
            let mut exp = len + 1;
            if matches!(rest.get(exp), Some('+' | '-')) {
                exp += 1;
            }
            let digits = rest[exp..].iter().take_while(|c| c.is_ascii_digit()).count();
            if digits > 0 {
                is_float = true;
                len = exp + digits;
            }
        }
        let s: String = rest[..len].iter().collect();

        let kind = match rest.get(len) {
            Some('f' | 'F') => {
                len += 1;
                Self::float_kind(&s, false)
            }
            Some('l') if rest.get(len + 1) == Some(&'f') => {
                len += 2;
                Self::float_kind(&s, true)
            }
            Some('L') if rest.get(len + 1) == Some(&'F') => {
                len += 2;
                Self::float_kind(&s, true)
            }
            _ if is_float => Self::float_kind(&s, false),
            Some('u' | 'U') => {
                len += 1;
                Self::parse_integer(&s, true)
            }
            _ => Self::parse_integer(&s, false),
        };
        self.new_token(chars, kind, len);
    }

    fn float_kind(s: &str, double: bool) -> TokenKind {
        if double {
            match s.parse() {
                Ok(v) => TokenKind::DoubleConst(v),
                Err(_) => TokenKind::Error(format!("Invalid double constant \"{}\"", s)),
            }
        } else {
            match s.parse() {
                Ok(v) => TokenKind::FloatConst(v),
                Err(_) => TokenKind::Error(format!("Invalid float constant \"{}\"", s)),
            }
        }
    }

    fn parse_integer(s: &str, unsigned: bool) -> TokenKind {
        let (digits, radix) = if s.len() > 1 && s.starts_with('0') {
            (&s[1..], 8)
        } else {
            (s, 10)
        };
        match u32::from_str_radix(digits, radix) {
            Ok(v) => Self::integer_kind(v, unsigned),
            Err(_) => TokenKind::Error(format!("Invalid integer constant \"{}\"", s)),
        }
    }

    fn integer_kind(v: u32, unsigned: bool) -> TokenKind {
        if unsigned {
            TokenKind::UintConst(v)
        } else {
            TokenKind::IntConst(v as i32)
        }
    }

    fn parse_identifier(&mut self, chars: &[char]) {
        let s: String = chars[self.index..]
            .iter()
            .take_while(|&&c| c.is_ascii_alphanumeric() || c == '_')
            .collect();
        let len = s.len();

        if let Some(kind) = KEYWORDS.get(&s) {
            self.new_token(chars, kind.clone(), len);
        } else {
            self.new_token(chars, TokenKind::Ident(s), len);
        }
    }

    fn _tokenize(&mut self, s: &str) {
        let chars: Vec<_> = s.chars().collect();

        while self.index < chars.len() {
            let c = chars[self.index];
            let next = chars.get(self.index + 1).copied();
            let c2 = chars[self.index..].iter().take(2).collect::<String>();
            let c3 = chars[self.index..].iter().take(3).collect::<String>();

            if c.is_whitespace() {
                self.skip(&chars, 1);
            } else if self.skip_comment(&chars) {
                continue;
            } else if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
                self.parse_number(&chars);
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.parse_identifier(&chars);
            } else if let Some(kind) = THREE_SYMBOLS_TOKENS.get(&c3) {
                self.new_token(&chars, kind.clone(), 3);
            } else if let Some(kind) = TWO_SYMBOLS_TOKENS.get(&c2) {
                self.new_token(&chars, kind.clone(), 2);
            } else if let Some(kind) = ONE_SYMBOL_TOKENS.get(&c) {
                self.new_token(&chars, kind.clone(), 1);
            } else {
                let kind = TokenKind::Error(format!("Unexpected character '{}'", c));
                self.new_token(&chars, kind, 1);
            }
        }

        let position = self.position();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            position,
        });
    }

    /// Splits `s` into tokens. Never fails: garbage becomes `TokenKind::Error` tokens, and the
    /// stream always ends with `TokenKind::Eof`.
    pub fn tokenize(s: &str) -> Vec<Token> {
        let mut lexer = Lexer::new();
        lexer._tokenize(s);

        lexer.tokens
    }
}
