use serde::Serialize;

use crate::span::Span;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Tokens(pub Vec<Token>);

/// One lexeme of the query surface syntax. `text` carries the raw source text;
/// for [TokenKind::ArgList] it includes the surrounding parentheses.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based source line of the token's first rune.
    pub line: usize,
    /// 0-based column of the token's first rune.
    pub pos: usize,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum TokenKind {
    Invalid,
    Eof,
    Whitespace,
    Comma,
    Ident,
    /// A parenthesized argument run, e.g. `(id:4, rack)`. Parentheses do not
    /// nest inside it.
    ArgList,
    GroupStart,
    GroupEnd,
}

impl Token {
    /// Token length in runes, the unit the scanner rewinds by.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Invalid => write!(f, "invalid input"),
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Whitespace => write!(f, "whitespace"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Ident => write!(f, "an identifier"),
            TokenKind::ArgList => write!(f, "an argument list"),
            TokenKind::GroupStart => write!(f, "`{{`"),
            TokenKind::GroupEnd => write!(f, "`}}`"),
        }
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}..{}: {:?} {:?}",
            self.span.start, self.span.end, self.kind, self.text
        )
    }
}
