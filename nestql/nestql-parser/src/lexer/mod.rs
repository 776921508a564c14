pub mod lr;
#[cfg(test)]
mod test;

use std::collections::VecDeque;
use std::io::Read;

use crate::error::{Annotate, Error, Reason};
use crate::span::Span;
use crate::Result;
use lr::{Token, TokenKind};

/// Upper bound on the rune history kept for unreads.
const MAX_HISTORY: usize = 4096;

/// Buffered rune source over any byte reader. Decodes UTF-8 on demand and
/// keeps a sliding history of the most recent runes so reads can be replayed.
pub struct RuneReader<R> {
    inner: R,
    bytes: Vec<u8>,
    byte_pos: usize,
    history: VecDeque<char>,
    unreads: usize,
}

impl<R: Read> RuneReader<R> {
    pub fn new(inner: R) -> Self {
        RuneReader {
            inner,
            bytes: Vec::new(),
            byte_pos: 0,
            history: VecDeque::new(),
            unreads: 0,
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        if self.byte_pos == self.bytes.len() {
            self.bytes.resize(4096, 0);
            // an I/O failure ends the rune stream, like exhausted input
            let n = self.inner.read(&mut self.bytes).unwrap_or(0);
            if n == 0 {
                self.bytes.clear();
                self.byte_pos = 0;
                return None;
            }
            self.bytes.truncate(n);
            self.byte_pos = 0;
        }
        let b = self.bytes[self.byte_pos];
        self.byte_pos += 1;
        Some(b)
    }

    fn decode_rune(&mut self) -> Option<char> {
        let b0 = self.next_byte()?;
        let tail = match b0 {
            0x00..=0x7f => return Some(b0 as char),
            0xc0..=0xdf => 1,
            0xe0..=0xef => 2,
            0xf0..=0xf7 => 3,
            _ => return Some(char::REPLACEMENT_CHARACTER),
        };
        let mut seq = [b0, 0, 0, 0];
        for slot in seq.iter_mut().skip(1).take(tail) {
            match self.next_byte() {
                Some(b) if b & 0xc0 == 0x80 => *slot = b,
                _ => return Some(char::REPLACEMENT_CHARACTER),
            }
        }
        match std::str::from_utf8(&seq[..tail + 1]) {
            Ok(s) => s.chars().next(),
            Err(_) => Some(char::REPLACEMENT_CHARACTER),
        }
    }

    fn record(&mut self, c: char) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(c);
    }

    /// Next rune, replaying pending unreads first.
    pub fn read(&mut self) -> Option<char> {
        if self.unreads > 0 {
            let c = self.history[self.history.len() - self.unreads];
            self.unreads -= 1;
            return Some(c);
        }
        let c = self.decode_rune()?;
        self.record(c);
        Some(c)
    }

    /// Steps one rune back. Fails once the pending unread count reaches the
    /// recorded history length.
    pub fn unread(&mut self) -> Result<()> {
        if self.unreads < self.history.len() {
            self.unreads += 1;
            Ok(())
        } else {
            Err(Error::lexical("cannot step back past the recorded rune history"))
        }
    }

    /// Drops the recorded history and any pending unreads.
    pub fn reset(&mut self) {
        self.history.clear();
        self.unreads = 0;
    }
}

struct TokenRecord {
    kind: TokenKind,
    len: usize,
    line: usize,
    pos: usize,
    offset: usize,
}

/// The lexical phase: emits [Token]s with line/column positions and supports
/// rewinding whole tokens back onto the rune stream.
pub struct Scanner<R> {
    rd: RuneReader<R>,
    line: usize,
    pos: usize,
    offset: usize,
    lock_pos: bool,
    reads: Vec<TokenRecord>,
}

impl<R: Read> Scanner<R> {
    pub fn new(input: R) -> Self {
        Scanner {
            rd: RuneReader::new(input),
            line: 1,
            pos: 0,
            offset: 0,
            lock_pos: false,
            reads: Vec::new(),
        }
    }

    /// Back to the top: counters at the origin, token stack and rune history
    /// dropped.
    pub fn reset(&mut self) {
        self.line = 1;
        self.pos = 0;
        self.offset = 0;
        self.lock_pos = false;
        self.reads.clear();
        self.rd.reset();
    }

    fn read(&mut self) -> Option<char> {
        let c = self.rd.read()?;
        if !self.lock_pos {
            self.pos += 1;
            self.offset += 1;
        }
        Some(c)
    }

    fn unread_rune(&mut self) {
        if !self.lock_pos {
            self.pos = self.pos.saturating_sub(1);
            self.offset = self.offset.saturating_sub(1);
        }
        let _ = self.rd.unread();
    }

    fn count_line_break(&mut self, c: char) {
        if c == '\n' || c == '\r' {
            self.line += 1;
            self.pos = 0;
        }
    }

    fn token(&self, kind: TokenKind, text: String, at: (usize, usize, usize)) -> Token {
        let (line, pos, offset) = at;
        Token {
            kind,
            text,
            line,
            pos,
            span: Span {
                start: offset,
                end: self.offset,
            },
        }
    }

    fn record(&mut self, tok: Token, at: (usize, usize, usize)) -> Token {
        let (line, pos, offset) = at;
        self.reads.push(TokenRecord {
            kind: tok.kind,
            len: tok.len(),
            line,
            pos,
            offset,
        });
        tok
    }

    /// Never fails and never returns "nothing": exhausted or foreign input
    /// yields an [TokenKind::Eof] sentinel with empty text.
    pub fn scan(&mut self) -> Token {
        let at = (self.line, self.pos, self.offset);
        let Some(c) = self.read() else {
            return self.token(TokenKind::Eof, String::new(), at);
        };

        if is_whitespace(c) {
            self.unread_rune();
            let tok = self.scan_whitespace(at);
            return self.record(tok, at);
        }
        if is_ident_start(c) {
            self.unread_rune();
            let tok = self.scan_ident(at);
            return self.record(tok, at);
        }
        if c == '(' {
            self.unread_rune();
            let tok = self.scan_arg_list(at);
            if tok.kind == TokenKind::Invalid {
                return tok;
            }
            return self.record(tok, at);
        }

        match c {
            '{' => {
                let tok = self.token(TokenKind::GroupStart, c.to_string(), at);
                self.record(tok, at)
            }
            '}' => {
                let tok = self.token(TokenKind::GroupEnd, c.to_string(), at);
                self.record(tok, at)
            }
            ',' => {
                let tok = self.token(TokenKind::Comma, c.to_string(), at);
                self.record(tok, at)
            }
            // any other rune ends the useful input
            _ => self.token(TokenKind::Eof, String::new(), at),
        }
    }

    /// Skips over whitespace and returns the next significant token.
    pub fn scan_significant(&mut self) -> Token {
        loop {
            let tok = self.scan();
            if tok.kind != TokenKind::Whitespace {
                return tok;
            }
        }
    }

    fn scan_whitespace(&mut self, at: (usize, usize, usize)) -> Token {
        let mut buff = String::new();
        while let Some(c) = self.read() {
            if !is_whitespace(c) {
                self.unread_rune();
                break;
            }
            self.count_line_break(c);
            buff.push(c);
        }
        self.token(TokenKind::Whitespace, buff, at)
    }

    fn scan_ident(&mut self, at: (usize, usize, usize)) -> Token {
        let mut buff = String::new();
        while let Some(c) = self.read() {
            if is_whitespace(c) || is_special(c) || c == ',' {
                self.unread_rune();
                break;
            }
            buff.push(c);
        }
        self.token(TokenKind::Ident, buff, at)
    }

    fn scan_arg_list(&mut self, at: (usize, usize, usize)) -> Token {
        let mut buff = String::new();
        loop {
            let Some(c) = self.read() else {
                // unterminated argument list
                return self.token(TokenKind::Invalid, buff, at);
            };
            self.count_line_break(c);
            buff.push(c);
            if c == ')' {
                break;
            }
        }
        self.token(TokenKind::ArgList, buff, at)
    }

    /// Rewinds the rune stream by the most recently scanned token and restores
    /// the position counters to that token's start. Returns the rewound kind;
    /// an empty token stack is a no-op.
    pub fn unread_last_token(&mut self) -> Result<Option<TokenKind>> {
        let Some(last) = self.reads.pop() else {
            return Ok(None);
        };

        self.lock_pos = true;
        let mut rewound = Ok(());
        for _ in 0..last.len {
            rewound = self.rd.unread();
            if rewound.is_err() {
                break;
            }
        }
        self.lock_pos = false;
        rewound.map_err(|e| {
            e.hint(format!(
                "a token of {} runes exceeds the rewind buffer",
                last.len
            ))
        })?;

        self.line = last.line;
        self.pos = last.pos;
        self.offset = last.offset;
        Ok(Some(last.kind))
    }
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n' || c == '\r'
}

fn is_ident_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_special(c: char) -> bool {
    matches!(c, '(' | ')' | '{' | '}')
}

impl Token {
    pub(crate) fn syntax_error(&self, expected: &str, who: Option<String>) -> Error {
        Error::new(Reason::Syntax {
            who,
            expected: expected.to_string(),
            found: match self.kind {
                TokenKind::Ident | TokenKind::ArgList => format!("`{}`", self.text),
                kind => kind.to_string(),
            },
        })
        .locate(self.span)
    }
}
