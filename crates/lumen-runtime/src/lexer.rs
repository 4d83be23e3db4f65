//! Scanner (tokenizer).
//!
//! The scanner is an external collaborator of the compiler core (§1): the
//! compiler only depends on it producing a finite, ordered token stream
//! terminated by [`TokenKind::Eof`]. This implementation recognizes the
//! surface described in §6: `let`/`const`, arithmetic and comparison
//! operators, `and`/`or`/`!`, `fn`, control flow, `print`, `switch`, pre/post
//! `++`/`--`, string literals in `"` or `'` with backslash escapes, and line
//! (`//`) and block (`/* */`) comments.

use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    start_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_column: 1,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.current;
        self.start_column = self.column;

        if self.is_at_end() {
            return self.make(TokenKind::Eof, "");
        }

        let c = self.advance();
        match c {
            b'(' => self.make(TokenKind::LeftParen, "("),
            b')' => self.make(TokenKind::RightParen, ")"),
            b'{' => self.make(TokenKind::LeftBrace, "{"),
            b'}' => self.make(TokenKind::RightBrace, "}"),
            b',' => self.make(TokenKind::Comma, ","),
            b';' => self.make(TokenKind::Semicolon, ";"),
            b':' => self.make(TokenKind::Colon, ":"),
            b'+' => {
                if self.match_char(b'+') {
                    self.make(TokenKind::PlusPlus, "++")
                } else {
                    self.make(TokenKind::Plus, "+")
                }
            }
            b'-' => {
                if self.match_char(b'-') {
                    self.make(TokenKind::MinusMinus, "--")
                } else if self.match_char(b'>') {
                    self.make(TokenKind::Arrow, "->")
                } else {
                    self.make(TokenKind::Minus, "-")
                }
            }
            b'*' => self.make(TokenKind::Star, "*"),
            b'/' => self.make(TokenKind::Slash, "/"),
            b'!' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::BangEqual, "!=")
                } else {
                    self.make(TokenKind::Bang, "!")
                }
            }
            b'=' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::EqualEqual, "==")
                } else {
                    self.make(TokenKind::Equal, "=")
                }
            }
            b'<' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::LessEqual, "<=")
                } else {
                    self.make(TokenKind::Less, "<")
                }
            }
            b'>' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::GreaterEqual, ">=")
                } else {
                    self.make(TokenKind::Greater, ">")
                }
            }
            b'"' | b'\'' => self.string(c),
            b'_' if !self.peek().is_ascii_alphanumeric() && self.peek() != b'_' => {
                self.make(TokenKind::Underscore, "_")
            }
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == b'_' => self.identifier(),
            _ => self.error(format!("Unexpected character '{}'.", c as char)),
        }
    }

    fn string(&mut self, quote: u8) -> Token {
        let mut value = String::new();
        while !self.is_at_end() && self.peek() != quote {
            let c = self.advance();
            if c == b'\n' {
                self.line += 1;
                self.column = 1;
            }
            if c == b'\\' && !self.is_at_end() {
                let escaped = self.advance();
                value.push(match escaped {
                    b'n' => '\n',
                    b't' => '\t',
                    b'r' => '\r',
                    b'\\' => '\\',
                    b'"' => '"',
                    b'\'' => '\'',
                    b'0' => '\0',
                    other => other as char,
                });
            } else {
                value.push(c as char);
            }
        }

        if self.is_at_end() {
            return self.error("Unterminated string.".to_string());
        }
        self.advance(); // closing quote

        let span = Span::new(self.line, self.start_column);
        Token::new(TokenKind::String(value.clone()), value, span)
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text = std::str::from_utf8(&self.source[self.start..self.current]).unwrap();
        let value: f64 = text.parse().unwrap();
        self.make(TokenKind::Number(value), text)
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[self.start..self.current]).unwrap();
        let kind = match text {
            "and" => TokenKind::And,
            "break" => TokenKind::Break,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "fn" => TokenKind::Fn,
            "for" => TokenKind::For,
            "if" => TokenKind::If,
            "let" => TokenKind::Let,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "switch" => TokenKind::Switch,
            "true" => TokenKind::True,
            "while" => TokenKind::While,
            _ => TokenKind::Identifier,
        };
        self.make(kind, text)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.advance();
                }
                b'\n' => {
                    self.line += 1;
                    self.column = 1;
                    self.current += 1;
                }
                b'/' if self.peek_next() == b'/' => {
                    while !self.is_at_end() && self.peek() != b'\n' {
                        self.advance();
                    }
                }
                b'/' if self.peek_next() == b'*' => {
                    self.advance();
                    self.advance();
                    while !self.is_at_end() && !(self.peek() == b'*' && self.peek_next() == b'/') {
                        if self.peek() == b'\n' {
                            self.line += 1;
                            self.column = 1;
                        }
                        self.advance();
                    }
                    if !self.is_at_end() {
                        self.advance();
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        self.column += 1;
        true
    }

    fn make(&self, kind: TokenKind, lexeme: impl Into<String>) -> Token {
        Token::new(kind, lexeme, Span::new(self.line, self.start_column))
    }

    fn error(&self, message: String) -> Token {
        Token::new(TokenKind::Error, message, Span::new(self.line, self.start_column))
    }
}
