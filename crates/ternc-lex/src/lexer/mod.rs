//! Core lexer implementation.
//!
//! One token per [`Lexer::next_token`] call, greedy longest-match with a
//! single character of lookahead. Whitespace and comments are emitted as
//! trivia tokens; concatenating the lexemes of every emitted token
//! reproduces the input (string literals excepted, their quotes are not
//! part of the lexeme).

mod literal;
mod operator;

use thiserror::Error;

use ternc_util::Span;

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Fatal lexical error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("Lexer Error <{line}:{col}> Unterminated string literal")]
    UnterminatedString { line: u32, col: u32 },
}

/// Lexer for Tern source code.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Starting byte offset of the current token.
    pub(crate) token_start: usize,

    /// Line where the current token starts (1-based).
    pub(crate) token_line: u32,

    /// Column where the current token starts (1-based).
    pub(crate) token_col: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_line: 1,
            token_col: 1,
        }
    }

    /// Returns the next token from the source.
    ///
    /// The final call yields an `Eof` token with an empty lexeme; an
    /// unrecognized byte yields a `NoMatch` token carrying that byte.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.token_start = self.cursor.position();
        self.token_line = self.cursor.line();
        self.token_col = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(self.finish(TokenKind::Eof));
        }

        let kind = match self.cursor.current_char() {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '.' => self.single(TokenKind::Dot),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semicolon),
            '+' => self.lex_plus(),
            '-' => self.lex_minus(),
            '*' => self.lex_star(),
            '/' => self.lex_slash(),
            '%' => self.lex_percent(),
            '&' => self.lex_ampersand(),
            '|' => self.lex_pipe(),
            '^' => self.lex_caret(),
            '<' => self.lex_less(),
            '>' => self.lex_greater(),
            '=' => self.lex_equals(),
            '!' => self.lex_bang(),
            '#' => self.lex_comment(),
            '"' => return self.lex_string(),
            c if c.is_ascii_whitespace() => self.lex_space(),
            c if c.is_ascii_alphabetic() => self.lex_name(),
            c if c.is_ascii_digit() => self.lex_number(),
            _ => {
                self.cursor.advance();
                TokenKind::NoMatch
            }
        };

        Ok(self.finish(kind))
    }

    /// Consumes one character and returns the given kind.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance();
        kind
    }

    /// Builds the token for the lexeme scanned since `token_start`.
    pub(crate) fn finish(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            self.cursor.slice_from(self.token_start),
            self.token_span(),
        )
    }

    /// Span of the bytes scanned since `token_start`.
    pub(crate) fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_line,
            self.token_col,
        )
    }
}
