//! Literal, name, and trivia lexing.

use crate::lexer::LexError;
use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a maximal run of whitespace as a single trivia token.
    pub(crate) fn lex_space(&mut self) -> TokenKind {
        while self.cursor.current_char().is_ascii_whitespace() {
            self.cursor.advance();
        }
        TokenKind::Space
    }

    /// Lexes a `#` comment through end of line, exclusive of the newline.
    pub(crate) fn lex_comment(&mut self) -> TokenKind {
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
        TokenKind::Comment
    }

    /// Lexes a number literal.
    ///
    /// A digit run is an integer; the first `.` inside it promotes the
    /// literal to a float and digits keep accumulating; a second `.`
    /// terminates the literal.
    pub(crate) fn lex_number(&mut self) -> TokenKind {
        let mut kind = TokenKind::Integer;
        while self.cursor.current_char().is_ascii_digit()
            || (kind == TokenKind::Integer && self.cursor.current_char() == '.')
        {
            if self.cursor.current_char() == '.' {
                kind = TokenKind::Float;
            }
            self.cursor.advance();
        }
        kind
    }

    /// Lexes a name: a letter followed by letters, digits, or `_`.
    pub(crate) fn lex_name(&mut self) -> TokenKind {
        while self.cursor.current_char().is_ascii_alphanumeric()
            || self.cursor.current_char() == '_'
        {
            self.cursor.advance();
        }
        TokenKind::Name
    }

    /// Lexes a string literal between `"` delimiters.
    ///
    /// No escape processing; the delimiters are not part of the lexeme.
    /// Hitting end of input before the closing quote is fatal.
    pub(crate) fn lex_string(&mut self) -> Result<Token, LexError> {
        self.cursor.advance();
        let start = self.cursor.position();
        while self.cursor.current_char() != '"' {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedString {
                    line: self.token_line,
                    col: self.token_col,
                });
            }
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start).to_string();
        self.cursor.advance();
        // The span covers the whole literal, quotes included.
        Ok(Token::new(TokenKind::Str, text, self.token_span()))
    }
}
