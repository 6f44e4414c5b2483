//! ternc-lex - Lexical analysis for the Tern language.
//!
//! Transforms source text into a flat token stream with source positions.
//! The scanner is direct-coded with one character of lookahead; operator
//! families resolve greedily to the longest legal lexeme (`&` vs `&&` vs
//! `&^` vs `&^=`). Whitespace and comments are emitted as trivia tokens
//! and discarded by the parser, which keeps the stream faithful to the
//! input byte-for-byte.
//!
//! Keywords are not token kinds: `var`, `func`, and friends arrive as
//! `Name` tokens and are recognized by the parser.

pub mod cursor;
mod lexer;
mod token;

pub use lexer::{LexError, Lexer};
pub use token::{Token, TokenKind};

/// Lexes an entire source string, including the final `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
