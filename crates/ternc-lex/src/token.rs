//! Token model.
//!
//! The token kind set is a closed interface consumed by the parser; the
//! longest-match rules in the lexer decide which kind wins when one lexeme
//! is a prefix of another (`=` vs `==`, `&` vs `&&` vs `&^` vs `&^=`).

use ternc_util::Span;

/// Kind of a lexical token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Unrecognized byte; the parser rejects it with a positional error.
    NoMatch,
    /// End of input, produced exactly once with an empty lexeme.
    Eof,

    // Trivia, skipped by the parser but carrying the raw text so a token
    // stream can reproduce its input.
    /// Maximal run of whitespace.
    Space,
    /// `#` through end of line, exclusive of the newline.
    Comment,

    // Delimiters.
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Dot,
    Comma,
    Colon,
    Semicolon,

    // Arithmetic.
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Increment / decrement.
    Inc,
    Dec,

    // Bitwise.
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,

    // Comparison.
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical.
    LogicalAnd,
    LogicalOr,
    LogicalNot,

    // Assignment.
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AndNotAssign,

    // Literals and names.
    Integer,
    Float,
    Str,
    Name,
}

impl TokenKind {
    /// Trivia tokens are lexed but discarded before the parser sees them.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::Comment)
    }
}

/// A lexical token: kind, owned lexeme, and the source span it was
/// scanned from (byte range plus 1-based line/column of its first
/// character).
///
/// String literals carry their contents without the `"` delimiters while
/// the span still covers the whole literal, quotes included; the `Eof`
/// token carries an empty lexeme.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}
