//! Operator lexing.
//!
//! Each method owns one leading character and resolves the longest legal
//! operator from there with `match_char` cascades.

use crate::token::TokenKind;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Handles: `+`, `++`, `+=`
    pub(crate) fn lex_plus(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('+') {
            TokenKind::Inc
        } else if self.cursor.match_char('=') {
            TokenKind::AddAssign
        } else {
            TokenKind::Add
        }
    }

    /// Handles: `-`, `--`, `-=`
    pub(crate) fn lex_minus(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('-') {
            TokenKind::Dec
        } else if self.cursor.match_char('=') {
            TokenKind::SubAssign
        } else {
            TokenKind::Sub
        }
    }

    /// Handles: `*`, `*=`
    pub(crate) fn lex_star(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            TokenKind::MulAssign
        } else {
            TokenKind::Mul
        }
    }

    /// Handles: `/`, `/=`
    pub(crate) fn lex_slash(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            TokenKind::DivAssign
        } else {
            TokenKind::Div
        }
    }

    /// Handles: `%`, `%=`
    pub(crate) fn lex_percent(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            TokenKind::RemAssign
        } else {
            TokenKind::Rem
        }
    }

    /// Handles: `&`, `&&`, `&=`, `&^`, `&^=`
    pub(crate) fn lex_ampersand(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('&') {
            TokenKind::LogicalAnd
        } else if self.cursor.match_char('=') {
            TokenKind::AndAssign
        } else if self.cursor.match_char('^') {
            if self.cursor.match_char('=') {
                TokenKind::AndNotAssign
            } else {
                TokenKind::AndNot
            }
        } else {
            TokenKind::And
        }
    }

    /// Handles: `|`, `||`, `|=`
    pub(crate) fn lex_pipe(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('|') {
            TokenKind::LogicalOr
        } else if self.cursor.match_char('=') {
            TokenKind::OrAssign
        } else {
            TokenKind::Or
        }
    }

    /// Handles: `^`, `^=`
    pub(crate) fn lex_caret(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            TokenKind::XorAssign
        } else {
            TokenKind::Xor
        }
    }

    /// Handles: `<`, `<=`, `<<`, `<<=`
    pub(crate) fn lex_less(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('<') {
            if self.cursor.match_char('=') {
                TokenKind::ShlAssign
            } else {
                TokenKind::Shl
            }
        } else if self.cursor.match_char('=') {
            TokenKind::Le
        } else {
            TokenKind::Lt
        }
    }

    /// Handles: `>`, `>=`, `>>`, `>>=`
    pub(crate) fn lex_greater(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('>') {
            if self.cursor.match_char('=') {
                TokenKind::ShrAssign
            } else {
                TokenKind::Shr
            }
        } else if self.cursor.match_char('=') {
            TokenKind::Ge
        } else {
            TokenKind::Gt
        }
    }

    /// Handles: `=`, `==`
    pub(crate) fn lex_equals(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            TokenKind::Eq
        } else {
            TokenKind::Assign
        }
    }

    /// Handles: `!`, `!=`
    pub(crate) fn lex_bang(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            TokenKind::Ne
        } else {
            TokenKind::LogicalNot
        }
    }
}
