//! Expression parsing.
//!
//! Precedence climbing over a level-indexed operator table; every level
//! is left-associative. Unary prefix operators bind tighter than all
//! binary operators, postfix `++`/`--` tighter still. Type information is
//! propagated as the tree is built: operands of a binary operator must
//! match and yield the common type, comparisons yield `int`, unary forms
//! preserve their operand's type.

use ternc_lex::{Token, TokenKind};
use ternc_util::SymbolKind;

use crate::ast::{Expression, Leaf};
use crate::types::{Scalar, TypeInfo};
use crate::{Error, Parser};

/// Binary operator table, lowest precedence first.
const PRECEDENCE: &[&[TokenKind]] = &[
    &[TokenKind::LogicalOr],
    &[TokenKind::LogicalAnd],
    &[
        TokenKind::Eq,
        TokenKind::Ne,
        TokenKind::Lt,
        TokenKind::Le,
        TokenKind::Gt,
        TokenKind::Ge,
    ],
    &[
        TokenKind::Add,
        TokenKind::Sub,
        TokenKind::Or,
        TokenKind::Xor,
    ],
    &[
        TokenKind::Mul,
        TokenKind::Div,
        TokenKind::Rem,
        TokenKind::Shl,
        TokenKind::Shr,
        TokenKind::And,
        TokenKind::AndNot,
    ],
];

/// Unary prefix operators.
const UNARY: &[TokenKind] = &[TokenKind::Sub, TokenKind::LogicalNot, TokenKind::Xor];

/// Postfix operators, parsed as unary forms with a left operand only.
const POSTFIX: &[TokenKind] = &[TokenKind::Inc, TokenKind::Dec];

fn is_comparison(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge
    )
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, Error> {
        self.parse_binary_expression(0)
    }

    fn parse_binary_expression(&mut self, level: usize) -> Result<Expression, Error> {
        if level >= PRECEDENCE.len() {
            return self.parse_unary_expression();
        }

        let mut left = self.parse_binary_expression(level + 1)?;
        while let Some(op_token) = self.accept(PRECEDENCE[level])? {
            let right = self.parse_binary_expression(level + 1)?;
            left = self.binary_expression(op_token, left, right)?;
        }
        Ok(left)
    }

    fn binary_expression(
        &self,
        token: Token,
        left: Expression,
        right: Expression,
    ) -> Result<Expression, Error> {
        if left.type_info != right.type_info {
            return Err(self.error_at(&token, "Operand types do not match"));
        }
        let type_info = if is_comparison(token.kind) {
            TypeInfo::scalar(Scalar::Int)
        } else {
            left.type_info.clone()
        };
        Ok(Expression::binary(token, left, right, type_info))
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, Error> {
        if let Some(op_token) = self.accept(UNARY)? {
            let operand = self.parse_unary_expression()?;
            let type_info = operand.type_info.clone();
            return Ok(Expression::unary(op_token, operand, type_info));
        }
        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, Error> {
        let mut expression = self.parse_factor()?;
        while let Some(op_token) = self.accept(POSTFIX)? {
            let type_info = expression.type_info.clone();
            expression = Expression::unary(op_token, expression, type_info);
        }
        Ok(expression)
    }

    /// Primary expressions: parenthesized expression, literals, resolved
    /// names (variable load or call), and array literals.
    fn parse_factor(&mut self) -> Result<Expression, Error> {
        if self.accept(&[TokenKind::LParen])?.is_some() {
            let expression = self.parse_expression()?;
            self.expect(&[TokenKind::RParen])?;
            return Ok(expression);
        }

        if let Some(token) = self.accept(&[TokenKind::Integer])? {
            let value: i64 = token
                .text
                .parse()
                .map_err(|_| self.error_at(&token, "Invalid number literal"))?;
            return Ok(Expression::leaf(
                token,
                Leaf::Integer(value),
                TypeInfo::scalar(Scalar::Int),
            ));
        }

        if let Some(token) = self.accept(&[TokenKind::Float])? {
            let value: f64 = token
                .text
                .parse()
                .map_err(|_| self.error_at(&token, "Invalid number literal"))?;
            return Ok(Expression::leaf(
                token,
                Leaf::Float(value),
                TypeInfo::scalar(Scalar::Float),
            ));
        }

        if self.current_kind() == TokenKind::Name {
            return self.parse_name_factor();
        }

        if let Some(token) = self.accept(&[TokenKind::LBrace])? {
            return self.parse_array_literal(token);
        }

        Err(self.error("Unexpected token"))
    }

    /// A name in expression position: a variable load or a function call.
    fn parse_name_factor(&mut self) -> Result<Expression, Error> {
        let name_token = self.expect(&[TokenKind::Name])?;

        let (kind, type_info) = match self.scopes.resolve(&name_token.text) {
            Some(symbol) => (symbol.kind, symbol.payload.clone()),
            None => return Err(self.error_at(&name_token, "Symbol not found")),
        };

        match kind {
            SymbolKind::Function => {
                let call = match self.parse_call(&name_token.text, type_info.clone())? {
                    Some(call) => call,
                    None => return Err(self.error("Function call missing")),
                };
                Ok(Expression::leaf(name_token, Leaf::Call(call), type_info))
            }
            SymbolKind::Variable | SymbolKind::Arg => {
                let leaf = Leaf::Name(name_token.text.clone());
                Ok(Expression::leaf(name_token, leaf, type_info))
            }
            SymbolKind::Type => Err(self.error_at(&name_token, "Invalid symbol found")),
        }
    }

    /// `{ e, e, … }` — the element type comes from the first element; an
    /// empty literal stays `Infer` with an unknown dimension.
    fn parse_array_literal(&mut self, lbrace: Token) -> Result<Expression, Error> {
        let mut elements = Vec::new();
        if self.current_kind() != TokenKind::RBrace {
            elements.push(self.parse_expression()?);
            while self.accept(&[TokenKind::Comma])?.is_some() {
                elements.push(self.parse_expression()?);
            }
        }
        self.expect(&[TokenKind::RBrace])?;

        let type_info = match elements.first() {
            Some(first) => {
                let mut dims = vec![elements.len() as i64];
                dims.extend_from_slice(&first.type_info.dims);
                TypeInfo::array(first.type_info.scalar, dims)
            }
            None => TypeInfo::array(Scalar::Infer, vec![-1]),
        };

        Ok(Expression::leaf(lbrace, Leaf::Array(elements), type_info))
    }
}
