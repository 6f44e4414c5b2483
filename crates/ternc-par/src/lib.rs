//! ternc-par - Parser for the Tern language.
//!
//! A recursive-descent parser that builds the typed AST in a single pass:
//! it drives the lexer through a one-token lookahead, pushes and pops
//! lexical scopes as it goes, inserts and resolves symbols, propagates
//! type information through every expression, and enforces the structural
//! rules (`func` only at top level, `break` only inside a loop, return
//! type unification).
//!
//! All errors are fatal and positional; there is no recovery and no
//! error accumulation.

pub mod ast;
mod expr;
mod stmt;
pub mod types;

use thiserror::Error;

use ternc_lex::{LexError, Lexer, Token, TokenKind};
use ternc_util::{RibKind, ScopeTree, Span, SymbolKind};

pub use ast::{Assignment, Block, Call, Expression, Function, IfBranch, Leaf, Node, Return, Variable, While};
pub use types::{Scalar, TypeInfo};

pub(crate) const VAR: &str = "var";
pub(crate) const FUNCTION: &str = "func";
pub(crate) const IF: &str = "if";
pub(crate) const ELSE: &str = "else";
pub(crate) const WHILE: &str = "while";
pub(crate) const BREAK: &str = "break";
pub(crate) const CONTINUE: &str = "continue";
pub(crate) const RETURN: &str = "return";

/// Fatal parse error with the position of the offending token.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Syntax Error <{line}:{col}> {message}")]
pub struct SyntaxError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

/// Any front-end failure: lexical or syntactic/semantic.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Per-rib parser payload: the enclosing function's return chain.
///
/// `ret` is `Some` only on `Function` ribs; `return` statements unify
/// against it and may resolve an `Infer` into a concrete type.
#[derive(Debug, Default)]
pub(crate) struct FnContext {
    pub(crate) ret: Option<TypeInfo>,
}

/// Recursive-descent parser with integrated scope and type resolution.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// One-token lookahead.
    current: Token,
    /// Lexical scopes; symbol payloads are type chains.
    pub(crate) scopes: ScopeTree<FnContext, TypeInfo>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the given source and installs the built-in
    /// symbols: the type names `int`/`float` and the external function
    /// `print_int`.
    pub fn new(source: &'a str) -> Result<Self, Error> {
        let mut scopes = ScopeTree::new(FnContext::default());
        scopes.insert("int", SymbolKind::Type, TypeInfo::scalar(Scalar::Int));
        scopes.insert("float", SymbolKind::Type, TypeInfo::scalar(Scalar::Float));
        scopes.insert("print_int", SymbolKind::Function, TypeInfo::scalar(Scalar::Int));

        let mut parser = Self {
            lexer: Lexer::new(source),
            current: Token::new(TokenKind::Eof, "", Span::point(1, 1)),
            scopes,
        };
        parser.next_token()?;
        Ok(parser)
    }

    /// Parses a whole source file into its top-level statement list.
    pub fn parse(&mut self) -> Result<Vec<Node>, Error> {
        let nodes = self.parse_statements()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.error("Unexpected token"));
        }
        Ok(nodes)
    }

    /// Parses statements until no production matches.
    pub(crate) fn parse_statements(&mut self) -> Result<Vec<Node>, Error> {
        let mut nodes = Vec::new();
        while let Some(node) = self.parse_statement()? {
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Parses one statement; `None` means no production matched the
    /// lookahead. The first matching rule wins.
    pub(crate) fn parse_statement(&mut self) -> Result<Option<Node>, Error> {
        if let Some(function) = self.parse_function()? {
            return Ok(Some(Node::Function(function)));
        }
        if let Some(branches) = self.parse_if()? {
            return Ok(Some(Node::If(branches)));
        }
        if let Some(while_) = self.parse_while()? {
            return Ok(Some(Node::While(while_)));
        }
        if let Some(node) = self.parse_break()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.parse_continue()? {
            return Ok(Some(node));
        }
        if let Some(return_) = self.parse_return()? {
            return Ok(Some(Node::Return(return_)));
        }
        if let Some(variable) = self.parse_variable()? {
            return Ok(Some(Node::Variable(variable)));
        }
        if let Some(node) = self.parse_name_statement()? {
            return Ok(Some(node));
        }
        Ok(None)
    }

    // =========================================================================
    // Acceptor primitives
    // =========================================================================

    /// Advances past trivia to the next significant token, returning the
    /// previous lookahead.
    fn next_token(&mut self) -> Result<Token, Error> {
        loop {
            let token = self.lexer.next_token()?;
            if !token.kind.is_trivia() {
                return Ok(std::mem::replace(&mut self.current, token));
            }
        }
    }

    /// Returns and consumes the lookahead if its kind is one of `kinds`.
    pub(crate) fn accept(&mut self, kinds: &[TokenKind]) -> Result<Option<Token>, Error> {
        if kinds.contains(&self.current.kind) {
            return Ok(Some(self.next_token()?));
        }
        Ok(None)
    }

    /// Like [`Parser::accept`] but fails with a positional diagnostic.
    pub(crate) fn expect(&mut self, kinds: &[TokenKind]) -> Result<Token, Error> {
        match self.accept(kinds)? {
            Some(token) => Ok(token),
            None => Err(self.error("Unexpected token")),
        }
    }

    /// Consumes a `Name` token whose lexeme equals `keyword`.
    pub(crate) fn accept_keyword(&mut self, keyword: &str) -> Result<Option<Token>, Error> {
        if self.current.kind == TokenKind::Name && self.current.text == keyword {
            return Ok(Some(self.next_token()?));
        }
        Ok(None)
    }

    /// Consumes a `Name` token resolving to a `Type` symbol and returns a
    /// copy of its type.
    pub(crate) fn accept_type(&mut self) -> Result<Option<TypeInfo>, Error> {
        if self.current.kind != TokenKind::Name {
            return Ok(None);
        }
        let type_info = match self.scopes.resolve(&self.current.text) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol.payload.clone(),
            _ => return Ok(None),
        };
        self.next_token()?;
        Ok(Some(type_info))
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Error at the current lookahead.
    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(&self.current, message)
    }

    /// Error at a previously consumed token, positioned by its span.
    pub(crate) fn error_at(&self, token: &Token, message: impl Into<String>) -> Error {
        SyntaxError {
            line: token.span.line,
            col: token.span.column,
            message: message.into(),
        }
        .into()
    }

    /// True when an enclosing `Function` rib exists.
    pub(crate) fn in_function(&self) -> bool {
        self.scopes.enclosing_info(RibKind::Function).is_some()
    }

    /// True when an enclosing `While` rib exists.
    pub(crate) fn in_loop(&self) -> bool {
        self.scopes.enclosing_info(RibKind::While).is_some()
    }
}

/// Parses a complete source file.
pub fn parse(source: &str) -> Result<Vec<Node>, Error> {
    Parser::new(source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Vec<Node> {
        parse(source).unwrap()
    }

    fn parse_err(source: &str) -> String {
        parse(source).unwrap_err().to_string()
    }

    #[test]
    fn test_literal_assignment_tree() {
        let nodes = parse_ok("var x: int = 41 + 1;");
        assert_eq!(nodes.len(), 1);
        let Node::Variable(variable) = &nodes[0] else {
            panic!("expected variable, got {:?}", nodes[0]);
        };
        assert_eq!(variable.name, "x");
        assert_eq!(variable.type_info, TypeInfo::scalar(Scalar::Int));

        let assignment = variable.assignment.as_ref().unwrap();
        assert_eq!(assignment.name, "x");
        assert_eq!(assignment.type_info, TypeInfo::scalar(Scalar::Int));

        let expr = &assignment.expression;
        assert_eq!(expr.token.kind, TokenKind::Add);
        assert_eq!(expr.type_info, TypeInfo::scalar(Scalar::Int));
        assert_eq!(
            expr.left.as_ref().unwrap().leaf,
            Some(Leaf::Integer(41))
        );
        assert_eq!(expr.right.as_ref().unwrap().leaf, Some(Leaf::Integer(1)));
    }

    #[test]
    fn test_variable_type_is_inferred_from_expression() {
        let nodes = parse_ok("var x = 2.5;");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        assert_eq!(variable.type_info, TypeInfo::scalar(Scalar::Float));
    }

    #[test]
    fn test_variable_without_type_or_expression_fails() {
        assert!(parse_err("var x;").contains("Variable needs assignment"));
    }

    #[test]
    fn test_variable_type_mismatch() {
        let message = parse_err("var x: int = 2.5;");
        assert!(message.contains("Variable type does not match expression type"));
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let message = parse_err("var x: int = 1; x = 2.5;");
        assert!(message.contains("Variable type does not match expression type"));
    }

    #[test]
    fn test_undefined_symbol_in_expression() {
        let message = parse_err("var y: int = z;");
        assert!(message.starts_with("Syntax Error <1:"));
        assert!(message.contains("Symbol not found"));
    }

    #[test]
    fn test_undefined_symbol_statement() {
        assert!(parse_err("y = 1;").contains("Symbol not found"));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        assert!(parse_err("var x: int = 1; var x: int = 2;").contains("Symbol already exists"));
    }

    #[test]
    fn test_shadowing_in_function_scope() {
        parse_ok("var x: int = 1; func f() { var x: float = 2.5; return x; }");
    }

    #[test]
    fn test_function_with_inferred_return_type() {
        let nodes = parse_ok("func id(n: int) { return n; }");
        let Node::Function(function) = &nodes[0] else {
            panic!();
        };
        assert_eq!(function.name, "id");
        assert_eq!(function.type_info, TypeInfo::scalar(Scalar::Int));
        assert_eq!(function.params.len(), 1);
        assert_eq!(function.params[0].name, "n");
        assert_eq!(function.params[0].type_info, TypeInfo::scalar(Scalar::Int));
    }

    #[test]
    fn test_function_without_return_keeps_infer() {
        let nodes = parse_ok("func noop() { }");
        let Node::Function(function) = &nodes[0] else {
            panic!();
        };
        assert!(function.type_info.is_infer());
    }

    #[test]
    fn test_return_type_unification_failure() {
        let message = parse_err("func f() { return 1; return 2.5; }");
        assert!(message.contains("Invalid or inconsistent return type"));
    }

    #[test]
    fn test_declared_return_type_enforced() {
        let message = parse_err("func f(): float { return 1; }");
        assert!(message.contains("Invalid or inconsistent return type"));
    }

    #[test]
    fn test_recursion_is_legal() {
        parse_ok("func f(n: int): int { return f(n); }");
    }

    #[test]
    fn test_call_after_definition_sees_resolved_type() {
        parse_ok("func f(n: int) { return n; } func g(): int { return f(1); }");
    }

    #[test]
    fn test_multi_return_type_list() {
        let nodes = parse_ok("func pair(): (int, float) { }");
        let Node::Function(function) = &nodes[0] else {
            panic!();
        };
        assert_eq!(function.type_info.scalar, Scalar::Int);
        let next = function.type_info.next.as_ref().unwrap();
        assert_eq!(next.scalar, Scalar::Float);
    }

    #[test]
    fn test_func_only_at_top_level() {
        let message = parse_err("func outer() { func inner() { } }");
        assert!(message.contains("top level"));
    }

    #[test]
    fn test_if_chain_shape() {
        let nodes =
            parse_ok("func f(x: int): int { if (x) { return 1; } else if (x) { return 2; } else { return 3; } }");
        let Node::Function(function) = &nodes[0] else {
            panic!();
        };
        let Node::If(branches) = &function.body.statements[0] else {
            panic!("expected if chain");
        };
        assert_eq!(branches.len(), 3);
        assert!(branches[0].condition.is_some());
        assert!(branches[1].condition.is_some());
        assert!(branches[2].condition.is_none());
    }

    #[test]
    fn test_if_outside_function_rejected() {
        assert!(parse_err("if (1) { }").contains("inside a function"));
    }

    #[test]
    fn test_while_outside_function_rejected() {
        assert!(parse_err("while (1) { }").contains("inside a function"));
    }

    #[test]
    fn test_break_outside_loop_rejected() {
        let message = parse_err("func f() { break; }");
        assert!(message.contains("outside of a loop"));
    }

    #[test]
    fn test_continue_outside_loop_rejected() {
        let message = parse_err("func f() { continue; }");
        assert!(message.contains("outside of a loop"));
    }

    #[test]
    fn test_break_inside_nested_if_in_loop() {
        parse_ok("func f() { var i: int = 0; while (i) { if (i) { break; } i = i; } }");
    }

    #[test]
    fn test_call_statement() {
        let nodes = parse_ok("func f() { print_int(42); }");
        let Node::Function(function) = &nodes[0] else {
            panic!();
        };
        let Node::Call(call) = &function.body.statements[0] else {
            panic!("expected call statement");
        };
        assert_eq!(call.name, "print_int");
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn test_call_expression_takes_callee_type() {
        let nodes = parse_ok("func f(): int { return print_int(1); }");
        let Node::Function(function) = &nodes[0] else {
            panic!();
        };
        assert_eq!(function.type_info, TypeInfo::scalar(Scalar::Int));
    }

    #[test]
    fn test_type_name_in_expression_rejected() {
        assert!(parse_err("var x: int = int;").contains("Invalid symbol found"));
    }

    #[test]
    fn test_string_literal_is_unexpected() {
        assert!(parse_err("var s = \"text\";").contains("Unexpected token"));
    }

    #[test]
    fn test_nomatch_byte_is_unexpected() {
        assert!(parse_err("var x: int = 1 @ 2;").contains("Unexpected token"));
    }

    #[test]
    fn test_error_position_is_reported() {
        let error = parse("var x: int = 1;\nx = 2.5;").unwrap_err();
        let Error::Syntax(syntax) = error else {
            panic!();
        };
        assert_eq!(syntax.line, 2);
    }

    #[test]
    fn test_trivia_is_skipped() {
        parse_ok("# leading comment\nvar x: int = 1; # trailing\n");
    }

    #[test]
    fn test_comparison_yields_int() {
        let nodes = parse_ok("var x = 1.5 < 2.5;");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        assert_eq!(variable.type_info, TypeInfo::scalar(Scalar::Int));
    }

    #[test]
    fn test_binary_operand_mismatch() {
        assert!(parse_err("var x = 1 + 2.5;").contains("Operand types do not match"));
    }

    #[test]
    fn test_unary_preserves_type() {
        let nodes = parse_ok("var x = -2.5;");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        assert_eq!(variable.type_info, TypeInfo::scalar(Scalar::Float));
    }

    #[test]
    fn test_postfix_increment() {
        let nodes = parse_ok("var x: int = 1; var y = x++;");
        let Node::Variable(variable) = &nodes[1] else {
            panic!();
        };
        assert_eq!(variable.type_info, TypeInfo::scalar(Scalar::Int));
    }

    #[test]
    fn test_precedence_mul_binds_tighter_than_add() {
        let nodes = parse_ok("var x: int = 1 + 2 * 3;");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        let expr = &variable.assignment.as_ref().unwrap().expression;
        assert_eq!(expr.token.kind, TokenKind::Add);
        assert_eq!(expr.right.as_ref().unwrap().token.kind, TokenKind::Mul);
    }

    #[test]
    fn test_left_associativity() {
        let nodes = parse_ok("var x: int = 1 - 2 - 3;");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        let expr = &variable.assignment.as_ref().unwrap().expression;
        assert_eq!(expr.token.kind, TokenKind::Sub);
        // Left child is the inner subtraction: (1 - 2) - 3.
        assert_eq!(expr.left.as_ref().unwrap().token.kind, TokenKind::Sub);
        assert_eq!(expr.right.as_ref().unwrap().leaf, Some(Leaf::Integer(3)));
    }

    #[test]
    fn test_parenthesized_expression() {
        let nodes = parse_ok("var x: int = (1 + 2) * 3;");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        let expr = &variable.assignment.as_ref().unwrap().expression;
        assert_eq!(expr.token.kind, TokenKind::Mul);
        assert_eq!(expr.left.as_ref().unwrap().token.kind, TokenKind::Add);
    }

    #[test]
    fn test_array_literal_type() {
        let nodes = parse_ok("var xs = {1, 2, 3};");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        assert_eq!(variable.type_info, TypeInfo::array(Scalar::Int, vec![3]));
    }

    #[test]
    fn test_empty_array_literal_rejected_for_inference() {
        assert!(parse_err("var xs = {};").contains("Can not infer"));
    }

    #[test]
    fn test_bitclear_operator_parses() {
        let nodes = parse_ok("var x: int = 6 &^ 2;");
        let Node::Variable(variable) = &nodes[0] else {
            panic!();
        };
        let expr = &variable.assignment.as_ref().unwrap().expression;
        assert_eq!(expr.token.kind, TokenKind::AndNot);
    }

    #[test]
    fn test_stray_token_at_top_level() {
        assert!(parse_err("}").contains("Unexpected token"));
    }
}
