//! Statement productions.
//!
//! Each `parse_*` returns `Ok(None)` when its production does not match
//! the lookahead, letting the statement dispatcher try the next rule.

use ternc_lex::TokenKind;
use ternc_util::{RibKind, SymbolKind};

use crate::ast::{Assignment, Block, Call, Function, IfBranch, Node, Return, Variable, While};
use crate::types::TypeInfo;
use crate::{Error, FnContext, Parser, BREAK, CONTINUE, ELSE, FUNCTION, IF, RETURN, VAR, WHILE};

impl<'a> Parser<'a> {
    /// `var name (: type)? (= expression)? ;`
    pub(crate) fn parse_variable(&mut self) -> Result<Option<Variable>, Error> {
        if self.accept_keyword(VAR)?.is_none() {
            return Ok(None);
        }
        let variable = match self.parse_param(SymbolKind::Variable)? {
            Some(variable) => variable,
            None => return Err(self.error("Variable not initialized")),
        };
        self.expect(&[TokenKind::Semicolon])?;
        Ok(Some(variable))
    }

    /// `name (: type)? (= expression)?` — shared by `var` declarations and
    /// function parameters. Inserts the symbol into the current scope.
    pub(crate) fn parse_param(&mut self, kind: SymbolKind) -> Result<Option<Variable>, Error> {
        let name_token = match self.accept(&[TokenKind::Name])? {
            Some(token) => token,
            None => return Ok(None),
        };

        let mut type_info = if self.accept(&[TokenKind::Colon])?.is_some() {
            match self.parse_type_info()? {
                Some(type_info) => type_info,
                None => return Err(self.error("Type info is missing")),
            }
        } else {
            TypeInfo::infer()
        };

        let expression = if self.accept(&[TokenKind::Assign])?.is_some() {
            Some(self.parse_expression()?)
        } else {
            if type_info.is_infer() {
                return Err(self.error_at(&name_token, "Variable needs assignment"));
            }
            None
        };

        let assignment = match expression {
            Some(expression) => {
                if type_info.is_infer() {
                    if expression.type_info.is_infer() {
                        return Err(self.error_at(&name_token, "Can not infer the variable type"));
                    }
                    type_info = expression.type_info.clone();
                } else if type_info != expression.type_info {
                    return Err(self.error_at(
                        &name_token,
                        "Variable type does not match expression type",
                    ));
                }
                Some(Assignment {
                    name: name_token.text.clone(),
                    type_info: type_info.clone(),
                    expression,
                })
            }
            None => None,
        };

        if !self.scopes.insert(&name_token.text, kind, type_info.clone()) {
            return Err(self.error_at(&name_token, "Symbol already exists"));
        }

        Ok(Some(Variable {
            name: name_token.text,
            type_info,
            assignment,
        }))
    }

    /// Comma-separated parameter list, possibly empty.
    fn parse_params(&mut self) -> Result<Vec<Variable>, Error> {
        let mut params = Vec::new();
        if let Some(first) = self.parse_param(SymbolKind::Arg)? {
            params.push(first);
            while self.accept(&[TokenKind::Comma])?.is_some() {
                match self.parse_param(SymbolKind::Arg)? {
                    Some(param) => params.push(param),
                    None => return Err(self.error("Parameter is missing")),
                }
            }
        }
        Ok(params)
    }

    /// A single type annotation.
    pub(crate) fn parse_type_info(&mut self) -> Result<Option<TypeInfo>, Error> {
        self.accept_type()
    }

    /// A return-type annotation: one type, or a parenthesized list chained
    /// through `TypeInfo::next` for multi-return functions.
    pub(crate) fn parse_type_infos(&mut self) -> Result<Option<TypeInfo>, Error> {
        if self.accept(&[TokenKind::LParen])?.is_none() {
            return self.parse_type_info();
        }

        let mut infos = Vec::new();
        match self.parse_type_info()? {
            Some(info) => infos.push(info),
            None => return Err(self.error("Type info is missing")),
        }
        while self.accept(&[TokenKind::Comma])?.is_some() {
            match self.parse_type_info()? {
                Some(info) => infos.push(info),
                None => return Err(self.error("Type info is missing")),
            }
        }
        self.expect(&[TokenKind::RParen])?;

        let mut chain: Option<Box<TypeInfo>> = None;
        for info in infos.into_iter().rev() {
            chain = Some(Box::new(TypeInfo {
                scalar: info.scalar,
                dims: info.dims,
                next: chain,
            }));
        }
        Ok(chain.map(|boxed| *boxed))
    }

    /// `func name ( params ) (: ret)? { body }`
    ///
    /// The function symbol is inserted into the parent scope as soon as
    /// the header is parsed, so the body may call itself. Once the body
    /// resolves an inferred return type, the symbol payload is refreshed.
    pub(crate) fn parse_function(&mut self) -> Result<Option<Function>, Error> {
        let def_token = match self.accept_keyword(FUNCTION)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if !self.scopes.at_root() {
            return Err(self.error_at(&def_token, "Functions can only be declared at top level"));
        }

        let name_token = self.expect(&[TokenKind::Name])?;
        self.expect(&[TokenKind::LParen])?;

        self.scopes.push(RibKind::Function, FnContext::default());
        let result = self.parse_function_rest(&name_token.text);
        self.scopes.pop();
        let (type_info, params, body) = result?;

        // Later call sites must see the resolved return type.
        if let Some(symbol) = self.scopes.resolve_mut(&name_token.text) {
            symbol.payload = type_info.clone();
        }

        Ok(Some(Function {
            name: name_token.text,
            type_info,
            params,
            body,
        }))
    }

    /// Parses everything after `func name (`, inside the function rib.
    fn parse_function_rest(
        &mut self,
        name: &str,
    ) -> Result<(TypeInfo, Vec<Variable>, Block), Error> {
        let params = self.parse_params()?;
        self.expect(&[TokenKind::RParen])?;

        let declared = if self.accept(&[TokenKind::Colon])?.is_some() {
            match self.parse_type_infos()? {
                Some(type_info) => type_info,
                None => return Err(self.error("Type info is missing")),
            }
        } else {
            TypeInfo::infer()
        };
        self.scopes.current_info_mut().ret = Some(declared.clone());

        if !self
            .scopes
            .insert_in_parent(name, SymbolKind::Function, declared)
        {
            return Err(self.error("Symbol already exists"));
        }

        self.expect(&[TokenKind::LBrace])?;
        let statements = self.parse_statements()?;
        self.expect(&[TokenKind::RBrace])?;

        let type_info = self
            .scopes
            .current_info_mut()
            .ret
            .take()
            .expect("function rib carries a return chain");
        Ok((type_info, params, Block { statements }))
    }

    /// A brace-delimited block in a fresh rib of the given kind.
    fn parse_block(&mut self, kind: RibKind) -> Result<Block, Error> {
        self.expect(&[TokenKind::LBrace])?;
        self.scopes.push(kind, FnContext::default());
        let statements = self.parse_statements();
        self.scopes.pop();
        let statements = statements?;
        self.expect(&[TokenKind::RBrace])?;
        Ok(Block { statements })
    }

    /// One `if (cond) { body }` link of a chain.
    fn parse_single_if(&mut self) -> Result<Option<IfBranch>, Error> {
        let if_token = match self.accept_keyword(IF)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if !self.in_function() {
            return Err(self.error_at(&if_token, "'if' is only allowed inside a function"));
        }

        self.expect(&[TokenKind::LParen])?;
        let condition = self.parse_expression()?;
        self.expect(&[TokenKind::RParen])?;
        let body = self.parse_block(RibKind::If)?;

        Ok(Some(IfBranch {
            condition: Some(condition),
            body,
        }))
    }

    /// `if` / `else if` / `else` chain; the trailing `else` becomes a
    /// branch without a condition.
    pub(crate) fn parse_if(&mut self) -> Result<Option<Vec<IfBranch>>, Error> {
        let first = match self.parse_single_if()? {
            Some(branch) => branch,
            None => return Ok(None),
        };
        let mut branches = vec![first];

        while self.accept_keyword(ELSE)?.is_some() {
            match self.parse_single_if()? {
                Some(branch) => branches.push(branch),
                None => {
                    let body = self.parse_block(RibKind::If)?;
                    branches.push(IfBranch {
                        condition: None,
                        body,
                    });
                    break;
                }
            }
        }

        Ok(Some(branches))
    }

    /// `while (cond) { body }` in a fresh `While` rib.
    pub(crate) fn parse_while(&mut self) -> Result<Option<While>, Error> {
        let while_token = match self.accept_keyword(WHILE)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if !self.in_function() {
            return Err(self.error_at(&while_token, "'while' is only allowed inside a function"));
        }

        self.expect(&[TokenKind::LParen])?;
        let condition = self.parse_expression()?;
        self.expect(&[TokenKind::RParen])?;
        let body = self.parse_block(RibKind::While)?;

        Ok(Some(While { condition, body }))
    }

    /// `break ;`
    pub(crate) fn parse_break(&mut self) -> Result<Option<Node>, Error> {
        let break_token = match self.accept_keyword(BREAK)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if !self.in_loop() {
            return Err(self.error_at(&break_token, "'break' outside of a loop"));
        }
        self.expect(&[TokenKind::Semicolon])?;
        Ok(Some(Node::Break))
    }

    /// `continue ;`
    pub(crate) fn parse_continue(&mut self) -> Result<Option<Node>, Error> {
        let continue_token = match self.accept_keyword(CONTINUE)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if !self.in_loop() {
            return Err(self.error_at(&continue_token, "'continue' outside of a loop"));
        }
        self.expect(&[TokenKind::Semicolon])?;
        Ok(Some(Node::Continue))
    }

    /// `return expression? ;` — unifies with the enclosing function's
    /// return chain, resolving `Infer` on first use.
    pub(crate) fn parse_return(&mut self) -> Result<Option<Return>, Error> {
        let return_token = match self.accept_keyword(RETURN)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if !self.in_function() {
            return Err(self.error_at(&return_token, "'return' outside of a function"));
        }

        let expression = if self.current_kind() == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let declared = self
            .scopes
            .enclosing_info(RibKind::Function)
            .and_then(|ctx| ctx.ret.clone())
            .expect("function rib carries a return chain");

        let resolved = match &expression {
            Some(expression) => {
                if declared.is_infer() {
                    if expression.type_info.is_infer() {
                        return Err(self.error_at(&return_token, "Can not infer the return type"));
                    }
                    expression.type_info.clone()
                } else if declared != expression.type_info {
                    return Err(
                        self.error_at(&return_token, "Invalid or inconsistent return type")
                    );
                } else {
                    declared
                }
            }
            None => {
                if !declared.is_infer() {
                    return Err(
                        self.error_at(&return_token, "Invalid or inconsistent return type")
                    );
                }
                declared
            }
        };

        if let Some(ctx) = self.scopes.enclosing_info_mut(RibKind::Function) {
            ctx.ret = Some(resolved);
        }

        self.expect(&[TokenKind::Semicolon])?;
        Ok(Some(Return { expression }))
    }

    /// A statement opening with a bare name: an assignment when the symbol
    /// is a variable or argument, a call statement when it is a function.
    pub(crate) fn parse_name_statement(&mut self) -> Result<Option<Node>, Error> {
        if self.current_kind() != TokenKind::Name {
            return Ok(None);
        }
        // Keywords never reach this production; the dispatcher runs first.
        let name_token = self.expect(&[TokenKind::Name])?;

        let (kind, type_info) = match self.scopes.resolve(&name_token.text) {
            Some(symbol) => (symbol.kind, symbol.payload.clone()),
            None => return Err(self.error_at(&name_token, "Symbol not found")),
        };

        match kind {
            SymbolKind::Variable | SymbolKind::Arg => {
                if self.accept(&[TokenKind::Assign])?.is_none() {
                    return Err(self.error("Variable assignment missing"));
                }
                let expression = self.parse_expression()?;
                if type_info != expression.type_info {
                    return Err(self.error_at(
                        &name_token,
                        "Variable type does not match expression type",
                    ));
                }
                self.expect(&[TokenKind::Semicolon])?;
                Ok(Some(Node::Assignment(Assignment {
                    name: name_token.text,
                    type_info,
                    expression,
                })))
            }
            SymbolKind::Function => {
                let call = match self.parse_call(&name_token.text, type_info)? {
                    Some(call) => call,
                    None => return Err(self.error("Function call missing")),
                };
                self.expect(&[TokenKind::Semicolon])?;
                Ok(Some(Node::Call(call)))
            }
            SymbolKind::Type => Err(self.error_at(&name_token, "Invalid symbol")),
        }
    }

    /// `( args )` after a function name; `None` when no paren follows.
    pub(crate) fn parse_call(
        &mut self,
        name: &str,
        type_info: TypeInfo,
    ) -> Result<Option<Call>, Error> {
        if self.accept(&[TokenKind::LParen])?.is_none() {
            return Ok(None);
        }

        let mut args = Vec::new();
        if self.current_kind() != TokenKind::RParen {
            args.push(self.parse_expression()?);
            while self.accept(&[TokenKind::Comma])?.is_some() {
                args.push(self.parse_expression()?);
            }
        }
        self.expect(&[TokenKind::RParen])?;

        Ok(Some(Call {
            name: name.to_string(),
            type_info,
            args,
        }))
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current.kind
    }
}
