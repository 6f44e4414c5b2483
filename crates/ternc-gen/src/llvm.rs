//! LLVM IR lowerer.
//!
//! Walks the typed AST and emits IR into a shared context/module/builder.
//! The lowerer keeps its own scope tree mirroring the parser's: `Function`
//! ribs carry the LLVM function, `While` ribs carry the loop's break and
//! continue targets, and symbols resolve to the alloca or global backing
//! a name.
//!
//! A `break` or `continue` records a pending interrupt target on the
//! current rib. The block walker observes it, stops lowering the
//! remaining statements of that block, and consumes it at block end by
//! branching to the target instead of falling through. Consuming the
//! interrupt with its own block keeps a `break` nested in an `if` from
//! killing the rest of the enclosing loop body.

use std::path::Path;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use inkwell::types::{BasicMetadataTypeEnum, BasicTypeEnum};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValueEnum, FloatValue, FunctionValue, GlobalValue, IntValue,
    PointerValue,
};
use inkwell::{FloatPredicate, IntPredicate, OptimizationLevel};

use ternc_lex::TokenKind;
use ternc_par::{Assignment, Block, Call, Expression, Function, IfBranch, Leaf, Node, Return, Variable, While};
use ternc_util::{RibKind, ScopeTree, SymbolKind};

use crate::error::{CodeGenError, Result};
use crate::types::TypeMapper;

fn llvm_failed(what: &str, error: impl std::fmt::Display) -> CodeGenError {
    CodeGenError::LlvmOperationFailed(format!("Failed {}: {}", what, error))
}

/// Per-rib lowering payload.
///
/// `function` is set on `Function` ribs; `break_block`/`continue_block`
/// on `While` ribs; `interrupt_block` records a pending `break`/
/// `continue` branch target on the rib it was lowered in, until that
/// rib's block consumes it.
#[derive(Clone, Copy, Default)]
struct BlockInfo<'ctx> {
    function: Option<FunctionValue<'ctx>>,
    break_block: Option<BasicBlock<'ctx>>,
    continue_block: Option<BasicBlock<'ctx>>,
    interrupt_block: Option<BasicBlock<'ctx>>,
}

/// Where a named value lives.
#[derive(Clone, Copy)]
enum VarSlot<'ctx> {
    Local {
        ty: BasicTypeEnum<'ctx>,
        ptr: PointerValue<'ctx>,
    },
    Global {
        ty: BasicTypeEnum<'ctx>,
        global: GlobalValue<'ctx>,
    },
}

/// Tree walker emitting LLVM IR for one AST.
pub struct Lowerer<'ctx> {
    context: &'ctx Context,
    pub module: Module<'ctx>,
    builder: Builder<'ctx>,
    type_mapper: TypeMapper<'ctx>,
    scopes: ScopeTree<BlockInfo<'ctx>, VarSlot<'ctx>>,
}

impl<'ctx> Lowerer<'ctx> {
    /// Creates a lowerer with built-in external functions pre-registered.
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();

        // print_int : (i32) -> i32
        let i32_type = context.i32_type();
        let print_int_type = i32_type.fn_type(&[i32_type.into()], false);
        module.add_function("print_int", print_int_type, Some(Linkage::External));

        Self {
            context,
            module,
            builder,
            type_mapper: TypeMapper::new(context),
            scopes: ScopeTree::new(BlockInfo::default()),
        }
    }

    /// Lowers the top-level statement list into the module.
    pub fn lower(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.visit_statement(node)?;
        }
        Ok(())
    }

    // =========================================================================
    // Statement visitors
    // =========================================================================

    fn visit_statement(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Variable(variable) => self.visit_variable(variable),
            Node::Assignment(assignment) => self.visit_assignment(assignment),
            Node::Call(call) => self.visit_call(call).map(|_| ()),
            Node::Function(function) => self.visit_function(function),
            Node::If(branches) => self.visit_if(branches),
            Node::While(while_) => self.visit_while(while_),
            Node::Return(return_) => self.visit_return(return_),
            Node::Break => self.visit_break(),
            Node::Continue => self.visit_continue(),
        }
    }

    /// Inside a function, variables become entry-block allocas; at top
    /// level they become zero-initialized globals with external linkage.
    fn visit_variable(&mut self, variable: &Variable) -> Result<()> {
        let ty = self.type_mapper.map(&variable.type_info)?;

        let slot = match self.enclosing_function() {
            Some(function) => {
                let ptr = self.build_entry_alloca(function, ty, &variable.name)?;
                VarSlot::Local { ty, ptr }
            }
            None => {
                let global = self.module.add_global(ty, None, &variable.name);
                global.set_linkage(Linkage::External);
                global.set_initializer(&self.const_zero(ty)?);
                VarSlot::Global { ty, global }
            }
        };

        if !self
            .scopes
            .insert(&variable.name, SymbolKind::Variable, slot)
        {
            return Err(CodeGenError::SymbolAlreadyDefined(variable.name.clone()));
        }

        if let Some(assignment) = &variable.assignment {
            self.visit_assignment(assignment)?;
        }
        Ok(())
    }

    /// Stores into locals; rewrites the initializer of globals, which
    /// therefore only accept constant expressions.
    fn visit_assignment(&mut self, assignment: &Assignment) -> Result<()> {
        let slot = self.resolve_slot(&assignment.name)?;
        let value = self.lower_expression(&assignment.expression)?;

        match slot {
            VarSlot::Global { global, .. } => {
                if !is_constant(value) {
                    return Err(CodeGenError::NonConstantGlobalInit(assignment.name.clone()));
                }
                global.set_initializer(&value);
                Ok(())
            }
            VarSlot::Local { ptr, .. } => {
                self.builder
                    .build_store(ptr, value)
                    .map_err(|e| llvm_failed("store", e))?;
                Ok(())
            }
        }
    }

    fn visit_function(&mut self, function: &Function) -> Result<()> {
        let ret_ty = self.type_mapper.map_return(&function.type_info)?;
        let mut param_tys: Vec<BasicMetadataTypeEnum<'ctx>> =
            Vec::with_capacity(function.params.len());
        for param in &function.params {
            param_tys.push(self.type_mapper.map(&param.type_info)?.into());
        }

        let fn_type = match ret_ty {
            BasicTypeEnum::IntType(ty) => ty.fn_type(&param_tys, false),
            BasicTypeEnum::FloatType(ty) => ty.fn_type(&param_tys, false),
            _ => {
                return Err(CodeGenError::UnsupportedType(
                    "function return type".to_string(),
                ))
            }
        };
        let llvm_function = self.module.add_function(&function.name, fn_type, None);

        let entry = self.context.append_basic_block(llvm_function, "entry");
        self.builder.position_at_end(entry);

        self.scopes.push(
            RibKind::Function,
            BlockInfo {
                function: Some(llvm_function),
                ..Default::default()
            },
        );
        let result = self.visit_function_body(function, llvm_function, ret_ty);
        self.scopes.pop();
        result
    }

    /// Lowers parameters and the body inside the function's rib, then
    /// supplies the zero default return when the body falls off the end.
    fn visit_function_body(
        &mut self,
        function: &Function,
        llvm_function: FunctionValue<'ctx>,
        ret_ty: BasicTypeEnum<'ctx>,
    ) -> Result<()> {
        for (index, param) in function.params.iter().enumerate() {
            let ty = self.type_mapper.map(&param.type_info)?;
            let ptr = self.build_entry_alloca(llvm_function, ty, &param.name)?;
            let value = llvm_function.get_nth_param(index as u32).ok_or_else(|| {
                CodeGenError::Internal(format!(
                    "parameter {} missing on function '{}'",
                    index, function.name
                ))
            })?;
            self.builder
                .build_store(ptr, value)
                .map_err(|e| llvm_failed("store", e))?;
            if !self
                .scopes
                .insert(&param.name, SymbolKind::Arg, VarSlot::Local { ty, ptr })
            {
                return Err(CodeGenError::SymbolAlreadyDefined(param.name.clone()));
            }
        }

        self.visit_block(&function.body)?;

        if self.needs_terminator() {
            self.build_default_return(ret_ty)?;
        }
        Ok(())
    }

    /// Lowers a statement block, honoring a pending interrupt: once a
    /// `break`/`continue` has been lowered, the remaining statements of
    /// the same syntactic block are dead and the block ends with a branch
    /// to the interrupt target instead of the natural fall-through. The
    /// interrupt is consumed here, at block end, so it never leaks into
    /// an enclosing block.
    fn visit_block(&mut self, block: &Block) -> Result<()> {
        for node in &block.statements {
            if self.pending_interrupt().is_some() {
                break;
            }
            if !self.needs_terminator() {
                // The block already ended (a return); the rest is dead.
                break;
            }
            self.visit_statement(node)?;
        }

        if let Some(target) = self.scopes.current_info_mut().interrupt_block.take() {
            if self.needs_terminator() {
                self.builder
                    .build_unconditional_branch(target)
                    .map_err(|e| llvm_failed("branch", e))?;
            }
        }
        Ok(())
    }

    fn visit_return(&mut self, return_: &Return) -> Result<()> {
        match &return_.expression {
            Some(expression) => {
                let value = self.lower_expression(expression)?;
                self.builder
                    .build_return(Some(&value))
                    .map_err(|e| llvm_failed("return", e))?;
            }
            None => {
                let function = self.enclosing_function().ok_or_else(|| {
                    CodeGenError::Internal("return outside of a function".to_string())
                })?;
                let ret_ty = function.get_type().get_return_type().ok_or_else(|| {
                    CodeGenError::Internal("function without return type".to_string())
                })?;
                self.build_default_return(ret_ty)?;
            }
        }
        Ok(())
    }

    /// Wires an `if`/`else if`/`else` chain: one `if_check` and `if_body`
    /// pair per branch, a shared `if_exit`, and bodies that branch to
    /// `if_exit` only when they have not already terminated.
    fn visit_if(&mut self, branches: &[IfBranch]) -> Result<()> {
        let function = self
            .enclosing_function()
            .ok_or_else(|| CodeGenError::Internal("'if' outside of a function".to_string()))?;

        let exit_block = self.context.append_basic_block(function, "if_exit");
        let mut check_block = self.context.append_basic_block(function, "if_check");
        self.builder
            .build_unconditional_branch(check_block)
            .map_err(|e| llvm_failed("branch", e))?;

        for (index, branch) in branches.iter().enumerate() {
            let body_block = self.context.append_basic_block(function, "if_body");
            let next_block = if index + 1 < branches.len() {
                self.context.append_basic_block(function, "if_check")
            } else {
                exit_block
            };

            self.builder.position_at_end(check_block);
            match &branch.condition {
                Some(condition) => {
                    let cond = self.lower_condition(condition)?;
                    self.builder
                        .build_conditional_branch(cond, body_block, next_block)
                        .map_err(|e| llvm_failed("conditional branch", e))?;
                }
                None => {
                    // Trailing else.
                    self.builder
                        .build_unconditional_branch(body_block)
                        .map_err(|e| llvm_failed("branch", e))?;
                }
            }

            self.builder.position_at_end(body_block);
            self.scopes.push(RibKind::If, BlockInfo::default());
            let body_result = self.visit_block(&branch.body);
            self.scopes.pop();
            body_result?;

            if self.needs_terminator() {
                self.builder
                    .build_unconditional_branch(exit_block)
                    .map_err(|e| llvm_failed("branch", e))?;
            }

            check_block = next_block;
        }

        self.builder.position_at_end(exit_block);
        Ok(())
    }

    /// Wires `while_check` / `while_body` / `while_exit`; the body's rib
    /// carries the break and continue targets.
    fn visit_while(&mut self, while_: &While) -> Result<()> {
        let function = self
            .enclosing_function()
            .ok_or_else(|| CodeGenError::Internal("'while' outside of a function".to_string()))?;

        let check_block = self.context.append_basic_block(function, "while_check");
        let body_block = self.context.append_basic_block(function, "while_body");
        let exit_block = self.context.append_basic_block(function, "while_exit");

        self.builder
            .build_unconditional_branch(check_block)
            .map_err(|e| llvm_failed("branch", e))?;

        self.builder.position_at_end(check_block);
        let cond = self.lower_condition(&while_.condition)?;
        self.builder
            .build_conditional_branch(cond, body_block, exit_block)
            .map_err(|e| llvm_failed("conditional branch", e))?;

        self.builder.position_at_end(body_block);
        self.scopes.push(
            RibKind::While,
            BlockInfo {
                break_block: Some(exit_block),
                continue_block: Some(check_block),
                ..Default::default()
            },
        );
        let body_result = self.visit_block(&while_.body);
        self.scopes.pop();
        body_result?;

        if self.needs_terminator() {
            self.builder
                .build_unconditional_branch(check_block)
                .map_err(|e| llvm_failed("branch", e))?;
        }

        self.builder.position_at_end(exit_block);
        Ok(())
    }

    /// Records the nearest loop's exit block as the current rib's pending
    /// interrupt.
    fn visit_break(&mut self) -> Result<()> {
        let target = self
            .scopes
            .enclosing_info(RibKind::While)
            .and_then(|info| info.break_block)
            .ok_or_else(|| CodeGenError::Internal("'break' outside of a loop".to_string()))?;
        self.scopes.current_info_mut().interrupt_block = Some(target);
        Ok(())
    }

    /// Records the nearest loop's check block as the current rib's
    /// pending interrupt.
    fn visit_continue(&mut self) -> Result<()> {
        let target = self
            .scopes
            .enclosing_info(RibKind::While)
            .and_then(|info| info.continue_block)
            .ok_or_else(|| CodeGenError::Internal("'continue' outside of a loop".to_string()))?;
        self.scopes.current_info_mut().interrupt_block = Some(target);
        Ok(())
    }

    fn visit_call(&mut self, call: &Call) -> Result<BasicValueEnum<'ctx>> {
        let function = self
            .module
            .get_function(&call.name)
            .ok_or_else(|| CodeGenError::FunctionNotFound(call.name.clone()))?;

        let mut args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.lower_expression(arg)?.into());
        }

        let site = self
            .builder
            .build_call(function, &args, &call.name)
            .map_err(|e| llvm_failed("call", e))?;
        site.try_as_basic_value().basic().ok_or_else(|| {
            CodeGenError::LlvmOperationFailed(format!("call to '{}' produced no value", call.name))
        })
    }

    // =========================================================================
    // Expression lowering
    // =========================================================================

    fn lower_expression(&mut self, expression: &Expression) -> Result<BasicValueEnum<'ctx>> {
        match (&expression.left, &expression.right) {
            (Some(left), Some(right)) => {
                let lhs = self.lower_expression(left)?;
                let rhs = self.lower_expression(right)?;
                self.lower_binary(expression.token.kind, lhs, rhs)
            }
            (Some(left), None) => {
                let operand = self.lower_expression(left)?;
                self.lower_unary(expression.token.kind, operand)
            }
            _ => self.lower_leaf(expression),
        }
    }

    fn lower_binary(
        &mut self,
        op: TokenKind,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        match (lhs, rhs) {
            (BasicValueEnum::IntValue(left), BasicValueEnum::IntValue(right)) => {
                self.lower_int_binary(op, left, right)
            }
            (BasicValueEnum::FloatValue(left), BasicValueEnum::FloatValue(right)) => {
                self.lower_float_binary(op, left, right)
            }
            _ => Err(CodeGenError::InvalidOperandType(format!(
                "binary operator {:?} on mixed operand kinds",
                op
            ))),
        }
    }

    fn lower_int_binary(
        &mut self,
        op: TokenKind,
        left: IntValue<'ctx>,
        right: IntValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let b = &self.builder;
        let value = match op {
            TokenKind::Add => b.build_int_add(left, right, "add"),
            TokenKind::Sub => b.build_int_sub(left, right, "sub"),
            TokenKind::Mul => b.build_int_mul(left, right, "mul"),
            TokenKind::Div => b.build_int_signed_div(left, right, "sdiv"),
            TokenKind::Rem => b.build_int_signed_rem(left, right, "srem"),
            TokenKind::Shl => b.build_left_shift(left, right, "shl"),
            TokenKind::Shr => b.build_right_shift(left, right, false, "lshr"),
            TokenKind::And | TokenKind::LogicalAnd => b.build_and(left, right, "and"),
            TokenKind::Or | TokenKind::LogicalOr => b.build_or(left, right, "or"),
            TokenKind::Xor => b.build_xor(left, right, "xor"),
            TokenKind::AndNot => {
                let inverted = b
                    .build_not(right, "not")
                    .map_err(|e| llvm_failed("not", e))?;
                b.build_and(left, inverted, "andnot")
            }
            TokenKind::Eq => return self.int_comparison(IntPredicate::EQ, left, right),
            TokenKind::Ne => return self.int_comparison(IntPredicate::NE, left, right),
            TokenKind::Lt => return self.int_comparison(IntPredicate::SLT, left, right),
            TokenKind::Le => return self.int_comparison(IntPredicate::SLE, left, right),
            TokenKind::Gt => return self.int_comparison(IntPredicate::SGT, left, right),
            TokenKind::Ge => return self.int_comparison(IntPredicate::SGE, left, right),
            _ => {
                return Err(CodeGenError::InvalidOperandType(format!(
                    "operator {:?} is not a binary operator",
                    op
                )))
            }
        };
        value
            .map(Into::into)
            .map_err(|e| llvm_failed("integer binary operator", e))
    }

    fn lower_float_binary(
        &mut self,
        op: TokenKind,
        left: FloatValue<'ctx>,
        right: FloatValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let b = &self.builder;
        let value = match op {
            TokenKind::Add => b.build_float_add(left, right, "fadd"),
            TokenKind::Sub => b.build_float_sub(left, right, "fsub"),
            TokenKind::Mul => b.build_float_mul(left, right, "fmul"),
            TokenKind::Div => b.build_float_div(left, right, "fdiv"),
            TokenKind::Rem => b.build_float_rem(left, right, "frem"),
            TokenKind::Eq => return self.float_comparison(FloatPredicate::OEQ, left, right),
            TokenKind::Ne => return self.float_comparison(FloatPredicate::ONE, left, right),
            TokenKind::Lt => return self.float_comparison(FloatPredicate::OLT, left, right),
            TokenKind::Le => return self.float_comparison(FloatPredicate::OLE, left, right),
            TokenKind::Gt => return self.float_comparison(FloatPredicate::OGT, left, right),
            TokenKind::Ge => return self.float_comparison(FloatPredicate::OGE, left, right),
            _ => {
                return Err(CodeGenError::InvalidOperandType(format!(
                    "operator {:?} on float operands",
                    op
                )))
            }
        };
        value
            .map(Into::into)
            .map_err(|e| llvm_failed("float binary operator", e))
    }

    /// Comparisons produce `i1`; the language's boolean is `int`, so the
    /// result is zero-extended to `i32`.
    fn int_comparison(
        &self,
        predicate: IntPredicate,
        left: IntValue<'ctx>,
        right: IntValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let cmp = self
            .builder
            .build_int_compare(predicate, left, right, "icmp")
            .map_err(|e| llvm_failed("compare", e))?;
        self.bool_to_int(cmp)
    }

    fn float_comparison(
        &self,
        predicate: FloatPredicate,
        left: FloatValue<'ctx>,
        right: FloatValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let cmp = self
            .builder
            .build_float_compare(predicate, left, right, "fcmp")
            .map_err(|e| llvm_failed("compare", e))?;
        self.bool_to_int(cmp)
    }

    fn bool_to_int(&self, flag: IntValue<'ctx>) -> Result<BasicValueEnum<'ctx>> {
        self.builder
            .build_int_z_extend(flag, self.context.i32_type(), "bool")
            .map(Into::into)
            .map_err(|e| llvm_failed("zero extend", e))
    }

    fn lower_unary(
        &mut self,
        op: TokenKind,
        operand: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        match operand {
            BasicValueEnum::IntValue(value) => {
                let one = value.get_type().const_int(1, false);
                match op {
                    TokenKind::Sub => self
                        .builder
                        .build_int_neg(value, "neg")
                        .map(Into::into)
                        .map_err(|e| llvm_failed("neg", e)),
                    TokenKind::Xor => self
                        .builder
                        .build_not(value, "not")
                        .map(Into::into)
                        .map_err(|e| llvm_failed("not", e)),
                    TokenKind::LogicalNot => {
                        let zero = value.get_type().const_zero();
                        let cmp = self
                            .builder
                            .build_int_compare(IntPredicate::EQ, value, zero, "lnot")
                            .map_err(|e| llvm_failed("compare", e))?;
                        self.bool_to_int(cmp)
                    }
                    TokenKind::Inc => self
                        .builder
                        .build_int_add(value, one, "inc")
                        .map(Into::into)
                        .map_err(|e| llvm_failed("add", e)),
                    TokenKind::Dec => self
                        .builder
                        .build_int_sub(value, one, "dec")
                        .map(Into::into)
                        .map_err(|e| llvm_failed("sub", e)),
                    _ => Err(CodeGenError::InvalidOperandType(format!(
                        "operator {:?} is not a unary operator",
                        op
                    ))),
                }
            }
            BasicValueEnum::FloatValue(value) => {
                let one = value.get_type().const_float(1.0);
                match op {
                    TokenKind::Sub => self
                        .builder
                        .build_float_neg(value, "fneg")
                        .map(Into::into)
                        .map_err(|e| llvm_failed("fneg", e)),
                    TokenKind::LogicalNot => {
                        let zero = value.get_type().const_zero();
                        let cmp = self
                            .builder
                            .build_float_compare(FloatPredicate::OEQ, value, zero, "lnot")
                            .map_err(|e| llvm_failed("compare", e))?;
                        self.bool_to_int(cmp)
                    }
                    TokenKind::Inc => self
                        .builder
                        .build_float_add(value, one, "finc")
                        .map(Into::into)
                        .map_err(|e| llvm_failed("fadd", e)),
                    TokenKind::Dec => self
                        .builder
                        .build_float_sub(value, one, "fdec")
                        .map(Into::into)
                        .map_err(|e| llvm_failed("fsub", e)),
                    _ => Err(CodeGenError::InvalidOperandType(format!(
                        "operator {:?} on a float operand",
                        op
                    ))),
                }
            }
            _ => Err(CodeGenError::InvalidOperandType(
                "unary operator on a non-scalar operand".to_string(),
            )),
        }
    }

    fn lower_leaf(&mut self, expression: &Expression) -> Result<BasicValueEnum<'ctx>> {
        let leaf = expression.leaf.as_ref().ok_or_else(|| {
            CodeGenError::Internal("expression without children or leaf".to_string())
        })?;

        match leaf {
            Leaf::Integer(value) => Ok(self
                .context
                .i32_type()
                .const_int(*value as u64, false)
                .into()),
            Leaf::Float(value) => Ok(self.context.f32_type().const_float(*value).into()),
            Leaf::Name(name) => {
                let ptr = match self.resolve_slot(name)? {
                    VarSlot::Local { ptr, .. } => ptr,
                    VarSlot::Global { global, .. } => global.as_pointer_value(),
                };
                self.builder
                    .build_load(ptr, name)
                    .map_err(|e| llvm_failed("load", e))
            }
            Leaf::Call(call) => self.visit_call(call),
            Leaf::Array(_) => Err(CodeGenError::UnsupportedType(
                "array literal value".to_string(),
            )),
        }
    }

    /// Materializes an `i1` condition from a lowered value, comparing
    /// against zero.
    fn lower_condition(&mut self, expression: &Expression) -> Result<IntValue<'ctx>> {
        let value = self.lower_expression(expression)?;
        match value {
            BasicValueEnum::IntValue(value) => {
                if value.get_type().get_bit_width() == 1 {
                    return Ok(value);
                }
                let zero = value.get_type().const_zero();
                self.builder
                    .build_int_compare(IntPredicate::NE, value, zero, "cond")
                    .map_err(|e| llvm_failed("compare", e))
            }
            BasicValueEnum::FloatValue(value) => {
                let zero = value.get_type().const_zero();
                self.builder
                    .build_float_compare(FloatPredicate::ONE, value, zero, "cond")
                    .map_err(|e| llvm_failed("compare", e))
            }
            _ => Err(CodeGenError::InvalidOperandType(
                "condition is not a scalar".to_string(),
            )),
        }
    }

    // =========================================================================
    // Support
    // =========================================================================

    /// LLVM function of the nearest enclosing `Function` rib.
    fn enclosing_function(&self) -> Option<FunctionValue<'ctx>> {
        self.scopes
            .enclosing_info(RibKind::Function)
            .and_then(|info| info.function)
    }

    /// Pending `break`/`continue` target recorded on the current rib.
    fn pending_interrupt(&self) -> Option<BasicBlock<'ctx>> {
        self.scopes.current_info().interrupt_block
    }

    fn resolve_slot(&self, name: &str) -> Result<VarSlot<'ctx>> {
        self.scopes
            .resolve(name)
            .map(|symbol| symbol.payload)
            .ok_or_else(|| CodeGenError::SymbolNotFound(name.to_string()))
    }

    /// True when the builder sits in a block without a terminator.
    fn needs_terminator(&self) -> bool {
        self.builder
            .get_insert_block()
            .map(|block| block.get_terminator().is_none())
            .unwrap_or(false)
    }

    /// Allocates in the function's entry block, restoring the builder to
    /// its current position afterwards.
    fn build_entry_alloca(
        &self,
        function: FunctionValue<'ctx>,
        ty: BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let entry = function.get_first_basic_block().ok_or_else(|| {
            CodeGenError::Internal(format!("function '{:?}' has no entry block", function.get_name()))
        })?;
        let current = self.builder.get_insert_block();

        match entry.get_first_instruction() {
            Some(first) => self.builder.position_before(&first),
            None => self.builder.position_at_end(entry),
        }
        let ptr = self
            .builder
            .build_alloca(ty, name)
            .map_err(|e| llvm_failed("alloca", e))?;

        if let Some(block) = current {
            self.builder.position_at_end(block);
        }
        Ok(ptr)
    }

    /// Zero value of a lowered type.
    fn const_zero(&self, ty: BasicTypeEnum<'ctx>) -> Result<BasicValueEnum<'ctx>> {
        match ty {
            BasicTypeEnum::IntType(ty) => Ok(ty.const_zero().into()),
            BasicTypeEnum::FloatType(ty) => Ok(ty.const_zero().into()),
            _ => Err(CodeGenError::UnsupportedType(
                "zero initializer".to_string(),
            )),
        }
    }

    /// `ret` of the zero value of the given type.
    fn build_default_return(&self, ret_ty: BasicTypeEnum<'ctx>) -> Result<()> {
        let zero = self.const_zero(ret_ty)?;
        self.builder
            .build_return(Some(&zero))
            .map(|_| ())
            .map_err(|e| llvm_failed("return", e))
    }

    // =========================================================================
    // Validation & emission
    // =========================================================================

    /// Runs the LLVM module verifier.
    pub fn verify(&self) -> Result<()> {
        self.module
            .verify()
            .map_err(|message| CodeGenError::VerifyFailed(message.to_string()))
    }

    /// Returns the module's textual IR.
    pub fn emit_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Emits a native object file for the default target triple.
    pub fn write_object_file(&self, path: &Path) -> Result<()> {
        Target::initialize_all(&InitializationConfig::default());

        let triple = TargetMachine::get_default_triple();
        let target =
            Target::from_triple(&triple).map_err(|e| CodeGenError::ObjectEmission(e.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or(CodeGenError::TargetMachine)?;

        target_machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| CodeGenError::ObjectEmission(e.to_string()))
    }
}

/// Globals accept only LLVM constants as initializers.
fn is_constant(value: BasicValueEnum<'_>) -> bool {
    match value {
        BasicValueEnum::IntValue(value) => value.is_const(),
        BasicValueEnum::FloatValue(value) => value.is_const(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses, lowers, and verifies a source snippet, returning its IR.
    fn lower_source(source: &str) -> String {
        let nodes = ternc_par::parse(source).expect("source should parse");
        let context = Context::create();
        let mut lowerer = Lowerer::new(&context, "test");
        lowerer.lower(&nodes).expect("source should lower");
        lowerer.verify().expect("module should verify");
        lowerer.emit_ir()
    }

    fn lower_error(source: &str) -> CodeGenError {
        let nodes = ternc_par::parse(source).expect("source should parse");
        let context = Context::create();
        let mut lowerer = Lowerer::new(&context, "test");
        lowerer.lower(&nodes).expect_err("lowering should fail")
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_local_variable_allocates_and_stores() {
        let ir = lower_source("func f() { var x: int = 41 + 1; }");
        assert!(ir.contains("alloca i32"), "ir: {}", ir);
        // The builder constant-folds 41 + 1.
        assert!(ir.contains("store i32 42"), "ir: {}", ir);
    }

    #[test]
    fn test_global_variable_gets_initializer() {
        let ir = lower_source("var g: int = 3;");
        assert!(ir.contains("@g = global i32 3"), "ir: {}", ir);
    }

    #[test]
    fn test_global_without_assignment_is_zero() {
        let ir = lower_source("var g: int;");
        assert!(ir.contains("@g = global i32 0"), "ir: {}", ir);
    }

    #[test]
    fn test_global_float_variable() {
        let ir = lower_source("var g: float = 1.5;");
        assert!(ir.contains("@g = global float"), "ir: {}", ir);
    }

    #[test]
    fn test_inferred_return_type_becomes_i32() {
        let ir = lower_source("func id(n: int) { return n; }");
        assert!(ir.contains("define i32 @id(i32"), "ir: {}", ir);
        assert!(ir.contains("load i32"), "ir: {}", ir);
        assert!(ir.contains("ret i32"), "ir: {}", ir);
    }

    #[test]
    fn test_function_without_return_defaults_to_zero() {
        let ir = lower_source("func f() { }");
        assert!(ir.contains("ret i32 0"), "ir: {}", ir);
    }

    #[test]
    fn test_binary_add_on_loads() {
        let ir = lower_source("func f(a: int, b: int) { return a + b; }");
        assert!(ir.contains("add i32"), "ir: {}", ir);
    }

    #[test]
    fn test_float_arithmetic_uses_float_instructions() {
        let ir = lower_source("func f(a: float, b: float) { return a + b * a / b - a; }");
        assert!(ir.contains("fadd float"), "ir: {}", ir);
        assert!(ir.contains("fmul float"), "ir: {}", ir);
        assert!(ir.contains("fdiv float"), "ir: {}", ir);
        assert!(ir.contains("fsub float"), "ir: {}", ir);
    }

    #[test]
    fn test_float_comparison_uses_fcmp() {
        let ir = lower_source("func f(a: float) { return a < 1.5; }");
        assert!(ir.contains("fcmp olt float"), "ir: {}", ir);
        assert!(ir.contains("zext i1"), "ir: {}", ir);
    }

    #[test]
    fn test_comparison_yields_i32_via_zext() {
        let ir = lower_source("func f(a: int) { return a < 3; }");
        assert!(ir.contains("icmp slt i32"), "ir: {}", ir);
        assert!(ir.contains("zext i1"), "ir: {}", ir);
        assert!(ir.contains("ret i32"), "ir: {}", ir);
    }

    #[test]
    fn test_bitclear_lowers_to_and_not() {
        let ir = lower_source("func f(a: int, b: int) { return a &^ b; }");
        assert!(ir.contains("xor i32"), "ir: {}", ir);
        assert!(ir.contains("and i32"), "ir: {}", ir);
    }

    #[test]
    fn test_shift_right_is_logical() {
        let ir = lower_source("func f(a: int, b: int) { return a >> b; }");
        assert!(ir.contains("lshr i32"), "ir: {}", ir);
    }

    #[test]
    fn test_call_lowers_arguments() {
        let ir = lower_source("func f(x: int) { print_int(x); }");
        assert!(ir.contains("call i32 @print_int"), "ir: {}", ir);
        assert!(ir.contains("declare i32 @print_int(i32)"), "ir: {}", ir);
    }

    #[test]
    fn test_if_else_chain_blocks() {
        let ir = lower_source(
            "func f(x: int): int { if (x) { return 1; } else if (x) { return 2; } else { return 3; } }",
        );
        assert!(count(&ir, "if_check") >= 2, "ir: {}", ir);
        assert!(count(&ir, "if_body") >= 3, "ir: {}", ir);
        assert!(ir.contains("if_exit"), "ir: {}", ir);
        assert!(ir.contains("ret i32 1"), "ir: {}", ir);
        assert!(ir.contains("ret i32 2"), "ir: {}", ir);
        assert!(ir.contains("ret i32 3"), "ir: {}", ir);
    }

    #[test]
    fn test_break_kills_rest_of_its_block() {
        let ir = lower_source("func f() { var i: int = 0; while (i) { break; i = i; } }");
        assert!(ir.contains("while_check"), "ir: {}", ir);
        assert!(ir.contains("while_body"), "ir: {}", ir);
        assert!(ir.contains("while_exit"), "ir: {}", ir);
        // One store for the initializer; `i = i;` after the break in the
        // same block is dead and never lowered.
        assert_eq!(count(&ir, "store i32"), 1, "ir: {}", ir);
    }

    #[test]
    fn test_break_in_if_leaves_loop_body_alive() {
        let ir = lower_source(
            "func f() { var i: int = 0; while (i < 10) { if (i == 5) { break; } i = i + 1; } }",
        );
        // The break's block branches straight to the loop exit...
        assert!(ir.contains("br label %while_exit"), "ir: {}", ir);
        // ...but the increment after the if chain still lowers,
        assert!(ir.contains("add i32"), "ir: {}", ir);
        assert_eq!(count(&ir, "store i32"), 2, "ir: {}", ir);
        // and the body keeps its back edge to the check block.
        assert!(count(&ir, "br label %while_check") >= 2, "ir: {}", ir);
    }

    #[test]
    fn test_continue_branches_to_check() {
        let ir = lower_source("func f() { var i: int = 0; while (i) { continue; } }");
        assert!(ir.contains("while_check"), "ir: {}", ir);
        assert!(ir.contains("br label %while_check"), "ir: {}", ir);
    }

    #[test]
    fn test_statements_after_return_are_dead() {
        let ir = lower_source("func f(x: int) { return x; print_int(x); }");
        assert!(!ir.contains("call i32 @print_int"), "ir: {}", ir);
    }

    #[test]
    fn test_nested_loop_break_targets_inner_exit() {
        let ir = lower_source(
            "func f() { var i: int = 0; while (i) { while (i) { break; } i = i + 1; } }",
        );
        // Outer body statements after the inner loop still lower.
        assert!(count(&ir, "store i32") >= 2, "ir: {}", ir);
        // Two distinct exit blocks, one per loop.
        assert!(ir.contains("while_exit:"), "ir: {}", ir);
        assert!(ir.contains("while_exit1:"), "ir: {}", ir);
    }

    #[test]
    fn test_global_assignment_requires_constant() {
        let error = lower_error("var g: int; func f(): int { return 1; } var h: int; func s(n: int) { h = n; }");
        assert!(matches!(error, CodeGenError::NonConstantGlobalInit(_)));
    }

    #[test]
    fn test_array_literal_is_unsupported() {
        let error = lower_error("func f() { var xs = {1, 2}; }");
        assert!(matches!(error, CodeGenError::UnsupportedType(_)));
    }

    #[test]
    fn test_postfix_increment_adds_one() {
        let ir = lower_source("func f(n: int) { return n++; }");
        assert!(ir.contains("add i32"), "ir: {}", ir);
    }

    #[test]
    fn test_unary_minus_negates() {
        let ir = lower_source("func f(n: int) { return -n; }");
        assert!(ir.contains("sub i32 0"), "ir: {}", ir);
    }

    #[test]
    fn test_logical_not() {
        let ir = lower_source("func f(n: int) { return !n; }");
        assert!(ir.contains("icmp eq i32"), "ir: {}", ir);
    }

    #[test]
    fn test_recursive_function_calls_itself() {
        let ir = lower_source("func f(n: int): int { if (n) { return f(n - 1); } return 0; }");
        assert!(ir.contains("call i32 @f"), "ir: {}", ir);
    }

    #[test]
    fn test_condition_compares_against_zero() {
        let ir = lower_source("func f(n: int) { if (n) { return 1; } }");
        assert!(ir.contains("icmp ne i32"), "ir: {}", ir);
    }

    #[test]
    fn test_params_are_stored_into_allocas() {
        let ir = lower_source("func f(a: int, b: float) { }");
        assert_eq!(count(&ir, "alloca"), 2, "ir: {}", ir);
        assert_eq!(count(&ir, "store"), 2, "ir: {}", ir);
    }

    #[test]
    fn test_shadowed_local_reuses_name() {
        let ir = lower_source(
            "func f() { var x: int = 1; if (x) { var x: float = 2.5; print_int(1); } }",
        );
        assert!(ir.contains("alloca i32"), "ir: {}", ir);
        assert!(ir.contains("alloca float"), "ir: {}", ir);
    }
}
