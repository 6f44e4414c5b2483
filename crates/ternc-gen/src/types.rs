//! Type mapping from Tern types to LLVM IR types.

use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;

use ternc_par::{Scalar, TypeInfo};

use crate::error::{CodeGenError, Result};

/// Maps front-end type chains to LLVM types.
///
/// Only the two scalars lower: `int` becomes `i32` and `float` becomes
/// `float`. Array shapes and multi-return chains have no lowering and
/// are reported as unsupported.
pub struct TypeMapper<'ctx> {
    pub context: &'ctx Context,
}

impl<'ctx> TypeMapper<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self { context }
    }

    /// Map a scalar type to its LLVM basic type.
    pub fn map(&self, type_info: &TypeInfo) -> Result<BasicTypeEnum<'ctx>> {
        if !type_info.dims.is_empty() {
            return Err(CodeGenError::UnsupportedType("array value".to_string()));
        }
        if type_info.next.is_some() {
            return Err(CodeGenError::UnsupportedType(
                "multi-value return chain".to_string(),
            ));
        }
        match type_info.scalar {
            Scalar::Int => Ok(self.context.i32_type().into()),
            Scalar::Float => Ok(self.context.f32_type().into()),
            Scalar::Infer => Err(CodeGenError::UnsupportedType(
                "unresolved inferred type".to_string(),
            )),
        }
    }

    /// Map a function return chain; a function that never resolved its
    /// return type defaults to `int`.
    pub fn map_return(&self, type_info: &TypeInfo) -> Result<BasicTypeEnum<'ctx>> {
        if type_info.is_infer() && type_info.dims.is_empty() && type_info.next.is_none() {
            return Ok(self.context.i32_type().into());
        }
        self.map(type_info)
    }
}
