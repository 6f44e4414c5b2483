//! ternc-gen - LLVM code generation for the Tern compiler.
//!
//! Lowers the typed AST to LLVM IR through inkwell, verifies the module,
//! and emits a native object file for the default target triple.

pub mod error;
pub mod llvm;
pub mod types;

pub use error::{CodeGenError, Result};
pub use llvm::Lowerer;
pub use types::TypeMapper;
