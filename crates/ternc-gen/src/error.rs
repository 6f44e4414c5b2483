//! Error types for LLVM code generation.

use thiserror::Error;

/// Error type for LLVM lowering, verification, and emission.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// Named value not present in the lowering scope stack.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Duplicate definition within one lowering scope.
    #[error("Symbol already defined in current scope: {0}")]
    SymbolAlreadyDefined(String),

    /// Callee missing from the module.
    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    /// Type with no LLVM mapping (arrays, unresolved infers, multi-return
    /// chains).
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Operand values of a kind the operator cannot take.
    #[error("Invalid operand type: {0}")]
    InvalidOperandType(String),

    /// Globals accept only constant initializers.
    #[error("Global variables must be initialized with a constant expression: {0}")]
    NonConstantGlobalInit(String),

    /// An LLVM builder call failed.
    #[error("LLVM operation failed: {0}")]
    LlvmOperationFailed(String),

    /// The module verifier rejected the emitted IR.
    #[error("Module verification failed: {0}")]
    VerifyFailed(String),

    /// Target machine creation failed for the default triple.
    #[error("Failed to create target machine")]
    TargetMachine,

    /// Object file emission failed.
    #[error("Failed to write object file: {0}")]
    ObjectEmission(String),

    /// Internal error - indicates a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;
