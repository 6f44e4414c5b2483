//! ternc-util - Shared foundation types for the ternc compiler.
//!
//! This crate holds the pieces every phase needs: source spans for
//! positional diagnostics and the generic scope tree used by both the
//! parser (semantic symbols) and the LLVM lowerer (value slots).

pub mod scope;
pub mod span;

pub use scope::{Rib, RibId, RibKind, ScopeTree, Symbol, SymbolKind};
pub use span::Span;

// Re-export the hash map used for symbol bindings.
pub use rustc_hash::FxHashMap;
