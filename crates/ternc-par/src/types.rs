//! Type model.
//!
//! Types are scalars plus an optional array-dimension chain. `Infer` is
//! the not-yet-known sentinel; once a declaration is fully type-checked
//! every reachable `TypeInfo` is `Int` or `Float`. Multi-return functions
//! chain their return types through `next`.

/// Scalar type of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scalar {
    Int,
    Float,
    /// Not yet known; must be resolved before lowering.
    Infer,
}

/// Full type of a value: scalar, array shape, and the next link of a
/// multi-return chain.
///
/// Type infos are cloned whenever they move to a new owner, never
/// aliased.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeInfo {
    pub scalar: Scalar,
    /// Ordered array dimensions; `-1` marks an unknown/empty dimension.
    pub dims: Vec<i64>,
    /// Next type in a multi-return chain.
    pub next: Option<Box<TypeInfo>>,
}

impl TypeInfo {
    /// A plain scalar type.
    pub fn scalar(scalar: Scalar) -> Self {
        Self {
            scalar,
            dims: Vec::new(),
            next: None,
        }
    }

    /// The inferred-type sentinel.
    pub fn infer() -> Self {
        Self::scalar(Scalar::Infer)
    }

    /// An array of the given scalar with the given dimensions.
    pub fn array(scalar: Scalar, dims: Vec<i64>) -> Self {
        Self {
            scalar,
            dims,
            next: None,
        }
    }

    /// True when the head scalar is still the `Infer` sentinel.
    pub fn is_infer(&self) -> bool {
        self.scalar == Scalar::Infer
    }

    /// True when this is a scalar (no array shape, no chain).
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty() && self.next.is_none()
    }
}
