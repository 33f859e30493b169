use thiserror::Error;

/// Errors returned by vecmath operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VecMathError {
    #[error("vecmath: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("vecmath: empty vector")]
    EmptyVector,

    #[error("vecmath: non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("vecmath: zero-norm vector")]
    ZeroNorm,
}
