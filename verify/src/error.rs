use rollcall_vecmath::VecMathError;
use thiserror::Error;

/// Errors returned by verify operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    #[error("verify: no usable samples")]
    NoSamples,

    #[error("verify: invalid embedding: {0}")]
    InvalidEmbedding(#[from] VecMathError),

    #[error("verify: invalid config: {0}")]
    InvalidConfig(String),
}
