use rollcall_kv::KVError;
use rollcall_vecmath::VecMathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger: identity {0:?} already registered")]
    DuplicateIdentity(String),

    #[error("ledger: invalid identity id {0:?}: must be non-empty and alphanumeric")]
    InvalidId(String),

    #[error("ledger: identity {0:?} not found")]
    NotFound(String),

    #[error("ledger: empty context label")]
    EmptyContext,

    #[error("ledger: invalid embedding: {0}")]
    InvalidEmbedding(#[from] VecMathError),

    #[error("ledger: storage error: {0}")]
    Storage(#[from] KVError),

    #[error("ledger: serialization error: {0}")]
    Serialization(String),
}
