//! Append-only key-value store interface and implementations.
//!
//! Provides a trait-based interface with an in-memory implementation for
//! testing and a redb-based implementation for persistence. Writes are
//! committed before the call returns, so a successful return means the
//! value is durable (for [`RedbStore`]).

pub mod memory;
pub mod redb;

use std::fmt;

use thiserror::Error;

/// Errors that can occur in KV store operations.
#[derive(Error, Debug)]
pub enum KVError {
    #[error("kv: storage error: {0}")]
    Storage(String),
}

/// Result type for KV operations.
pub type KVResult<T> = Result<T, KVError>;

pub(crate) fn storage(e: impl fmt::Display) -> KVError {
    KVError::Storage(e.to_string())
}

/// Append-only key-value store with string keys and byte values.
///
/// Implementations must be safe for concurrent use. Existing keys are
/// never overwritten.
pub trait KVStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>>;

    /// Insert `value` under `key` unless the key already exists.
    ///
    /// Returns `true` if the value was written, `false` if the key was
    /// present (the stored value is left untouched). The existence check
    /// and the write happen atomically.
    fn put_if_absent(&self, key: &str, value: &[u8]) -> KVResult<bool>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>>;
}

impl fmt::Debug for dyn KVStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KVStore {{ ... }}")
    }
}

pub use memory::MemoryStore;
pub use redb::RedbStore;
