//! Identity catalog and attendance ledger.
//!
//! The [`Ledger`] owns two record families in one [`KVStore`]:
//!
//! - **Catalog**: one [`IdentityRecord`] per id. Registration is
//!   write-once; re-registering an id is rejected.
//! - **Attendance**: at most one [`AttendanceEntry`] per
//!   `(identity_id, date, context_label)`. Later writes for the same key are
//!   dropped without error.
//!
//! The catalog is loaded once in [`Ledger::open`] and served from memory.
//! Every write is committed to the store before it is acknowledged.
//!
//! [`KVStore`]: rollcall_kv::KVStore

mod attendance;
mod catalog;
pub mod error;
pub mod keys;
mod ledger;
pub mod types;

pub use error::LedgerError;
pub use ledger::{Ledger, LedgerConfig};
pub use types::{AttendanceEntry, IdentityRecord, Status};
