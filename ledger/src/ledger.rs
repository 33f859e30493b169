use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use rollcall_kv::KVStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::keys::identity_prefix;
use crate::types::IdentityRecord;

/// Ledger settings, fixed for the lifetime of a [`Ledger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Namespace for every key this ledger writes. Default: "rollcall".
    pub prefix: String,

    /// Required embedding dimension for registration. 0 accepts any.
    pub dim: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            prefix: "rollcall".into(),
            dim: 0,
        }
    }
}

/// Catalog and attendance ledger over a [`KVStore`].
///
/// Thread-safe. Attendance writes for the same `(date, context_label)` are
/// serialized, so a session completion never interleaves with a concurrent
/// recording in that scope.
pub struct Ledger {
    pub(crate) store: Box<dyn KVStore>,
    pub(crate) cfg: LedgerConfig,
    pub(crate) catalog: RwLock<BTreeMap<String, Arc<IdentityRecord>>>,
    scopes: Mutex<HashMap<(NaiveDate, String), Arc<Mutex<()>>>>,
}

impl Ledger {
    /// Opens a ledger and loads the catalog from `store`.
    ///
    /// Records that fail to decode are skipped with a warning.
    pub fn open(store: Box<dyn KVStore>, cfg: LedgerConfig) -> Result<Self, LedgerError> {
        let mut catalog = BTreeMap::new();
        for (key, value) in store.scan(&identity_prefix(&cfg.prefix))? {
            match rmp_serde::from_slice::<IdentityRecord>(&value) {
                Ok(rec) => {
                    catalog.insert(rec.id.clone(), Arc::new(rec));
                }
                Err(e) => warn!(key = %key, error = %e, "skipping undecodable identity record"),
            }
        }
        info!(identities = catalog.len(), prefix = %cfg.prefix, "ledger opened");

        Ok(Self {
            store,
            cfg,
            catalog: RwLock::new(catalog),
            scopes: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.cfg
    }

    /// Runs `f` holding the lock for attendance writes in one date and
    /// context. The lock is dropped from the map once no caller holds it.
    pub(crate) fn in_scope<T>(
        &self,
        date: NaiveDate,
        context: &str,
        f: impl FnOnce() -> T,
    ) -> T {
        let key = (date, context.to_string());
        let scope = self.scopes.lock().entry(key.clone()).or_default().clone();

        let out = {
            let _guard = scope.lock();
            f()
        };

        // Clones are only taken under the map lock, so a count of 2 (map and
        // this call) means no other caller holds or waits on the scope.
        let mut scopes = self.scopes.lock();
        if Arc::strong_count(&scope) == 2 {
            scopes.remove(&key);
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn open_scopes(&self) -> usize {
        self.scopes.lock().len()
    }
}
