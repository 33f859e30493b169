use std::sync::Arc;

use rollcall_vecmath::{Embedding, VecMathError, check_vector};
use tracing::info;

use crate::error::LedgerError;
use crate::keys::identity_key;
use crate::ledger::Ledger;
use crate::types::IdentityRecord;

impl Ledger {
    /// Adds an identity to the catalog.
    ///
    /// Fails with [`LedgerError::InvalidId`] unless `id` is non-empty and
    /// alphanumeric, and with [`LedgerError::DuplicateIdentity`] if it is
    /// already registered. The record is durable before this returns `Ok`.
    pub fn register_identity(
        &self,
        id: &str,
        display_name: &str,
        embedding: Embedding,
    ) -> Result<(), LedgerError> {
        if id.is_empty() || !id.chars().all(char::is_alphanumeric) {
            return Err(LedgerError::InvalidId(id.to_string()));
        }
        if self.cfg.dim != 0 && embedding.dim() != self.cfg.dim {
            return Err(VecMathError::DimensionMismatch {
                expected: self.cfg.dim,
                got: embedding.dim(),
            }
            .into());
        }
        check_vector(&embedding)?;

        // Held across the write so two registrations of one id cannot race.
        let mut catalog = self.catalog.write();
        if catalog.contains_key(id) {
            return Err(LedgerError::DuplicateIdentity(id.to_string()));
        }

        let rec = IdentityRecord {
            id: id.to_string(),
            display_name: display_name.to_string(),
            embedding,
        };
        let data = rmp_serde::to_vec_named(&rec)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        if !self
            .store
            .put_if_absent(&identity_key(&self.cfg.prefix, id), &data)?
        {
            // Written by another handle on the same store since open.
            return Err(LedgerError::DuplicateIdentity(id.to_string()));
        }

        catalog.insert(rec.id.clone(), Arc::new(rec));
        info!(id, catalog = catalog.len(), "identity registered");
        Ok(())
    }

    /// Returns the record for `id`.
    pub fn identity(&self, id: &str) -> Result<Arc<IdentityRecord>, LedgerError> {
        self.catalog
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Snapshot of the catalog, ordered by id.
    pub fn identities(&self) -> Vec<Arc<IdentityRecord>> {
        self.catalog.read().values().cloned().collect()
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.catalog.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use rollcall_kv::{MemoryStore, RedbStore};
    use tempfile::tempdir;

    use super::*;
    use crate::LedgerConfig;

    fn emb(v: &[f32]) -> Embedding {
        Embedding::new(v.to_vec()).unwrap()
    }

    fn memory_ledger() -> Ledger {
        Ledger::open(Box::new(MemoryStore::new()), LedgerConfig::default()).unwrap()
    }

    #[test]
    fn register_and_lookup() {
        let ledger = memory_ledger();
        ledger.register_identity("S1", "Ada", emb(&[1.0, 0.0])).unwrap();

        let rec = ledger.identity("S1").unwrap();
        assert_eq!(rec.display_name, "Ada");
        assert_eq!(rec.embedding.as_slice(), &[1.0, 0.0]);
        assert!(matches!(ledger.identity("S2"), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn rejects_duplicate_without_overwriting() {
        let ledger = memory_ledger();
        ledger.register_identity("S1", "Ada", emb(&[1.0])).unwrap();

        let err = ledger.register_identity("S1", "Eve", emb(&[2.0])).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateIdentity(id) if id == "S1"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.identity("S1").unwrap().display_name, "Ada");
    }

    #[test]
    fn rejects_non_alphanumeric_id() {
        let ledger = memory_ledger();
        for bad in ["", "S-1", "a b", "x:y", "../etc"] {
            let err = ledger.register_identity(bad, "X", emb(&[1.0])).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidId(_)), "{bad:?}");
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn enforces_configured_dimension() {
        let ledger = Ledger::open(
            Box::new(MemoryStore::new()),
            LedgerConfig {
                dim: 3,
                ..Default::default()
            },
        )
        .unwrap();
        let err = ledger.register_identity("S1", "Ada", emb(&[1.0, 0.0])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidEmbedding(_)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn rejects_zero_embedding() {
        let ledger = memory_ledger();
        let err = ledger
            .register_identity("S1", "Ada", emb(&[0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidEmbedding(VecMathError::ZeroNorm)
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn identities_are_ordered_by_id() {
        let ledger = memory_ledger();
        for id in ["C", "A", "B"] {
            ledger.register_identity(id, id, emb(&[1.0])).unwrap();
        }
        let ids: Vec<String> = ledger.identities().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn duplicate_written_by_other_handle() {
        let store = MemoryStore::new();
        let a = Ledger::open(Box::new(store.clone()), LedgerConfig::default()).unwrap();
        let b = Ledger::open(Box::new(store), LedgerConfig::default()).unwrap();

        a.register_identity("S1", "Ada", emb(&[1.0])).unwrap();
        let err = b.register_identity("S1", "Eve", emb(&[1.0])).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateIdentity(_)));
        assert!(b.is_empty());
    }

    #[test]
    fn catalog_reloads_from_redb() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            let ledger = Ledger::open(Box::new(store), LedgerConfig::default()).unwrap();
            ledger.register_identity("S1", "Ada", emb(&[0.25, 0.5])).unwrap();
            ledger.register_identity("S2", "Bob", emb(&[0.5, 0.25])).unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        let ledger = Ledger::open(Box::new(store), LedgerConfig::default()).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.identity("S2").unwrap().embedding.as_slice(), &[0.5, 0.25]);
    }

    #[test]
    fn prefixes_isolate_catalogs() {
        let store = MemoryStore::new();
        let a = Ledger::open(
            Box::new(store.clone()),
            LedgerConfig {
                prefix: "a".into(),
                dim: 0,
            },
        )
        .unwrap();
        a.register_identity("S1", "Ada", emb(&[1.0])).unwrap();

        let b = Ledger::open(
            Box::new(store),
            LedgerConfig {
                prefix: "b".into(),
                dim: 0,
            },
        )
        .unwrap();
        assert!(b.is_empty());
    }
}
