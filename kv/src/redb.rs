//! Redb-based persistent key-value store.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{KVResult, KVStore, storage};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// A persistent store backed by redb.
///
/// Every write runs in its own transaction and is committed (fsync'd)
/// before returning.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> KVResult<Self> {
        let db = Database::create(path).map_err(storage)?;

        // Create the table up front so read transactions never miss it.
        let tx = db.begin_write().map_err(storage)?;
        tx.open_table(TABLE).map_err(storage)?;
        tx.commit().map_err(storage)?;

        Ok(Self { db })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> KVResult<bool> {
        let tx = self.db.begin_write().map_err(storage)?;
        let inserted = {
            let mut table = tx.open_table(TABLE).map_err(storage)?;
            let exists = table.get(key).map_err(storage)?.is_some();
            if !exists {
                table.insert(key, value).map_err(storage)?;
            }
            !exists
        };
        if inserted {
            tx.commit().map_err(storage)?;
        } else {
            tx.abort().map_err(storage)?;
        }
        Ok(inserted)
    }

    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;

        let mut results = Vec::new();
        for item in table.range(prefix..).map_err(storage)? {
            let (key, value) = item.map_err(storage)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_string(), value.value().to_vec()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn put_if_absent_and_get() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        assert!(store.put_if_absent("key1", b"value1").unwrap());
        assert!(!store.put_if_absent("key1", b"value2").unwrap());
        assert_eq!(store.get("key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get("key2").unwrap(), None);
    }

    #[test]
    fn scan_prefix() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.put_if_absent("prefix:b", b"2").unwrap();
        store.put_if_absent("prefix:a", b"1").unwrap();
        store.put_if_absent("other:c", b"3").unwrap();

        let results = store.scan("prefix:").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "prefix:a");
        assert_eq!(results[1].1, b"2".to_vec());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.put_if_absent("k", b"v").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        assert!(!store.put_if_absent("k", b"w").unwrap());
    }
}
