use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::keys::{attendance_key, session_prefix};
use crate::ledger::Ledger;
use crate::types::{AttendanceEntry, Status};

impl Ledger {
    /// Appends an attendance entry unless one already exists for
    /// `(identity_id, date, context_label)`.
    ///
    /// Returns `true` if the entry was written, `false` if an earlier entry
    /// for the key exists (that entry is kept as is). The identity must be
    /// registered. Storage failures are returned, never swallowed.
    pub fn record_attendance(&self, entry: &AttendanceEntry) -> Result<bool, LedgerError> {
        self.check_entry(entry)?;
        self.in_scope(entry.date, &entry.context_label, || self.append_entry(entry))
    }

    /// Marks every catalog identity not in `present_ids` as absent for
    /// `(date, context_label)`.
    ///
    /// Identities that already have an entry for the key are left untouched.
    /// Returns the ids newly marked absent, in id order.
    pub fn complete_session(
        &self,
        context_label: &str,
        date: NaiveDate,
        time: NaiveTime,
        present_ids: &HashSet<String>,
    ) -> Result<Vec<String>, LedgerError> {
        if context_label.is_empty() {
            return Err(LedgerError::EmptyContext);
        }

        let marked = self.in_scope(date, context_label, || {
            let mut marked = Vec::new();
            for rec in self.identities() {
                if present_ids.contains(&rec.id) {
                    continue;
                }
                let entry = AttendanceEntry {
                    identity_id: rec.id.clone(),
                    display_name: rec.display_name.clone(),
                    date,
                    time,
                    context_label: context_label.to_string(),
                    status: Status::Absent,
                };
                if self.append_entry(&entry)? {
                    marked.push(rec.id.clone());
                }
            }
            Ok::<_, LedgerError>(marked)
        })?;

        info!(
            context = context_label,
            %date,
            absent = marked.len(),
            "session completed"
        );
        Ok(marked)
    }

    /// The entry for one identity in one session, if recorded.
    pub fn entry(
        &self,
        identity_id: &str,
        date: NaiveDate,
        context_label: &str,
    ) -> Result<Option<AttendanceEntry>, LedgerError> {
        let key = attendance_key(&self.cfg.prefix, date, context_label, identity_id);
        match self.store.get(&key)? {
            Some(data) => rmp_serde::from_slice(&data)
                .map(Some)
                .map_err(|e| LedgerError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// All entries recorded for `(date, context_label)`, ordered by identity id.
    pub fn attendance_on(
        &self,
        date: NaiveDate,
        context_label: &str,
    ) -> Result<Vec<AttendanceEntry>, LedgerError> {
        let prefix = session_prefix(&self.cfg.prefix, date, context_label);
        let mut entries = Vec::new();
        for (key, value) in self.store.scan(&prefix)? {
            match rmp_serde::from_slice::<AttendanceEntry>(&value) {
                Ok(e) => entries.push(e),
                Err(e) => warn!(key = %key, error = %e, "skipping undecodable attendance entry"),
            }
        }
        Ok(entries)
    }

    fn check_entry(&self, entry: &AttendanceEntry) -> Result<(), LedgerError> {
        if entry.context_label.is_empty() {
            return Err(LedgerError::EmptyContext);
        }
        if !self.catalog.read().contains_key(&entry.identity_id) {
            return Err(LedgerError::NotFound(entry.identity_id.clone()));
        }
        Ok(())
    }

    /// Caller must run inside the entry's scope (see `in_scope`).
    fn append_entry(&self, entry: &AttendanceEntry) -> Result<bool, LedgerError> {
        let key = attendance_key(
            &self.cfg.prefix,
            entry.date,
            &entry.context_label,
            &entry.identity_id,
        );
        let data = rmp_serde::to_vec_named(entry)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let written = self.store.put_if_absent(&key, &data)?;
        debug!(
            id = %entry.identity_id,
            context = %entry.context_label,
            status = %entry.status,
            written,
            "attendance"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rollcall_kv::{KVError, KVResult, KVStore, MemoryStore};
    use rollcall_vecmath::Embedding;

    use super::*;
    use crate::LedgerConfig;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn ledger_with(ids: &[&str]) -> Ledger {
        let ledger = Ledger::open(Box::new(MemoryStore::new()), LedgerConfig::default()).unwrap();
        for id in ids {
            let emb = Embedding::new(vec![1.0, 0.0]).unwrap();
            ledger.register_identity(id, &format!("name-{id}"), emb).unwrap();
        }
        ledger
    }

    fn entry(id: &str, context: &str, status: Status) -> AttendanceEntry {
        AttendanceEntry {
            identity_id: id.into(),
            display_name: format!("name-{id}"),
            date: day(),
            time: at(9, 0),
            context_label: context.into(),
            status,
        }
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_write_wins() {
        let ledger = ledger_with(&["A"]);

        assert!(ledger.record_attendance(&entry("A", "math", Status::Present)).unwrap());
        assert!(!ledger.record_attendance(&entry("A", "math", Status::Absent)).unwrap());
        assert!(!ledger.record_attendance(&entry("A", "math", Status::Present)).unwrap());

        let got = ledger.entry("A", day(), "math").unwrap().unwrap();
        assert_eq!(got.status, Status::Present);
        assert_eq!(ledger.attendance_on(day(), "math").unwrap().len(), 1);
    }

    #[test]
    fn contexts_and_dates_are_separate_keys() {
        let ledger = ledger_with(&["A"]);
        assert!(ledger.record_attendance(&entry("A", "math", Status::Present)).unwrap());
        assert!(ledger.record_attendance(&entry("A", "art", Status::Present)).unwrap());

        let mut next_day = entry("A", "math", Status::Present);
        next_day.date = day().succ_opt().unwrap();
        assert!(ledger.record_attendance(&next_day).unwrap());
    }

    #[test]
    fn unknown_identity_is_not_found() {
        let ledger = ledger_with(&["A"]);
        let err = ledger
            .record_attendance(&entry("Z", "math", Status::Present))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn empty_context_is_rejected() {
        let ledger = ledger_with(&["A"]);
        assert!(matches!(
            ledger.record_attendance(&entry("A", "", Status::Present)),
            Err(LedgerError::EmptyContext)
        ));
        assert!(matches!(
            ledger.complete_session("", day(), at(10, 0), &set(&[])),
            Err(LedgerError::EmptyContext)
        ));
    }

    #[test]
    fn complete_session_marks_only_missing() {
        let ledger = ledger_with(&["A", "B", "C"]);
        ledger.record_attendance(&entry("A", "math", Status::Present)).unwrap();

        let absent = ledger
            .complete_session("math", day(), at(10, 0), &set(&["A"]))
            .unwrap();
        assert_eq!(absent, vec!["B", "C"]);

        let entries = ledger.attendance_on(day(), "math").unwrap();
        let summary: Vec<(String, Status)> = entries
            .iter()
            .map(|e| (e.identity_id.clone(), e.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A".into(), Status::Present),
                ("B".into(), Status::Absent),
                ("C".into(), Status::Absent),
            ]
        );
        assert_eq!(entries[1].display_name, "name-B");
        assert_eq!(entries[1].time, at(10, 0));
    }

    #[test]
    fn complete_session_is_idempotent() {
        let ledger = ledger_with(&["A", "B"]);
        let first = ledger
            .complete_session("math", day(), at(10, 0), &set(&[]))
            .unwrap();
        assert_eq!(first.len(), 2);

        let second = ledger
            .complete_session("math", day(), at(11, 0), &set(&[]))
            .unwrap();
        assert!(second.is_empty());

        // A late recognition does not flip an existing absence.
        assert!(!ledger.record_attendance(&entry("A", "math", Status::Present)).unwrap());
    }

    #[test]
    fn concurrent_recordings_write_once() {
        let ledger = Arc::new(ledger_with(&["A"]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    ledger
                        .record_attendance(&entry("A", "math", Status::Present))
                        .unwrap()
                })
            })
            .collect();
        let written = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|w| *w)
            .count();
        assert_eq!(written, 1);
        assert_eq!(ledger.open_scopes(), 0);
    }

    #[test]
    fn scopes_are_released_after_use() {
        let ledger = ledger_with(&["A", "B"]);
        for n in 0..50 {
            let mut e = entry("A", &format!("class{n}"), Status::Present);
            e.date = day() + chrono::Days::new(n);
            ledger.record_attendance(&e).unwrap();
            ledger
                .complete_session(&e.context_label, e.date, at(10, 0), &set(&["A"]))
                .unwrap();
        }
        assert_eq!(ledger.open_scopes(), 0);
    }

    struct BrokenStore {
        inner: MemoryStore,
    }

    impl KVStore for BrokenStore {
        fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn put_if_absent(&self, key: &str, value: &[u8]) -> KVResult<bool> {
            if key.contains(":att:") {
                return Err(KVError::Storage("disk full".into()));
            }
            self.inner.put_if_absent(key, value)
        }

        fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
            self.inner.scan(prefix)
        }
    }

    #[test]
    fn storage_failure_is_surfaced() {
        let ledger = Ledger::open(
            Box::new(BrokenStore {
                inner: MemoryStore::new(),
            }),
            LedgerConfig::default(),
        )
        .unwrap();
        ledger
            .register_identity("A", "Ada", Embedding::new(vec![1.0]).unwrap())
            .unwrap();

        let err = ledger
            .record_attendance(&entry("A", "math", Status::Present))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert!(ledger.complete_session("math", day(), at(10, 0), &set(&[])).is_err());
    }
}
