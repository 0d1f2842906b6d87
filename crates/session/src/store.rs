//! Record store trait + in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use berth_core::ExpectedVersion;

use crate::error::SessionError;
use crate::row::{RowKey, StoredRow, UncommittedRow};

/// Mutable, type-namespaced row store.
///
/// Unlike an append-only log, rows here are **overwritten in place**: merge
/// copies detached state onto the current row. The per-row version counter
/// plus `ExpectedVersion` give sessions optimistic concurrency over those
/// overwrites.
pub trait RecordStore: Send + Sync {
    /// Write a row. `expected_version` is checked against the current row
    /// version (0 when the row does not exist); on success the row's version
    /// advances by exactly 1.
    fn upsert(
        &self,
        row: UncommittedRow,
        expected_version: ExpectedVersion,
    ) -> Result<StoredRow, SessionError>;

    /// Fetch a row by key.
    fn get(&self, key: &RowKey) -> Result<Option<StoredRow>, SessionError>;

    /// Delete a row by key, returning it. Missing rows are an error.
    fn remove(
        &self,
        key: &RowKey,
        expected_version: ExpectedVersion,
    ) -> Result<StoredRow, SessionError>;
}

/// In-memory record store.
///
/// Intended for tests/dev and embedded use. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    rows: RwLock<HashMap<RowKey, StoredRow>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows.
    pub fn row_count(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn upsert(
        &self,
        row: UncommittedRow,
        expected_version: ExpectedVersion,
    ) -> Result<StoredRow, SessionError> {
        let key = RowKey::of(row.record_type.clone(), row.record_id);

        let mut rows = self
            .rows
            .write()
            .map_err(|_| SessionError::Store("lock poisoned".to_string()))?;

        let current = rows.get(&key).map(|r| r.version).unwrap_or(0);
        if !expected_version.matches(current) {
            return Err(SessionError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        let stored = StoredRow {
            record_id: row.record_id,
            record_type: row.record_type,
            version: current + 1,
            updated_at: Utc::now(),
            payload: row.payload,
        };
        rows.insert(key, stored.clone());
        Ok(stored)
    }

    fn get(&self, key: &RowKey) -> Result<Option<StoredRow>, SessionError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| SessionError::Store("lock poisoned".to_string()))?;

        Ok(rows.get(key).cloned())
    }

    fn remove(
        &self,
        key: &RowKey,
        expected_version: ExpectedVersion,
    ) -> Result<StoredRow, SessionError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| SessionError::Store("lock poisoned".to_string()))?;

        let current = rows.get(key).map(|r| r.version).unwrap_or(0);
        if current == 0 {
            return Err(SessionError::NotFound(format!(
                "{} {}",
                key.record_type, key.record_id
            )));
        }
        if !expected_version.matches(current) {
            return Err(SessionError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        match rows.remove(key) {
            Some(row) => Ok(row),
            None => Err(SessionError::Store("row vanished during remove".to_string())),
        }
    }
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn upsert(
        &self,
        row: UncommittedRow,
        expected_version: ExpectedVersion,
    ) -> Result<StoredRow, SessionError> {
        (**self).upsert(row, expected_version)
    }

    fn get(&self, key: &RowKey) -> Result<Option<StoredRow>, SessionError> {
        (**self).get(key)
    }

    fn remove(
        &self,
        key: &RowKey,
        expected_version: ExpectedVersion,
    ) -> Result<StoredRow, SessionError> {
        (**self).remove(key, expected_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::RecordId;
    use serde_json::json;

    fn pending(id: RecordId, city: &str) -> UncommittedRow {
        UncommittedRow {
            record_id: id,
            record_type: "directory.customer".to_string(),
            payload: json!({ "city": city }),
        }
    }

    #[test]
    fn first_write_assigns_version_one() {
        let store = InMemoryRecordStore::new();
        let id = RecordId::new();

        let stored = store
            .upsert(pending(id, "paris"), ExpectedVersion::Exact(0))
            .unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(store.row_count(), 1);
    }

    #[test]
    fn overwrite_advances_version_by_one() {
        let store = InMemoryRecordStore::new();
        let id = RecordId::new();

        store
            .upsert(pending(id, "paris"), ExpectedVersion::Exact(0))
            .unwrap();
        let stored = store
            .upsert(pending(id, "berlin"), ExpectedVersion::Exact(1))
            .unwrap();

        assert_eq!(stored.version, 2);
        assert_eq!(stored.payload, json!({ "city": "berlin" }));
        assert_eq!(store.row_count(), 1);
    }

    #[test]
    fn stale_expected_version_is_rejected() {
        let store = InMemoryRecordStore::new();
        let id = RecordId::new();

        store
            .upsert(pending(id, "paris"), ExpectedVersion::Exact(0))
            .unwrap();
        let err = store
            .upsert(pending(id, "berlin"), ExpectedVersion::Exact(0))
            .unwrap_err();

        match err {
            SessionError::Concurrency(_) => {}
            other => panic!("expected Concurrency, got {other:?}"),
        }
    }

    #[test]
    fn remove_returns_the_row_and_deletes_it() {
        let store = InMemoryRecordStore::new();
        let id = RecordId::new();

        let stored = store
            .upsert(pending(id, "paris"), ExpectedVersion::Exact(0))
            .unwrap();
        let removed = store.remove(&stored.key(), ExpectedVersion::Exact(1)).unwrap();

        assert_eq!(removed.record_id, id);
        assert_eq!(store.row_count(), 0);
    }

    #[test]
    fn remove_of_missing_row_is_not_found() {
        let store = InMemoryRecordStore::new();
        let key = RowKey::of("directory.customer", RecordId::new());

        let err = store.remove(&key, ExpectedVersion::Any).unwrap_err();
        match err {
            SessionError::NotFound(_) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn rows_with_the_same_id_are_namespaced_by_record_type() {
        let store = InMemoryRecordStore::new();
        let id = RecordId::new();

        store
            .upsert(pending(id, "paris"), ExpectedVersion::Exact(0))
            .unwrap();
        store
            .upsert(
                UncommittedRow {
                    record_id: id,
                    record_type: "logistics.freight".to_string(),
                    payload: json!({ "lane": "rotterdam" }),
                },
                ExpectedVersion::Exact(0),
            )
            .unwrap();

        assert_eq!(store.row_count(), 2);
    }
}
