//! Stored row model: versioned, type-namespaced state snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use berth_core::RecordId;

use crate::record::PersistentRecord;

/// Key of a stored row. Record ids are only unique within a record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub record_type: String,
    pub record_id: RecordId,
}

impl RowKey {
    pub fn new<T: PersistentRecord>(record_id: RecordId) -> Self {
        Self::of(T::record_type(), record_id)
    }

    pub fn of(record_type: impl Into<String>, record_id: RecordId) -> Self {
        Self {
            record_type: record_type.into(),
            record_id,
        }
    }
}

/// A row change produced by a session, not yet applied to the store.
///
/// The store assigns the version on apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncommittedRow {
    pub record_id: RecordId,
    pub record_type: String,
    pub payload: JsonValue,
}

/// A stored row (assigned a version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub record_id: RecordId,
    pub record_type: String,

    /// Monotonically increasing write counter: 1 on first write.
    pub version: u64,

    /// When this version of the row was written.
    pub updated_at: DateTime<Utc>,

    /// Value snapshot of the record state.
    pub payload: JsonValue,
}

impl StoredRow {
    pub fn key(&self) -> RowKey {
        RowKey::of(self.record_type.clone(), self.record_id)
    }
}
