//! Persistent record trait: serde-backed state snapshots.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use berth_core::{Entity, RecordId};

use crate::error::{SessionError, SessionResult};

/// A root record the session layer can manage.
///
/// State moves between detached instances and stored rows as **value
/// snapshots** (serde). The session never stores or returns a reference into
/// a caller's instance. That is what makes shared-default aliasing
/// impossible: merging a record constructed from a shared constant copies the
/// constant's state, never the constant itself.
pub trait PersistentRecord:
    Entity<Id = RecordId> + Clone + Serialize + DeserializeOwned + core::fmt::Debug
{
    /// Stable type name namespacing this record's rows (e.g. "directory.customer").
    fn record_type() -> &'static str;

    /// Called by the session when a generated identifier is assigned.
    fn assign_record_id(&mut self, id: RecordId);

    /// Identifier, if one has been assigned.
    fn record_id(&self) -> Option<RecordId> {
        self.id().copied()
    }
}

/// Snapshot a record's state into a storable payload.
pub(crate) fn snapshot<T: PersistentRecord>(record: &T) -> SessionResult<JsonValue> {
    serde_json::to_value(record)
        .map_err(|e| SessionError::Codec(format!("state serialization failed: {e}")))
}

/// Rebuild a managed copy from a stored payload.
pub(crate) fn rehydrate<T: PersistentRecord>(payload: &JsonValue) -> SessionResult<T> {
    serde_json::from_value(payload.clone())
        .map_err(|e| SessionError::Codec(format!("state deserialization failed: {e}")))
}
