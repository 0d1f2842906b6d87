use serde::{Deserialize, Serialize};
use uuid::Uuid;

use berth_core::RecordId;

/// Envelope for a lifecycle event, carrying row metadata.
///
/// This is the unit handed to the bus after a commit applies a change.
///
/// Notes:
/// - `record_type` namespaces the record id (ids are only unique per type).
/// - `row_version` is the version the row reached when the change applied;
///   it is 0 for removals (the row no longer exists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    record_id: RecordId,
    record_type: String,

    /// Version of the stored row after the change.
    row_version: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        record_id: RecordId,
        record_type: impl Into<String>,
        row_version: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            record_id,
            record_type: record_type.into(),
            row_version,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn row_version(&self) -> u64 {
        self.row_version
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
