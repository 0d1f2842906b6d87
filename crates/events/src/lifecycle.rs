//! Record lifecycle events emitted by the session layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use berth_core::RecordId;

use crate::event::Event;

/// What happened to a record when a transaction committed.
///
/// One event is emitted per applied change, after the store write succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A transient record was written for the first time.
    RecordPersisted {
        record_id: RecordId,
        record_type: String,
        row_version: u64,
        occurred_at: DateTime<Utc>,
    },
    /// Detached state was copied onto a managed row (insert or update).
    RecordMerged {
        record_id: RecordId,
        record_type: String,
        row_version: u64,
        occurred_at: DateTime<Utc>,
    },
    /// A row was deleted.
    RecordRemoved {
        record_id: RecordId,
        record_type: String,
        occurred_at: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn record_id(&self) -> RecordId {
        match self {
            SessionEvent::RecordPersisted { record_id, .. }
            | SessionEvent::RecordMerged { record_id, .. }
            | SessionEvent::RecordRemoved { record_id, .. } => *record_id,
        }
    }

    pub fn record_type(&self) -> &str {
        match self {
            SessionEvent::RecordPersisted { record_type, .. }
            | SessionEvent::RecordMerged { record_type, .. }
            | SessionEvent::RecordRemoved { record_type, .. } => record_type,
        }
    }

    /// Version the stored row reached, or 0 for removals.
    pub fn row_version(&self) -> u64 {
        match self {
            SessionEvent::RecordPersisted { row_version, .. }
            | SessionEvent::RecordMerged { row_version, .. } => *row_version,
            SessionEvent::RecordRemoved { .. } => 0,
        }
    }
}

impl Event for SessionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::RecordPersisted { .. } => "session.record.persisted",
            SessionEvent::RecordMerged { .. } => "session.record.merged",
            SessionEvent::RecordRemoved { .. } => "session.record.removed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::RecordPersisted { occurred_at, .. }
            | SessionEvent::RecordMerged { occurred_at, .. }
            | SessionEvent::RecordRemoved { occurred_at, .. } => *occurred_at,
        }
    }
}
