//! Transaction-scoped sessions: persist, merge, find, remove, commit.

use chrono::Utc;
use uuid::Uuid;

use berth_core::{ExpectedVersion, RecordId, TxnId};
use berth_events::{EventBus, EventEnvelope, SessionEvent};

use crate::context::{ChangeKind, PersistenceContext, StagedChange};
use crate::error::{SessionError, SessionResult};
use crate::record::{PersistentRecord, rehydrate, snapshot};
use crate::row::{RowKey, UncommittedRow};
use crate::store::RecordStore;

/// A unit of work over a record store.
///
/// A session stages changes against its private persistence context and
/// applies them to the store on [`commit`](Session::commit). Reads are
/// **read-your-writes**: staged state shadows stored state within the session.
///
/// ## Managed copies, not references
///
/// Every record a session hands back is an owned value rebuilt from a state
/// snapshot. The session holds no references into caller-owned instances and
/// callers hold no references into the session. In particular, merging a
/// record whose embeddable was copied from a shared static default can never
/// write back through that default.
pub struct Session<S, B> {
    store: S,
    bus: B,
    txn_id: TxnId,
    context: PersistenceContext,
}

impl<S, B> Session<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<SessionEvent>>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            txn_id: TxnId::new(),
            context: PersistenceContext::default(),
        }
    }

    /// Transaction identifier, used for log correlation.
    pub fn txn_id(&self) -> TxnId {
        self.txn_id
    }

    /// Make a transient record persistent.
    ///
    /// Generates an identifier and stages a first write. Passing a record
    /// that already carries an identifier is a [`SessionError::Conflict`]:
    /// detached state re-enters a session through [`merge`](Session::merge).
    pub fn persist<T: PersistentRecord>(&mut self, record: T) -> SessionResult<T> {
        if let Some(id) = record.record_id() {
            return Err(SessionError::Conflict(format!(
                "persist called with an already-assigned identifier: {} {id}",
                T::record_type()
            )));
        }

        let mut record = record;
        let id = RecordId::new();
        record.assign_record_id(id);

        let payload = snapshot(&record)?;
        self.context
            .stage_write(RowKey::new::<T>(id), payload, ChangeKind::Persisted, 0);

        tracing::debug!(
            record_type = T::record_type(),
            record_id = %id,
            txn = %self.txn_id,
            "staged transient record"
        );
        Ok(record)
    }

    /// Merge detached state into the session, returning a managed copy.
    ///
    /// The detached input is read, never kept: its state is snapshotted by
    /// value, staged against the row (generating an identifier for transient
    /// input), and the returned managed copy is rebuilt from that snapshot.
    /// Later mutations of either side are invisible to the other.
    ///
    /// A detached identifier unknown to the store re-creates the row under
    /// that identifier. Merging a record staged for removal in this session
    /// is a [`SessionError::Conflict`].
    pub fn merge<T: PersistentRecord>(&mut self, record: &T) -> SessionResult<T> {
        let (id, base) = match record.record_id() {
            Some(id) => {
                let key = RowKey::new::<T>(id);
                if self.context.is_staged_for_removal(&key) {
                    return Err(SessionError::Conflict(format!(
                        "cannot merge a record staged for removal: {} {id}",
                        T::record_type()
                    )));
                }
                (id, self.observed_version(&key)?)
            }
            None => (RecordId::new(), 0),
        };

        // Snapshot the detached state by value. Every alias in the caller's
        // object graph, shared defaults included, stops here.
        let mut detached = record.clone();
        detached.assign_record_id(id);
        let payload = snapshot(&detached)?;

        self.context
            .stage_write(RowKey::new::<T>(id), payload.clone(), ChangeKind::Merged, base);

        let managed = rehydrate::<T>(&payload)?;
        tracing::debug!(
            record_type = T::record_type(),
            record_id = %id,
            txn = %self.txn_id,
            "merged detached state"
        );
        Ok(managed)
    }

    /// Fetch a record by identifier, staged state first (read-your-writes).
    pub fn find<T: PersistentRecord>(&mut self, id: RecordId) -> SessionResult<Option<T>> {
        let key = RowKey::new::<T>(id);

        if self.context.is_staged_for_removal(&key) {
            return Ok(None);
        }
        if let Some(payload) = self.context.staged_payload(&key) {
            return rehydrate::<T>(payload).map(Some);
        }

        match self.store.get(&key)? {
            Some(row) => {
                self.context.note_loaded(&key, row.version);
                rehydrate::<T>(&row.payload).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Whether this session currently manages the record.
    pub fn contains<T: PersistentRecord>(&self, id: RecordId) -> bool {
        self.context.manages(&RowKey::new::<T>(id))
    }

    /// Stage the removal of a record.
    ///
    /// Removing a record that only exists as a staged first write cancels the
    /// write. Removing an identifier unknown to both the session and the
    /// store is a [`SessionError::NotFound`].
    pub fn remove<T: PersistentRecord>(&mut self, id: RecordId) -> SessionResult<()> {
        let key = RowKey::new::<T>(id);

        if self.context.staged_payload(&key).is_some()
            && self.context.base_version(&key) == Some(0)
        {
            self.context.unstage(&key);
            tracing::debug!(
                record_type = T::record_type(),
                record_id = %id,
                txn = %self.txn_id,
                "unstaged new record"
            );
            return Ok(());
        }

        let base = match self.context.base_version(&key) {
            Some(version) if version > 0 => version,
            _ => match self.store.get(&key)? {
                Some(row) => row.version,
                None => {
                    return Err(SessionError::NotFound(format!(
                        "{} {id}",
                        T::record_type()
                    )));
                }
            },
        };

        self.context.stage_removal(key, base);
        tracing::debug!(
            record_type = T::record_type(),
            record_id = %id,
            txn = %self.txn_id,
            "staged removal"
        );
        Ok(())
    }

    /// Apply every staged change to the store, then publish lifecycle events.
    ///
    /// Changes apply in staging order, each under its optimistic expectation.
    /// Store first, publish after: a publish failure leaves the store write
    /// applied and surfaces as [`SessionError::Publish`] (at-least-once
    /// distribution; subscribers must be idempotent).
    pub fn commit(self) -> SessionResult<()> {
        let Session {
            store,
            bus,
            txn_id,
            context,
        } = self;

        let changes = context.drain();
        let applied = changes.len();

        for (key, change, base) in changes {
            match change {
                StagedChange::Write { payload, kind } => {
                    let stored = store.upsert(
                        UncommittedRow {
                            record_id: key.record_id,
                            record_type: key.record_type,
                            payload,
                        },
                        ExpectedVersion::Exact(base),
                    )?;

                    let event = match kind {
                        ChangeKind::Persisted => SessionEvent::RecordPersisted {
                            record_id: stored.record_id,
                            record_type: stored.record_type.clone(),
                            row_version: stored.version,
                            occurred_at: stored.updated_at,
                        },
                        ChangeKind::Merged => SessionEvent::RecordMerged {
                            record_id: stored.record_id,
                            record_type: stored.record_type.clone(),
                            row_version: stored.version,
                            occurred_at: stored.updated_at,
                        },
                    };
                    let envelope = EventEnvelope::new(
                        Uuid::now_v7(),
                        stored.record_id,
                        stored.record_type.clone(),
                        stored.version,
                        event,
                    );
                    bus.publish(envelope)
                        .map_err(|e| SessionError::Publish(format!("{e:?}")))?;
                }
                StagedChange::Remove => {
                    let removed = store.remove(&key, ExpectedVersion::Exact(base))?;

                    let event = SessionEvent::RecordRemoved {
                        record_id: removed.record_id,
                        record_type: removed.record_type.clone(),
                        occurred_at: Utc::now(),
                    };
                    let envelope = EventEnvelope::new(
                        Uuid::now_v7(),
                        removed.record_id,
                        removed.record_type.clone(),
                        0,
                        event,
                    );
                    bus.publish(envelope)
                        .map_err(|e| SessionError::Publish(format!("{e:?}")))?;
                }
            }
        }

        tracing::info!(txn = %txn_id, applied, "transaction committed");
        Ok(())
    }

    /// Discard all staged changes.
    pub fn rollback(self) {
        let staged = self.context.staged_len();
        tracing::debug!(txn = %self.txn_id, staged, "transaction rolled back");
    }

    fn observed_version(&self, key: &RowKey) -> SessionResult<u64> {
        if let Some(version) = self.context.base_version(key) {
            return Ok(version);
        }
        Ok(self.store.get(key)?.map(|row| row.version).unwrap_or(0))
    }
}
