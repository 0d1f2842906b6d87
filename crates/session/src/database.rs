//! Database facade: shared store + bus, session factory, transaction scopes.

use std::sync::Arc;

use berth_events::{EventBus, EventEnvelope, InMemoryEventBus, SessionEvent, Subscription};

use crate::error::SessionResult;
use crate::session::Session;
use crate::store::InMemoryRecordStore;

/// Session type opened by [`Database::session`].
pub type DatabaseSession =
    Session<Arc<InMemoryRecordStore>, Arc<InMemoryEventBus<EventEnvelope<SessionEvent>>>>;

/// Handle to an embedded database: one shared record store plus a lifecycle
/// event bus. Cloning the handle shares both.
#[derive(Debug, Clone, Default)]
pub struct Database {
    store: Arc<InMemoryRecordStore>,
    bus: Arc<InMemoryEventBus<EventEnvelope<SessionEvent>>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session (unit of work) against this database.
    pub fn session(&self) -> DatabaseSession {
        Session::new(Arc::clone(&self.store), Arc::clone(&self.bus))
    }

    /// Shared record store (handy for fixtures and assertions).
    pub fn store(&self) -> Arc<InMemoryRecordStore> {
        Arc::clone(&self.store)
    }

    /// Subscribe to lifecycle events published by committing sessions.
    pub fn subscribe(&self) -> Subscription<EventEnvelope<SessionEvent>> {
        self.bus.subscribe()
    }

    /// Number of rows currently stored.
    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    /// Run `f` in a transaction scope: commit on `Ok`, roll back on `Err`.
    pub fn within_transaction<F, R>(&self, f: F) -> SessionResult<R>
    where
        F: FnOnce(&mut DatabaseSession) -> SessionResult<R>,
    {
        let mut session = self.session();
        match f(&mut session) {
            Ok(value) => {
                session.commit()?;
                Ok(value)
            }
            Err(err) => {
                session.rollback();
                Err(err)
            }
        }
    }
}
