//! `berth-session` — transaction-scoped persistence sessions.
//!
//! The central operation is [`Session::merge`]: detached state enters the
//! store as a value snapshot and comes back as a fresh managed copy. No
//! managed copy, detached input, or shared default embeddable ever aliases
//! another, so merging can never corrupt state it did not own.

mod context;

pub mod database;
pub mod error;
pub mod record;
pub mod row;
pub mod session;
pub mod store;

pub use database::{Database, DatabaseSession};
pub use error::{SessionError, SessionResult};
pub use record::PersistentRecord;
pub use row::{RowKey, StoredRow, UncommittedRow};
pub use session::Session;
pub use store::{InMemoryRecordStore, RecordStore};
