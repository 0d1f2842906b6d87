//! `berth-events` — record lifecycle events and their distribution.
//!
//! The session layer stores first and publishes after: a lifecycle event is
//! only ever emitted for a change that has already been applied to the record
//! store, so subscribers may treat every event as a fact.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod lifecycle;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use lifecycle::SessionEvent;
