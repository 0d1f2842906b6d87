//! Session-layer error model.

use thiserror::Error;

use berth_core::DomainError;

/// Result type used across the session layer.
pub type SessionResult<T> = Result<T, SessionError>;

/// Persistence-layer error.
///
/// These are infrastructure/coordination failures (staleness, codec, store
/// access) as opposed to `DomainError`'s deterministic domain failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Optimistic concurrency check failed (stale row version).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The operation conflicts with the session's current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Domain validation failure surfaced through a session scope.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested row does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// State snapshot (de)serialization failed.
    #[error("state snapshot failed: {0}")]
    Codec(String),

    /// Underlying store access failed.
    #[error("store access failed: {0}")]
    Store(String),

    /// Event publication failed after the store write was applied.
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<DomainError> for SessionError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => SessionError::Validation(msg),
            DomainError::InvalidId(msg) => SessionError::Validation(msg),
            DomainError::InvariantViolation(msg) => SessionError::Conflict(msg),
            DomainError::Conflict(msg) => SessionError::Concurrency(msg),
            DomainError::NotFound => SessionError::NotFound("record".to_string()),
        }
    }
}
