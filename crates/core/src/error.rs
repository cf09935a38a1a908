//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// `Unauthorized` and `InvalidTransition` are programming/UI-sync errors:
/// under correct boundary behavior they do not occur, and when they do, the
/// single operation fails without side effects. `StoreFailure` is the only
/// variant that originates outside this process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A capability check failed at the authorization gate.
    #[error("unauthorized")]
    Unauthorized,

    /// The record's current status has no outgoing edge for the action.
    #[error("invalid transition: no edge '{action}' from '{from}'")]
    InvalidTransition { from: String, action: String },

    /// Another mutation on the same record is still in flight.
    #[error("record busy: a mutation is already in flight")]
    Busy,

    /// An I/O failure from a collaborator store.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// The record disappeared between list and detail view.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(from: impl Into<String>, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            action: action.into(),
        }
    }

    pub fn store_failure(msg: impl Into<String>) -> Self {
        Self::StoreFailure(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
