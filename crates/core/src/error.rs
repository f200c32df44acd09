//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// This is the single error taxonomy for the whole system. Authorization and
/// validation errors are raised before any mutation; `Internal` is reserved for
/// unexpected store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No session, or the session credential is invalid / resolves to an
    /// inactive account.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated, but not permitted for this resource/action.
    #[error("forbidden")]
    Forbidden,

    /// A requested resource id does not resolve.
    #[error("not found")]
    NotFound,

    /// A state-machine rule was violated (e.g. reviewer setting DRAFT).
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A value failed validation (malformed input, field-level).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness or in-flight-work violation (duplicate email, duplicate
    /// active edit draft, organization still owning records).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected store failure. Details belong in server-side logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
