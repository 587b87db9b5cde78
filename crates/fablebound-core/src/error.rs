//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Membership and invite operations surface these directly to the caller.
/// The narration path absorbs them into its recovery behavior instead.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No authenticated identity accompanied the request.
    #[error("not authenticated")]
    Unauthenticated,

    /// A required input was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A session, character, invite, or identity is absent.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        kind: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// Ownership or turn-ownership mismatch.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Duplicate membership or invite.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The narration provider returned empty or whitespace-only text.
    #[error("narration provider returned empty text")]
    EmptyGeneration,

    /// A versioned session write lost the race against a concurrent writer.
    #[error("concurrency conflict on session {session_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The session that had the conflict.
        session_id: Uuid,
        /// The version the writer expected to find.
        expected: i64,
        /// The version actually stored.
        actual: i64,
    },

    /// A store or provider failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Builds a `NotFound` error for the given record kind and identifier.
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
