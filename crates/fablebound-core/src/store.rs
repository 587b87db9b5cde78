//! Content store abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::character::Character;
use crate::error::DomainError;
use crate::invite::{Invite, InviteStatus, NewInvite};
use crate::message::{Message, NewMessage};
use crate::participant::ParticipantId;
use crate::session::Session;

/// How often a versioned session write is retried before giving up.
pub const TXN_RETRY_LIMIT: u32 = 5;

/// Persistent document store for sessions, characters, messages, and
/// invites.
///
/// Session writes use optimistic concurrency: `update_session`,
/// `admit_participant`, and `create_session` succeed only when the stored
/// version still equals `session.version`, and persist `session.version + 1`.
/// A caller that keeps using its copy after a successful write is expected
/// to bump `version` itself.
///
/// Multi-record operations (`create_session`, `admit_participant`,
/// `delete_session`) are all-or-nothing. Timestamps on messages and invites
/// are assigned by the store, so log ordering never depends on handler
/// arrival order.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Creates a session together with its initial character records and the
    /// global character-index entries for the real characters among them.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyExists` when a session with the same id
    /// exists.
    async fn create_session(
        &self,
        session: &Session,
        characters: &[Character],
    ) -> Result<(), DomainError>;

    /// Fetches a session by id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, DomainError>;

    /// Conditionally rewrites a session document (version check as described
    /// on the trait).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` when the stored version no
    /// longer matches, `DomainError::NotFound` when the session is gone.
    async fn update_session(&self, session: &Session) -> Result<(), DomainError>;

    /// Conditionally rewrites a session document and, in the same
    /// transaction, creates the joining participant's character record and
    /// its character-index entry.
    ///
    /// # Errors
    ///
    /// Same contract as [`ContentStore::update_session`].
    async fn admit_participant(
        &self,
        session: &Session,
        character: &Character,
    ) -> Result<(), DomainError>;

    /// Deletes a session document and its character-index entries. Messages
    /// and characters must already have been drained via the batch deletes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn delete_session(&self, id: Uuid) -> Result<(), DomainError>;

    /// Sessions the participant has a character in, via the global
    /// character index.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn sessions_for(
        &self,
        participant: &ParticipantId,
    ) -> Result<Vec<Session>, DomainError>;

    /// Fetches the character `owner` controls in `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn get_character(
        &self,
        session_id: Uuid,
        owner: &ParticipantId,
    ) -> Result<Option<Character>, DomainError>;

    /// Deletes up to `limit` character records under the session, ordered by
    /// a stable key. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn delete_characters_batch(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<u64, DomainError>;

    /// Appends a message, assigning its id and server timestamp. Returns the
    /// persisted message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn append_message(&self, message: NewMessage) -> Result<Message, DomainError>;

    /// The most recent `limit` messages of a session in descending creation
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn recent_messages(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<Vec<Message>, DomainError>;

    /// Deletes a single message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn delete_message(&self, session_id: Uuid, message_id: Uuid)
    -> Result<(), DomainError>;

    /// Deletes up to `limit` messages under the session, ordered by a stable
    /// key. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn delete_messages_batch(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<u64, DomainError>;

    /// Creates a pending invite, assigning its id and server timestamp.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn create_invite(&self, invite: NewInvite) -> Result<Invite, DomainError>;

    /// Fetches an invite by id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn get_invite(&self, id: Uuid) -> Result<Option<Invite>, DomainError>;

    /// Transitions an invite's status.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` when the invite is absent.
    async fn set_invite_status(
        &self,
        id: Uuid,
        status: InviteStatus,
    ) -> Result<(), DomainError>;

    /// Pending invites addressed to `recipient`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on store failure.
    async fn pending_invites_for(
        &self,
        recipient: &ParticipantId,
    ) -> Result<Vec<Invite>, DomainError>;
}
