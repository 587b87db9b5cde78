//! Messages — the append-only narrative log of a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::character::NARRATOR_NAME;
use crate::participant::ParticipantId;

/// The conventional body of the sentinel action that starts the turn cycle.
pub const ADVENTURE_START_PROMPT: &str = "Begin the adventure.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    /// A real participant.
    Participant,
    /// The automated narrator.
    Narrator,
}

impl AuthorRole {
    /// Stable string form, used by the persistence layer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Narrator => "narrator",
        }
    }
}

/// A persisted, immutable message. Ordering within a session is
/// authoritative by `created_at` (server-assigned), not arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier.
    pub id: Uuid,
    /// The session this message belongs to.
    pub session_id: Uuid,
    /// Authoring participant (the narrator id for narrator messages).
    pub author: ParticipantId,
    /// Display name shown with the message.
    pub author_name: String,
    /// Authoring role.
    pub author_role: AuthorRole,
    /// Body text.
    pub body: String,
    /// Administrative "it is X's turn" marker; never narrative content.
    pub is_turn_announcement: bool,
    /// Sentinel marker for the action that starts the adventure.
    pub is_adventure_start: bool,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A message about to be appended. The store assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// The session to append to.
    pub session_id: Uuid,
    /// Authoring participant.
    pub author: ParticipantId,
    /// Display name shown with the message.
    pub author_name: String,
    /// Authoring role.
    pub author_role: AuthorRole,
    /// Body text.
    pub body: String,
    /// Administrative turn-announcement marker.
    pub is_turn_announcement: bool,
    /// Adventure-start sentinel marker.
    pub is_adventure_start: bool,
}

impl NewMessage {
    /// A participant action message.
    #[must_use]
    pub fn participant(
        session_id: Uuid,
        author: ParticipantId,
        author_name: impl Into<String>,
        body: impl Into<String>,
        is_adventure_start: bool,
    ) -> Self {
        Self {
            session_id,
            author,
            author_name: author_name.into(),
            author_role: AuthorRole::Participant,
            body: body.into(),
            is_turn_announcement: false,
            is_adventure_start,
        }
    }

    /// A narrator message.
    #[must_use]
    pub fn narrator(session_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            session_id,
            author: ParticipantId::narrator(),
            author_name: NARRATOR_NAME.to_owned(),
            author_role: AuthorRole::Narrator,
            body: body.into(),
            is_turn_announcement: false,
            is_adventure_start: false,
        }
    }

    /// An administrative message announcing whose turn it is.
    #[must_use]
    pub fn turn_announcement(session_id: Uuid, next_character_name: &str) -> Self {
        Self {
            session_id,
            author: ParticipantId::narrator(),
            author_name: NARRATOR_NAME.to_owned(),
            author_role: AuthorRole::Narrator,
            body: format!("It is now {next_character_name}'s turn."),
            is_turn_announcement: true,
            is_adventure_start: false,
        }
    }
}
