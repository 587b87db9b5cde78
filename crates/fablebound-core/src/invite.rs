//! Invites — the audit trail of who asked whom into which session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::ParticipantId;

/// Lifecycle of an invite. Invites transition out of `Pending` exactly once
/// and are never physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    /// Sent, awaiting an answer.
    Pending,
    /// Accepted — authorizes the recipient to join the session.
    Accepted,
    /// Declined.
    Declined,
}

impl InviteStatus {
    /// Stable string form, used by the persistence layer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

/// A persisted invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Invite identifier.
    pub id: Uuid,
    /// The session the recipient is invited into.
    pub session_id: Uuid,
    /// The inviting participant.
    pub sender: ParticipantId,
    /// The sender's character name in the session.
    pub sender_name: String,
    /// The invited participant.
    pub recipient: ParticipantId,
    /// The email the recipient was resolved from.
    pub recipient_email: String,
    /// Current status.
    pub status: InviteStatus,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An invite about to be created. The store assigns the id, the timestamp,
/// and the initial `Pending` status.
#[derive(Debug, Clone)]
pub struct NewInvite {
    /// The session the recipient is invited into.
    pub session_id: Uuid,
    /// The inviting participant.
    pub sender: ParticipantId,
    /// The sender's character name in the session.
    pub sender_name: String,
    /// The invited participant.
    pub recipient: ParticipantId,
    /// The email the recipient was resolved from.
    pub recipient_email: String,
}
