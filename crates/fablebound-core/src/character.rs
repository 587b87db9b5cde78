//! Characters — one per (participant, session), plus the synthetic narrator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::ParticipantId;

/// Display name of the narrator's synthetic character.
pub const NARRATOR_NAME: &str = "The Master";

/// A character's fixed numeric build. Attributes never change after
/// creation; the core never mutates a character record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    /// Raw physical power.
    pub might: u8,
    /// Speed and finesse.
    pub agility: u8,
    /// Perception and cunning.
    pub wits: u8,
    /// Willpower and presence.
    pub heart: u8,
}

/// A session-scoped character record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// The session this character lives in.
    pub session_id: Uuid,
    /// The participant who controls the character.
    pub owner: ParticipantId,
    /// Display name.
    pub name: String,
    /// Fixed attribute build.
    pub attributes: AttributeSet,
    /// Marks the narrator's synthetic character.
    pub is_narrator: bool,
}

impl Character {
    /// The narrator's synthetic character for `session_id`. It has no
    /// owner-controlled attributes.
    #[must_use]
    pub fn narrator(session_id: Uuid) -> Self {
        Self {
            session_id,
            owner: ParticipantId::narrator(),
            name: NARRATOR_NAME.to_owned(),
            attributes: AttributeSet::default(),
            is_narrator: true,
        }
    }
}

/// A character definition supplied when creating or joining a session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCharacter {
    /// Display name.
    pub name: String,
    /// Fixed attribute build.
    #[serde(default)]
    pub attributes: AttributeSet,
}
