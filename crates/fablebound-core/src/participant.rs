//! Participant identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The reserved participant identifier of the automated narrator.
///
/// Exactly one narrator sits in every session's turn order. Keeping the
/// identifier here, as a named constant, is what lets the rest of the
/// system tell real participants apart from the Master.
pub const NARRATOR_PARTICIPANT_ID: &str = "__master__";

/// A stable participant identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the narrator's identifier.
    #[must_use]
    pub fn narrator() -> Self {
        Self(NARRATOR_PARTICIPANT_ID.to_owned())
    }

    /// Whether this identifier names the narrator.
    #[must_use]
    pub fn is_narrator(&self) -> bool {
        self.0 == NARRATOR_PARTICIPANT_ID
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
