//! Narration orchestrator — drives the turn coordinator from
//! message-created events.
//!
//! Delivery is at-least-once: the event feed may hand the same message to
//! the orchestrator twice, and a redelivered trigger finds the narrator (or
//! the next actor) holding the turn and is skipped by the coordinator's
//! claim.

use tracing::debug;

use fablebound_content::SceneLibrary;
use fablebound_core::error::DomainError;
use fablebound_core::message::{AuthorRole, Message};
use fablebound_core::narration::NarrationProvider;
use fablebound_core::store::ContentStore;

use crate::turn::{TurnOutcome, take_turn};

/// A message was appended to a session's log.
#[derive(Debug, Clone)]
pub struct MessageCreated {
    /// The appended message, as persisted.
    pub message: Message,
}

/// Handles one message-created event. Narrator-authored and administrative
/// messages are a silent no-op; qualifying participant actions run a full
/// turn, whose recovery path guarantees a failed narration never leaves the
/// session parked on the narrator.
///
/// # Errors
///
/// Returns an error only when the store fails in a way the recovery path
/// cannot absorb; the caller is expected to log it.
pub async fn handle_message_created(
    event: &MessageCreated,
    store: &dyn ContentStore,
    provider: &dyn NarrationProvider,
    scenes: &SceneLibrary,
) -> Result<TurnOutcome, DomainError> {
    let message = &event.message;
    if message.author_role == AuthorRole::Narrator || message.is_turn_announcement {
        debug!(
            session_id = %message.session_id,
            "ignoring non-qualifying message"
        );
        return Ok(TurnOutcome::Skipped);
    }
    take_turn(message, store, provider, scenes).await
}
