//! History builder — windows the raw message log into a context the
//! narration provider accepts.
//!
//! The provider speaks a strict two-role protocol: history must open with a
//! `user` turn, and the new prompt is itself the next `user` turn, so the
//! history must not end on one either.

use uuid::Uuid;

use fablebound_core::message::{AuthorRole, Message};
use fablebound_core::narration::{ChatRole, ChatTurn};

/// How many recent messages are considered when building context.
pub const HISTORY_WINDOW: u32 = 30;

/// Builds the provider context from the most recent messages of a session.
///
/// `recent_desc` is expected in descending creation order, exactly as the
/// store returns it. `trigger_id` is the message that started this turn; it
/// becomes the new prompt and is excluded here. Administrative turn
/// announcements are never context.
///
/// Narrator messages map to the `model` role. Everything else maps to
/// `user`, prefixed with the speaker's display name so the two-role
/// protocol does not lose who acted in multi-participant sessions.
#[must_use]
pub fn build_history(recent_desc: &[Message], trigger_id: Uuid) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = recent_desc
        .iter()
        .rev()
        .filter(|m| !m.is_turn_announcement && m.id != trigger_id)
        .map(|m| match m.author_role {
            AuthorRole::Narrator => ChatTurn::model(m.body.clone()),
            AuthorRole::Participant => {
                ChatTurn::user(format!("{}: {}", m.author_name, m.body))
            }
        })
        .collect();

    // The protocol requires the first turn to be `user`.
    match turns.iter().position(|t| t.role == ChatRole::User) {
        Some(first_user) => {
            turns.drain(..first_user);
        }
        None => turns.clear(),
    }

    // The new prompt is the next `user` turn; never hand over a history that
    // already ends on one.
    if turns.last().is_some_and(|t| t.role == ChatRole::User) {
        turns.pop();
    }

    turns
}
