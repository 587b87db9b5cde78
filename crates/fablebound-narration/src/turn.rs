//! Turn coordinator — claim, narrate, rotate, recover.

use tracing::{debug, info, warn};
use uuid::Uuid;

use fablebound_content::SceneLibrary;
use fablebound_core::error::DomainError;
use fablebound_core::message::{Message, NewMessage};
use fablebound_core::narration::NarrationProvider;
use fablebound_core::participant::ParticipantId;
use fablebound_core::session::Session;
use fablebound_core::store::{ContentStore, TXN_RETRY_LIMIT};

use crate::history::{HISTORY_WINDOW, build_history};
use crate::prompt::{self, MASTER_PERSONA};

/// In-universe narrator message posted when a turn fails. The turn returns
/// to the actor, so the same action can simply be retried.
pub const RECOVERY_BODY: &str = "\
The Master's vision clouds for a moment, and the thread of the tale slips \
from his grasp. Gather yourself and attempt your action once more.";

/// What became of a qualifying message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Narration succeeded and the turn rotated to the next participant.
    Narrated,
    /// Narration failed; the turn was returned to the acting participant
    /// and a recovery message was posted.
    Recovered,
    /// The author no longer held the turn (stale or duplicate delivery);
    /// nothing was written.
    Skipped,
}

/// Runs one full turn for a qualifying message: claim the turn lock, run the
/// narration step, and either rotate forward or recover.
///
/// The claim is a compare-and-set of `current_turn` from the message author
/// to the narrator through the versioned session write. Holding the
/// narrator id in `current_turn` is what guarantees at most one narration
/// computation per session: a second qualifying message finds the narrator
/// in the seat and is skipped.
///
/// # Errors
///
/// Returns an error only when the store itself fails while claiming or
/// recovering. Narration and rotation failures are absorbed into
/// [`TurnOutcome::Recovered`].
pub async fn take_turn(
    message: &Message,
    store: &dyn ContentStore,
    provider: &dyn NarrationProvider,
    scenes: &SceneLibrary,
) -> Result<TurnOutcome, DomainError> {
    let Some(session) = claim_narration(store, message.session_id, &message.author).await? else {
        debug!(
            session_id = %message.session_id,
            author = %message.author,
            "author does not hold the turn; skipping"
        );
        return Ok(TurnOutcome::Skipped);
    };

    match narrate(&session, message, store, provider, scenes).await {
        Ok(()) => {
            // The sentinel exists only to start the cycle; it never stays
            // visible as a human action bubble.
            if message.is_adventure_start {
                store.delete_message(session.id, message.id).await?;
            }
            info!(session_id = %session.id, "turn narrated");
            Ok(TurnOutcome::Narrated)
        }
        Err(error) => {
            warn!(
                session_id = %session.id,
                %error,
                "narration failed; returning the turn to the actor"
            );
            let actor = message.author.clone();
            update_with_retry(store, session.id, move |s| {
                s.current_turn = actor.clone();
            })
            .await?;
            store
                .append_message(NewMessage::narrator(session.id, RECOVERY_BODY))
                .await?;
            Ok(TurnOutcome::Recovered)
        }
    }
}

/// Advances `current_turn` to the next real participant without narration.
///
/// # Errors
///
/// Returns `DomainError::PermissionDenied` when the caller does not hold the
/// turn, `DomainError::NotFound` when the session is absent.
pub async fn pass_turn(
    session_id: Uuid,
    caller: &ParticipantId,
    store: &dyn ContentStore,
) -> Result<Session, DomainError> {
    for _ in 0..TXN_RETRY_LIMIT {
        let mut session = store
            .get_session(session_id)
            .await?
            .ok_or_else(|| DomainError::not_found("session", session_id))?;
        if session.current_turn != *caller {
            return Err(DomainError::PermissionDenied(
                "it is not your turn".to_owned(),
            ));
        }
        let next = session.next_actor_after(caller).ok_or_else(|| {
            DomainError::Internal(format!("no successor for actor {caller}"))
        })?;
        session.current_turn = next.clone();
        match store.update_session(&session).await {
            Ok(()) => {
                session.version += 1;
                announce_turn(store, &session, &next).await?;
                return Ok(session);
            }
            Err(DomainError::ConcurrencyConflict { .. }) => {}
            Err(error) => return Err(error),
        }
    }
    Err(DomainError::Internal(
        "session write contention exceeded the retry limit".to_owned(),
    ))
}

/// Steps 2–4 of a turn: resolve the character, build context, generate,
/// persist, rotate, announce.
async fn narrate(
    session: &Session,
    message: &Message,
    store: &dyn ContentStore,
    provider: &dyn NarrationProvider,
    scenes: &SceneLibrary,
) -> Result<(), DomainError> {
    let character = store
        .get_character(session.id, &message.author)
        .await?
        .ok_or_else(|| DomainError::not_found("character", &message.author))?;

    let recent = store.recent_messages(session.id, HISTORY_WINDOW).await?;
    let history = build_history(&recent, message.id);
    let prompt = prompt::assemble(scenes.scene_text(session.act), &character, &message.body);

    let text = provider.generate(MASTER_PERSONA, &history, &prompt).await?;
    if text.trim().is_empty() {
        return Err(DomainError::EmptyGeneration);
    }
    store
        .append_message(NewMessage::narrator(session.id, text))
        .await?;

    let next = session.next_actor_after(&message.author).ok_or_else(|| {
        DomainError::Internal(format!("no successor for actor {}", message.author))
    })?;
    let next_for_update = next.clone();
    let session = update_with_retry(store, session.id, move |s| {
        s.current_turn = next_for_update.clone();
    })
    .await?;

    announce_turn(store, &session, &next).await
}

/// Appends the administrative turn announcement, if the next character
/// exists.
async fn announce_turn(
    store: &dyn ContentStore,
    session: &Session,
    next: &ParticipantId,
) -> Result<(), DomainError> {
    if let Some(next_character) = store.get_character(session.id, next).await? {
        store
            .append_message(NewMessage::turn_announcement(
                session.id,
                &next_character.name,
            ))
            .await?;
    }
    Ok(())
}

/// Compare-and-set of `current_turn` from `actor` to the narrator. Returns
/// `None` when `actor` does not hold the turn — the duplicate-delivery and
/// lost-race guard.
async fn claim_narration(
    store: &dyn ContentStore,
    session_id: Uuid,
    actor: &ParticipantId,
) -> Result<Option<Session>, DomainError> {
    for _ in 0..TXN_RETRY_LIMIT {
        let Some(mut session) = store.get_session(session_id).await? else {
            return Err(DomainError::not_found("session", session_id));
        };
        if session.current_turn != *actor {
            return Ok(None);
        }
        session.current_turn = ParticipantId::narrator();
        match store.update_session(&session).await {
            Ok(()) => {
                session.version += 1;
                return Ok(Some(session));
            }
            Err(DomainError::ConcurrencyConflict { .. }) => {}
            Err(error) => return Err(error),
        }
    }
    Err(DomainError::Internal(
        "session write contention exceeded the retry limit".to_owned(),
    ))
}

/// Read-modify-write of the session document with bounded retries, used
/// where a writer may race membership changes.
async fn update_with_retry(
    store: &dyn ContentStore,
    session_id: Uuid,
    mut apply: impl FnMut(&mut Session) + Send,
) -> Result<Session, DomainError> {
    for _ in 0..TXN_RETRY_LIMIT {
        let Some(mut session) = store.get_session(session_id).await? else {
            return Err(DomainError::not_found("session", session_id));
        };
        apply(&mut session);
        match store.update_session(&session).await {
            Ok(()) => {
                session.version += 1;
                return Ok(session);
            }
            Err(DomainError::ConcurrencyConflict { .. }) => {}
            Err(error) => return Err(error),
        }
    }
    Err(DomainError::Internal(
        "session write contention exceeded the retry limit".to_owned(),
    ))
}
