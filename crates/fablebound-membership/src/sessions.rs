//! Session lifecycle — create, join, list, delete.

use tracing::info;
use uuid::Uuid;

use fablebound_core::character::{Character, NewCharacter};
use fablebound_core::error::DomainError;
use fablebound_core::identity::Identity;
use fablebound_core::session::Session;
use fablebound_core::store::{ContentStore, TXN_RETRY_LIMIT};

/// Batch size for the bounded recursive deletion used in session teardown.
pub const DELETE_BATCH_SIZE: u32 = 50;

fn validated_name(character: &NewCharacter) -> Result<&str, DomainError> {
    let name = character.name.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidArgument(
            "character name must not be empty".to_owned(),
        ));
    }
    Ok(name)
}

/// Creates a session owned by `identity`, seats the narrator after them,
/// and creates both character records. All-or-nothing.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for a blank character name.
pub async fn create_and_join_session(
    identity: &Identity,
    character: NewCharacter,
    store: &dyn ContentStore,
) -> Result<Session, DomainError> {
    let name = validated_name(&character)?.to_owned();
    let session = Session::new(Uuid::new_v4(), identity.participant_id.clone());
    let player = Character {
        session_id: session.id,
        owner: identity.participant_id.clone(),
        name,
        attributes: character.attributes,
        is_narrator: false,
    };
    let narrator = Character::narrator(session.id);
    store.create_session(&session, &[player, narrator]).await?;
    info!(session_id = %session.id, owner = %session.owner, "session created");
    Ok(session)
}

/// Adds `identity` to an existing session with set-union semantics:
/// rejoining is a no-op that returns the current session. The membership
/// write, the character record, and the index entry land atomically;
/// concurrent joins retry on version conflict, so neither is lost.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when the session is absent,
/// `DomainError::InvalidArgument` for a blank character name.
pub async fn join_session(
    session_id: Uuid,
    identity: &Identity,
    character: NewCharacter,
    store: &dyn ContentStore,
) -> Result<Session, DomainError> {
    let name = validated_name(&character)?.to_owned();
    for _ in 0..TXN_RETRY_LIMIT {
        let mut session = store
            .get_session(session_id)
            .await?
            .ok_or_else(|| DomainError::not_found("session", session_id))?;
        if session.is_member(&identity.participant_id) {
            return Ok(session);
        }
        session.add_member(identity.participant_id.clone());
        let record = Character {
            session_id,
            owner: identity.participant_id.clone(),
            name: name.clone(),
            attributes: character.attributes,
            is_narrator: false,
        };
        match store.admit_participant(&session, &record).await {
            Ok(()) => {
                session.version += 1;
                info!(
                    session_id = %session_id,
                    participant = %identity.participant_id,
                    "participant joined"
                );
                return Ok(session);
            }
            Err(DomainError::ConcurrencyConflict { .. }) => {}
            Err(error) => return Err(error),
        }
    }
    Err(DomainError::Internal(
        "join contention exceeded the retry limit".to_owned(),
    ))
}

/// Sessions the participant has a character in.
///
/// # Errors
///
/// Returns `DomainError::Internal` on store failure.
pub async fn list_sessions(
    identity: &Identity,
    store: &dyn ContentStore,
) -> Result<Vec<Session>, DomainError> {
    store.sessions_for(&identity.participant_id).await
}

/// Tears down a session: messages, then characters, in bounded batches
/// ordered by a stable key, then the session document itself. Only the
/// session owner may do this.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when the session or the caller's
/// character is absent, `DomainError::PermissionDenied` when the caller is
/// not the owner.
pub async fn delete_character_and_session(
    session_id: Uuid,
    identity: &Identity,
    store: &dyn ContentStore,
) -> Result<(), DomainError> {
    let session = store
        .get_session(session_id)
        .await?
        .ok_or_else(|| DomainError::not_found("session", session_id))?;
    store
        .get_character(session_id, &identity.participant_id)
        .await?
        .ok_or_else(|| DomainError::not_found("character", &identity.participant_id))?;
    if session.owner != identity.participant_id {
        return Err(DomainError::PermissionDenied(
            "only the session owner may delete it".to_owned(),
        ));
    }

    loop {
        let deleted = store
            .delete_messages_batch(session_id, DELETE_BATCH_SIZE)
            .await?;
        if deleted < u64::from(DELETE_BATCH_SIZE) {
            break;
        }
    }
    loop {
        let deleted = store
            .delete_characters_batch(session_id, DELETE_BATCH_SIZE)
            .await?;
        if deleted < u64::from(DELETE_BATCH_SIZE) {
            break;
        }
    }
    store.delete_session(session_id).await?;
    info!(session_id = %session_id, "session deleted");
    Ok(())
}
