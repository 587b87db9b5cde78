//! Test stores — in-memory and always-failing `ContentStore`
//! implementations.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use fablebound_core::character::Character;
use fablebound_core::clock::Clock;
use fablebound_core::error::DomainError;
use fablebound_core::invite::{Invite, InviteStatus, NewInvite};
use fablebound_core::message::{Message, NewMessage};
use fablebound_core::participant::ParticipantId;
use fablebound_core::session::Session;
use fablebound_core::store::ContentStore;

#[derive(Debug, Default)]
struct StoreState {
    sessions: HashMap<Uuid, Session>,
    characters: HashMap<(Uuid, ParticipantId), Character>,
    /// Insertion order is the stable key for batch deletion and the
    /// tie-break for equal timestamps.
    messages: Vec<Message>,
    invites: HashMap<Uuid, Invite>,
    character_index: HashMap<ParticipantId, BTreeSet<Uuid>>,
}

/// A complete in-memory `ContentStore`. Honors the versioned-write contract,
/// assigns timestamps from the injected clock, and keeps message ordering
/// stable under equal timestamps, so tests with a `FixedClock` stay
/// deterministic.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
}

impl MemoryStore {
    /// A store assigning timestamps from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Every message of a session in ascending creation order, announcements
    /// included. Test-assertion helper.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn messages_ascending(&self, session_id: Uuid) -> Vec<Message> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        messages
    }

    /// How many character records a session still holds. Test-assertion
    /// helper.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn character_count(&self, session_id: Uuid) -> usize {
        let state = self.state.lock().unwrap();
        state
            .characters
            .keys()
            .filter(|(sid, _)| *sid == session_id)
            .count()
    }
}

fn conflict(session: &Session, actual: i64) -> DomainError {
    DomainError::ConcurrencyConflict {
        session_id: session.id,
        expected: session.version,
        actual,
    }
}

/// Writes `session` at `version + 1` if the stored version still matches.
fn checked_write(state: &mut StoreState, session: &Session) -> Result<(), DomainError> {
    let stored = state
        .sessions
        .get_mut(&session.id)
        .ok_or_else(|| DomainError::not_found("session", session.id))?;
    if stored.version != session.version {
        return Err(conflict(session, stored.version));
    }
    *stored = Session {
        version: session.version + 1,
        ..session.clone()
    };
    Ok(())
}

fn index_character(state: &mut StoreState, character: &Character) {
    state
        .characters
        .insert((character.session_id, character.owner.clone()), character.clone());
    if !character.is_narrator {
        state
            .character_index
            .entry(character.owner.clone())
            .or_default()
            .insert(character.session_id);
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_session(
        &self,
        session: &Session,
        characters: &[Character],
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.sessions.contains_key(&session.id) {
            return Err(DomainError::AlreadyExists(format!(
                "session {}",
                session.id
            )));
        }
        state.sessions.insert(session.id, session.clone());
        for character in characters {
            index_character(&mut state, character);
        }
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, DomainError> {
        Ok(self.state.lock().unwrap().sessions.get(&id).cloned())
    }

    async fn update_session(&self, session: &Session) -> Result<(), DomainError> {
        checked_write(&mut self.state.lock().unwrap(), session)
    }

    async fn admit_participant(
        &self,
        session: &Session,
        character: &Character,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        checked_write(&mut state, session)?;
        index_character(&mut state, character);
        Ok(())
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state.sessions.remove(&id);
        for sessions in state.character_index.values_mut() {
            sessions.remove(&id);
        }
        Ok(())
    }

    async fn sessions_for(
        &self,
        participant: &ParticipantId,
    ) -> Result<Vec<Session>, DomainError> {
        let state = self.state.lock().unwrap();
        let ids = state.character_index.get(participant);
        Ok(ids
            .into_iter()
            .flatten()
            .filter_map(|id| state.sessions.get(id).cloned())
            .collect())
    }

    async fn get_character(
        &self,
        session_id: Uuid,
        owner: &ParticipantId,
    ) -> Result<Option<Character>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.characters.get(&(session_id, owner.clone())).cloned())
    }

    async fn delete_characters_batch(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<u64, DomainError> {
        let mut state = self.state.lock().unwrap();
        let mut keys: Vec<(Uuid, ParticipantId)> = state
            .characters
            .keys()
            .filter(|(sid, _)| *sid == session_id)
            .cloned()
            .collect();
        keys.sort();
        keys.truncate(limit as usize);
        for key in &keys {
            state.characters.remove(key);
        }
        Ok(keys.len() as u64)
    }

    async fn append_message(&self, message: NewMessage) -> Result<Message, DomainError> {
        let persisted = Message {
            id: Uuid::new_v4(),
            session_id: message.session_id,
            author: message.author,
            author_name: message.author_name,
            author_role: message.author_role,
            body: message.body,
            is_turn_announcement: message.is_turn_announcement,
            is_adventure_start: message.is_adventure_start,
            created_at: self.clock.now(),
        };
        self.state.lock().unwrap().messages.push(persisted.clone());
        Ok(persisted)
    }

    async fn recent_messages(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<Vec<Message>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        // Stable sort: equal timestamps keep insertion order, so the reverse
        // is a faithful "most recent first".
        messages.sort_by_key(|m| m.created_at);
        Ok(messages.into_iter().rev().take(limit as usize).collect())
    }

    async fn delete_message(
        &self,
        session_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state
            .messages
            .retain(|m| !(m.session_id == session_id && m.id == message_id));
        Ok(())
    }

    async fn delete_messages_batch(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<u64, DomainError> {
        let mut state = self.state.lock().unwrap();
        let ids: Vec<Uuid> = state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .take(limit as usize)
            .map(|m| m.id)
            .collect();
        state.messages.retain(|m| !ids.contains(&m.id));
        Ok(ids.len() as u64)
    }

    async fn create_invite(&self, invite: NewInvite) -> Result<Invite, DomainError> {
        let persisted = Invite {
            id: Uuid::new_v4(),
            session_id: invite.session_id,
            sender: invite.sender,
            sender_name: invite.sender_name,
            recipient: invite.recipient,
            recipient_email: invite.recipient_email,
            status: InviteStatus::Pending,
            created_at: self.clock.now(),
        };
        self.state
            .lock()
            .unwrap()
            .invites
            .insert(persisted.id, persisted.clone());
        Ok(persisted)
    }

    async fn get_invite(&self, id: Uuid) -> Result<Option<Invite>, DomainError> {
        Ok(self.state.lock().unwrap().invites.get(&id).cloned())
    }

    async fn set_invite_status(
        &self,
        id: Uuid,
        status: InviteStatus,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let invite = state
            .invites
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("invite", id))?;
        invite.status = status;
        Ok(())
    }

    async fn pending_invites_for(
        &self,
        recipient: &ParticipantId,
    ) -> Result<Vec<Invite>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut invites: Vec<Invite> = state
            .invites
            .values()
            .filter(|i| i.recipient == *recipient && i.status == InviteStatus::Pending)
            .cloned()
            .collect();
        invites.sort_by_key(|i| i.created_at);
        Ok(invites)
    }
}

/// A store that always fails, for exercising error propagation.
#[derive(Debug)]
pub struct FailingStore;

fn offline() -> DomainError {
    DomainError::Internal("storage offline".to_owned())
}

#[async_trait]
impl ContentStore for FailingStore {
    async fn create_session(
        &self,
        _session: &Session,
        _characters: &[Character],
    ) -> Result<(), DomainError> {
        Err(offline())
    }

    async fn get_session(&self, _id: Uuid) -> Result<Option<Session>, DomainError> {
        Err(offline())
    }

    async fn update_session(&self, _session: &Session) -> Result<(), DomainError> {
        Err(offline())
    }

    async fn admit_participant(
        &self,
        _session: &Session,
        _character: &Character,
    ) -> Result<(), DomainError> {
        Err(offline())
    }

    async fn delete_session(&self, _id: Uuid) -> Result<(), DomainError> {
        Err(offline())
    }

    async fn sessions_for(
        &self,
        _participant: &ParticipantId,
    ) -> Result<Vec<Session>, DomainError> {
        Err(offline())
    }

    async fn get_character(
        &self,
        _session_id: Uuid,
        _owner: &ParticipantId,
    ) -> Result<Option<Character>, DomainError> {
        Err(offline())
    }

    async fn delete_characters_batch(
        &self,
        _session_id: Uuid,
        _limit: u32,
    ) -> Result<u64, DomainError> {
        Err(offline())
    }

    async fn append_message(&self, _message: NewMessage) -> Result<Message, DomainError> {
        Err(offline())
    }

    async fn recent_messages(
        &self,
        _session_id: Uuid,
        _limit: u32,
    ) -> Result<Vec<Message>, DomainError> {
        Err(offline())
    }

    async fn delete_message(
        &self,
        _session_id: Uuid,
        _message_id: Uuid,
    ) -> Result<(), DomainError> {
        Err(offline())
    }

    async fn delete_messages_batch(
        &self,
        _session_id: Uuid,
        _limit: u32,
    ) -> Result<u64, DomainError> {
        Err(offline())
    }

    async fn create_invite(&self, _invite: NewInvite) -> Result<Invite, DomainError> {
        Err(offline())
    }

    async fn get_invite(&self, _id: Uuid) -> Result<Option<Invite>, DomainError> {
        Err(offline())
    }

    async fn set_invite_status(
        &self,
        _id: Uuid,
        _status: InviteStatus,
    ) -> Result<(), DomainError> {
        Err(offline())
    }

    async fn pending_invites_for(
        &self,
        _recipient: &ParticipantId,
    ) -> Result<Vec<Invite>, DomainError> {
        Err(offline())
    }
}
