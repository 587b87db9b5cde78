//! Session — the shared state of one running adventure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::ParticipantId;

/// One running adventure shared by a group of participants and the narrator.
///
/// Invariants:
/// - `current_turn` is always an element of `turn_order`.
/// - `members` equals the set of identifiers in `turn_order`.
/// - `turn_order` contains exactly one narrator identifier.
///
/// `version` is the optimistic-concurrency token: every store write of a
/// session is conditional on the stored version still matching and bumps it
/// by one. `turn_order`/`members` are mutated only by the membership
/// operations, `current_turn` only by the turn coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: Uuid,
    /// The participant who created the session.
    pub owner: ParticipantId,
    /// Acting order, narrator included.
    pub turn_order: Vec<ParticipantId>,
    /// Who may act right now. Set to the narrator while narration is in flight.
    pub current_turn: ParticipantId,
    /// Current narrative-state key (act index into the scene library).
    pub act: u32,
    /// Membership set; equal to the set of `turn_order` entries.
    pub members: BTreeSet<ParticipantId>,
    /// Optimistic-concurrency token, bumped on every session write.
    pub version: i64,
}

impl Session {
    /// Creates a fresh session owned by `owner`, with the narrator seated
    /// after them and the first turn theirs.
    #[must_use]
    pub fn new(id: Uuid, owner: ParticipantId) -> Self {
        let turn_order = vec![owner.clone(), ParticipantId::narrator()];
        let members = turn_order.iter().cloned().collect();
        Self {
            id,
            current_turn: owner.clone(),
            owner,
            turn_order,
            act: 1,
            members,
            version: 0,
        }
    }

    /// Whether `participant` already belongs to the session.
    #[must_use]
    pub fn is_member(&self, participant: &ParticipantId) -> bool {
        self.members.contains(participant)
    }

    /// Adds `participant` with set-union semantics. Returns `false` if they
    /// were already a member (turn order unchanged).
    pub fn add_member(&mut self, participant: ParticipantId) -> bool {
        if !self.members.insert(participant.clone()) {
            return false;
        }
        self.turn_order.push(participant);
        true
    }

    /// Real (non-narrator) participants in acting order.
    pub fn real_participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.turn_order.iter().filter(|p| !p.is_narrator())
    }

    /// The real participant who acts after `actor`, wrapping circularly over
    /// the non-narrator members of the turn order. Returns `None` when
    /// `actor` is the narrator or not in the turn order.
    #[must_use]
    pub fn next_actor_after(&self, actor: &ParticipantId) -> Option<ParticipantId> {
        let real: Vec<&ParticipantId> = self.real_participants().collect();
        let position = real.iter().position(|p| *p == actor)?;
        Some(real[(position + 1) % real.len()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    #[test]
    fn test_new_session_seats_owner_then_narrator() {
        let owner = pid("alice");
        let session = Session::new(Uuid::new_v4(), owner.clone());

        assert_eq!(session.turn_order, vec![owner.clone(), ParticipantId::narrator()]);
        assert_eq!(session.current_turn, owner);
        assert!(session.turn_order.contains(&session.current_turn));
        assert_eq!(
            session.members,
            session.turn_order.iter().cloned().collect()
        );
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let mut session = Session::new(Uuid::new_v4(), pid("alice"));

        assert!(session.add_member(pid("bob")));
        assert!(!session.add_member(pid("bob")));

        let bobs = session.turn_order.iter().filter(|p| p.as_str() == "bob").count();
        assert_eq!(bobs, 1);
    }

    #[test]
    fn test_next_actor_wraps_over_real_participants_only() {
        let mut session = Session::new(Uuid::new_v4(), pid("alice"));
        session.add_member(pid("bob"));
        // turn_order is now [alice, narrator, bob]

        assert_eq!(session.next_actor_after(&pid("alice")), Some(pid("bob")));
        assert_eq!(session.next_actor_after(&pid("bob")), Some(pid("alice")));
        assert_eq!(session.next_actor_after(&ParticipantId::narrator()), None);
    }

    #[test]
    fn test_single_player_rotation_returns_to_the_same_actor() {
        let session = Session::new(Uuid::new_v4(), pid("alice"));
        assert_eq!(session.next_actor_after(&pid("alice")), Some(pid("alice")));
    }
}
