//! Prompt assembly for the narration provider.

use fablebound_core::character::Character;

/// The fixed system persona sent with every narration call.
pub const MASTER_PERSONA: &str = "\
You are the Master, the narrator of a cooperative tabletop adventure. \
Narrate the consequences of each player's action in vivid second person, \
two to four paragraphs, staying true to the scene you are given. Never \
speak for the players, never resolve more than the action you were handed, \
and always end at a moment that invites the next player to act.";

/// One-line identity and capability summary of the acting character, so the
/// provider knows who is acting and what they are built for.
#[must_use]
pub fn character_summary(character: &Character) -> String {
    let a = &character.attributes;
    format!(
        "{} (Might {}, Agility {}, Wits {}, Heart {})",
        character.name, a.might, a.agility, a.wits, a.heart
    )
}

/// Assembles the per-turn prompt from the current act's scene text, the
/// acting character, and the literal action text.
#[must_use]
pub fn assemble(scene_text: &str, character: &Character, action: &str) -> String {
    format!(
        "Scene:\n{scene_text}\n\nActing character: {}\n\nAction:\n{action}",
        character_summary(character)
    )
}

#[cfg(test)]
mod tests {
    use fablebound_core::character::AttributeSet;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_prompt_carries_scene_character_and_action() {
        let character = Character {
            session_id: Uuid::new_v4(),
            owner: "alice".into(),
            name: "Elyra".to_owned(),
            attributes: AttributeSet {
                might: 2,
                agility: 4,
                wits: 3,
                heart: 1,
            },
            is_narrator: false,
        };

        let prompt = assemble("A locked gate.", &character, "I pick the lock.");

        assert!(prompt.contains("A locked gate."));
        assert!(prompt.contains("Elyra (Might 2, Agility 4, Wits 3, Heart 1)"));
        assert!(prompt.ends_with("I pick the lock."));
    }
}
