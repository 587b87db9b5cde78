//! Scene library — Markdown campaign parsing and act lookup.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Scene text used when a session points at an act the campaign does not
/// define. Keeps the narration prompt well-formed instead of failing a turn
/// over missing content.
const FALLBACK_SCENE: &str =
    "The party stands at an unwritten chapter of the tale. Improvise the scene.";

/// One act of a campaign.
#[derive(Debug, Clone)]
pub struct Act {
    /// Heading of the act as authored.
    pub title: String,
    /// Scene text handed to the narration prompt.
    pub text: String,
}

/// A read-only lookup table from act index to scene text.
#[derive(Debug, Clone)]
pub struct SceneLibrary {
    title: String,
    acts: Vec<Act>,
}

impl SceneLibrary {
    /// The campaign shipped with the engine.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_markdown(include_str!("default_campaign.md"))
    }

    /// Parses a campaign document. The H1 becomes the campaign title; each
    /// H2 opens an act whose body text becomes the scene text.
    #[must_use]
    pub fn from_markdown(source: &str) -> Self {
        let mut title = String::new();
        let mut acts: Vec<Act> = Vec::new();
        let mut heading: Option<HeadingLevel> = None;

        for event in Parser::new(source) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading = Some(level);
                    if level == HeadingLevel::H2 {
                        acts.push(Act {
                            title: String::new(),
                            text: String::new(),
                        });
                    }
                }
                Event::End(TagEnd::Heading(_)) => heading = None,
                Event::Text(text) => match heading {
                    Some(HeadingLevel::H1) => title.push_str(&text),
                    Some(HeadingLevel::H2) => {
                        if let Some(act) = acts.last_mut() {
                            act.title.push_str(&text);
                        }
                    }
                    Some(_) | None => {
                        if let Some(act) = acts.last_mut() {
                            if !act.text.is_empty() && !act.text.ends_with('\n') {
                                act.text.push(' ');
                            }
                            act.text.push_str(&text);
                        }
                    }
                },
                Event::End(TagEnd::Paragraph) => {
                    if let Some(act) = acts.last_mut() {
                        act.text.push('\n');
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(act) = acts.last_mut() {
                        act.text.push(' ');
                    }
                }
                _ => {}
            }
        }

        for act in &mut acts {
            act.text = act.text.trim().to_owned();
        }
        tracing::debug!(campaign = %title, acts = acts.len(), "scene library loaded");

        Self { title, acts }
    }

    /// Campaign title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of acts.
    #[must_use]
    pub fn act_count(&self) -> usize {
        self.acts.len()
    }

    /// Scene text for a 1-based act index, or fallback text when the act is
    /// not authored.
    #[must_use]
    pub fn scene_text(&self, act: u32) -> &str {
        usize::try_from(act)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| self.acts.get(n))
            .map_or(FALLBACK_SCENE, |act| act.text.as_str())
    }
}
