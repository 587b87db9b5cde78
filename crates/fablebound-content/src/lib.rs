//! Fablebound Content — the read-only act/scene library.
//!
//! Narrative content is authored as Markdown: the document title is an H1,
//! each act is an H2 section, and everything under an act heading is the
//! scene text handed to the narration prompt for that act.

pub mod library;

pub use library::SceneLibrary;
