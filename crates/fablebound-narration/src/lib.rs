//! Fablebound Narration — turn coordination and narration orchestration.
//!
//! This is the engine core: the history builder that windows the message
//! log into a provider-valid context, the turn coordinator that claims,
//! narrates, rotates, and recovers, and the orchestrator that drives both
//! from message-created events.

pub mod history;
pub mod orchestrator;
pub mod prompt;
pub mod turn;
