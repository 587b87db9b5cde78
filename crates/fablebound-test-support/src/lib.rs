//! Shared deterministic fakes for the Fablebound engine.

mod clock;
mod identity;
mod narrator;
mod store;

pub use clock::FixedClock;
pub use identity::StaticIdentities;
pub use narrator::{EmptyNarrator, FailingNarrator, RecordedCall, ScriptedNarrator};
pub use store::{FailingStore, MemoryStore};
