//! Test narrators — deterministic `NarrationProvider` implementations.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use fablebound_core::error::DomainError;
use fablebound_core::narration::{ChatTurn, NarrationProvider};

/// One recorded `generate` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The persona the provider was given.
    pub persona: String,
    /// The history the provider was given.
    pub history: Vec<ChatTurn>,
    /// The prompt the provider was given.
    pub prompt: String,
}

/// A narrator that records every call and answers from a scripted queue of
/// responses, falling back to a stock line once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedNarrator {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedNarrator {
    /// A narrator scripted with the given responses, in order.
    #[must_use]
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| (*s).to_owned()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every call made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrationProvider for ScriptedNarrator {
    async fn generate(
        &self,
        persona: &str,
        history: &[ChatTurn],
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.calls.lock().unwrap().push(RecordedCall {
            persona: persona.to_owned(),
            history: history.to_vec(),
            prompt: prompt.to_owned(),
        });
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "The story continues.".to_owned()))
    }
}

/// A narrator that always fails, for exercising the recovery path.
#[derive(Debug)]
pub struct FailingNarrator;

#[async_trait]
impl NarrationProvider for FailingNarrator {
    async fn generate(
        &self,
        _persona: &str,
        _history: &[ChatTurn],
        _prompt: &str,
    ) -> Result<String, DomainError> {
        Err(DomainError::Internal(
            "narration provider unavailable".to_owned(),
        ))
    }
}

/// A narrator that answers with whitespace only, for exercising the
/// empty-generation check.
#[derive(Debug)]
pub struct EmptyNarrator;

#[async_trait]
impl NarrationProvider for EmptyNarrator {
    async fn generate(
        &self,
        _persona: &str,
        _history: &[ChatTurn],
        _prompt: &str,
    ) -> Result<String, DomainError> {
        Ok("   \n".to_owned())
    }
}
