//! Narration provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The two roles the narration protocol understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// A participant turn.
    User,
    /// A narrator turn.
    Model,
}

impl ChatRole {
    /// Stable string form, used on the provider wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One role-tagged turn of prior conversation handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Role of the turn.
    pub role: ChatRole,
    /// Turn text.
    pub text: String,
}

impl ChatTurn {
    /// A `user`-role turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    /// A `model`-role turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Generative narration step: persona + history + prompt in, text out.
/// Stateless per call, fallible, and latency-bearing — callers must treat
/// every invocation as a long suspension point.
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    /// Generates narration text.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` when the provider is unreachable or
    /// answers with a malformed response.
    async fn generate(
        &self,
        persona: &str,
        history: &[ChatTurn],
        prompt: &str,
    ) -> Result<String, DomainError>;
}
