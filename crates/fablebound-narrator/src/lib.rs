//! Fablebound Narrator — HTTP narration provider.
//!
//! Talks to a `generateContent`-style REST endpoint. The conversation
//! window is sent as alternating user/model turns, the narrator persona
//! as the system instruction, and the acting prompt as the final user
//! turn.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use fablebound_core::error::DomainError;
use fablebound_core::narration::{ChatTurn, NarrationProvider};

/// Generation can take a while for long scenes; keep the timeout generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Narration provider backed by a remote generative model.
#[derive(Debug, Clone)]
pub struct HttpNarrator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpNarrator {
    /// Creates a narrator against `base_url` (e.g.
    /// `https://generativelanguage.googleapis.com`).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| DomainError::Internal(error.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    parts: Option<Vec<PartResponse>>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

fn build_request(persona: &str, history: &[ChatTurn], prompt: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| Content {
            role: Some(turn.role.as_str()),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .collect();
    contents.push(Content {
        role: Some("user"),
        parts: vec![Part {
            text: prompt.to_owned(),
        }],
    });

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part {
                text: persona.to_owned(),
            }],
        }),
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, DomainError> {
    let parts = response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                Some(candidates.swap_remove(0))
            }
        })
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .ok_or_else(|| {
            DomainError::Internal("narration response contained no candidates".to_owned())
        })?;

    let text: String = parts.into_iter().filter_map(|part| part.text).collect();
    if text.is_empty() {
        return Err(DomainError::Internal(
            "narration response contained no text".to_owned(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl NarrationProvider for HttpNarrator {
    #[instrument(skip_all, fields(model = %self.model, history_len = history.len()))]
    async fn generate(
        &self,
        persona: &str,
        history: &[ChatTurn],
        prompt: &str,
    ) -> Result<String, DomainError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = build_request(persona, history, prompt);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                warn!(%error, "narration request failed");
                DomainError::Internal(format!("narration request failed: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "narration request rejected");
            return Err(DomainError::Internal(format!(
                "narration provider returned {status}: {body}"
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|error| {
            DomainError::Internal(format!("unreadable narration response: {error}"))
        })?;
        let text = extract_text(parsed)?;
        debug!(chars = text.len(), "narration generated");
        Ok(text)
    }
}
