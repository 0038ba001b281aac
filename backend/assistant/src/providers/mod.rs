//! Generative-AI assistants for contextual help.
//!
//! Each provider speaks its own chat API in JSON mode. The prompt and the
//! reply parsing live here so every provider returns the same draft shape.

pub mod mock;
pub mod ollama;
pub mod openrouter;

pub use mock::MockAssistant;
pub use ollama::OllamaAssistant;
pub use openrouter::OpenRouterAssistant;

use serde::{Deserialize, Serialize};

use umlscan_core::{DraftRequest, RawExtraction, ScanError};
use umlscan_understanding::parse_draft;

const SYSTEM_PROMPT: &str = "You are a UML class diagram assistant. \
You receive the current diagram as JSON and an optional request from the user. \
Propose classes and relations that improve the model. Reply ONLY with a JSON object \
{\"classes\":[{\"name\":\"\",\"attributes\":[\"name: type\"],\"methods\":[\"name(): type\"]}],\
\"relations\":[{\"from\":\"\",\"to\":\"\",\"type\":\"association|inheritance|realization|composition|aggregation|dependency\",\
\"sourceCardinality\":\"\",\"targetCardinality\":\"\"}]}. \
Do not repeat classes or relations that already exist.";

const REVIEW_REQUEST: &str = "Review the diagram and suggest improvements.";

pub(crate) const MAX_DRAFT_TOKENS: u32 = 1500;
pub(crate) const DRAFT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// System and user turns for a draft request.
pub(crate) fn draft_messages(request: &DraftRequest<'_>) -> Result<Vec<ChatMessage>, ScanError> {
    let diagram = serde_json::to_string(request.context).map_err(|e| ScanError::Other(e.into()))?;
    Ok(vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!(
                "Diagram:\n{diagram}\n\nRequest:\n{}",
                request.message.unwrap_or(REVIEW_REQUEST)
            ),
        },
    ])
}

/// Turn a chat reply into candidates. Reply text that is not a draft is a
/// malformed response from `provider`.
pub(crate) fn draft_from_reply(provider: &str, content: &str) -> Result<RawExtraction, ScanError> {
    parse_draft(content).map_err(|e| ScanError::malformed(provider, format!("{e:#}")))
}

/// Read a non-success HTTP reply into an unavailable-backend error.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> ScanError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ScanError::unavailable(provider, format!("HTTP {status}: {body}"))
}
