use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use umlscan_core::{DiagramAssistant, DraftRequest, RawExtraction, ScanError};

use super::{
    draft_from_reply, draft_messages, status_error, ChatMessage, DRAFT_TEMPERATURE,
    MAX_DRAFT_TOKENS,
};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const NAME: &str = "ollama";

/// Diagram assistant on a local Ollama server. `format: json` constrains
/// the reply to a single object.
pub struct OllamaAssistant {
    client: Client,
    model: String,
    base_url: String,
}

impl OllamaAssistant {
    /// Ollama tags carry no vendor prefix, so "openai/gpt-4o" becomes "gpt-4o".
    pub fn new(model: &str) -> Self {
        Self {
            client: Client::new(),
            model: model.rsplit('/').next().unwrap_or(model).to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn body(&self, messages: Vec<ChatMessage>) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "format": "json",
            "options": {
                "temperature": DRAFT_TEMPERATURE,
                "num_predict": MAX_DRAFT_TOKENS,
            },
        })
    }
}

#[derive(Deserialize)]
struct ChatReply {
    message: ChatMessage,
}

#[async_trait]
impl DiagramAssistant for OllamaAssistant {
    fn name(&self) -> &str {
        NAME
    }

    async fn draft(&self, request: &DraftRequest<'_>) -> Result<RawExtraction, ScanError> {
        let body = self.body(draft_messages(request)?);
        debug!(model = %self.model, "Requesting diagram draft from Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::unavailable(NAME, e))?;
        if !response.status().is_success() {
            return Err(status_error(NAME, response).await);
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| ScanError::malformed(NAME, e))?;
        draft_from_reply(NAME, &reply.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_loses_vendor_prefix() {
        assert_eq!(OllamaAssistant::new("meta-llama/llama3").model, "llama3");
        assert_eq!(OllamaAssistant::new("llama3").model, "llama3");
    }

    #[test]
    fn body_asks_for_json_without_streaming() {
        let assistant = OllamaAssistant::new("llama3").with_base_url("http://ollama:11434/");
        assert_eq!(assistant.base_url, "http://ollama:11434");
        let body = assistant.body(Vec::new());
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 1500);
    }
}
