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

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const NAME: &str = "openrouter";

/// Diagram assistant on OpenRouter's chat-completions API, in JSON mode.
pub struct OpenRouterAssistant {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    referer: Option<String>,
}

impl OpenRouterAssistant {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            referer: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Site URL reported to OpenRouter for attribution.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    fn body(&self, messages: Vec<ChatMessage>) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": MAX_DRAFT_TOKENS,
            "temperature": DRAFT_TEMPERATURE,
            "response_format": { "type": "json_object" },
        })
    }
}

#[derive(Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[async_trait]
impl DiagramAssistant for OpenRouterAssistant {
    fn name(&self) -> &str {
        NAME
    }

    async fn draft(&self, request: &DraftRequest<'_>) -> Result<RawExtraction, ScanError> {
        let body = self.body(draft_messages(request)?);
        debug!(model = %self.model, "Requesting diagram draft from OpenRouter");

        let mut http = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-Title", "umlscan")
            .json(&body);
        if let Some(referer) = &self.referer {
            http = http.header("HTTP-Referer", referer);
        }

        let response = http
            .send()
            .await
            .map_err(|e| ScanError::unavailable(NAME, e))?;
        if !response.status().is_success() {
            return Err(status_error(NAME, response).await);
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|e| ScanError::malformed(NAME, e))?;
        let Some(choice) = completion.choices.into_iter().next() else {
            return Ok(RawExtraction::empty());
        };
        draft_from_reply(NAME, &choice.message.content)
    }
}
