//! Vision extraction: read UML class diagrams with a vision LLM.
//!
//! The model is prompted for a JSON draft which `draft::parse_draft` turns
//! into raw candidates.

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use tracing::info;

use umlscan_core::{ExtractionBackend, ImageInput, RawExtraction, ScanError};

use crate::draft::parse_draft;

pub const UML_EXTRACTION_PROMPT: &str = "You are reading a photo or screenshot of a UML class diagram. \
Return ONLY a JSON object of the form \
{\"classes\":[{\"name\":\"\",\"attributes\":[\"name: type\"],\"methods\":[\"name(params): type\"],\"confidence\":0.0}],\
\"relations\":[{\"from\":\"\",\"to\":\"\",\"type\":\"association|inheritance|realization|composition|aggregation|dependency\",\
\"sourceCardinality\":\"\",\"targetCardinality\":\"\",\"confidence\":0.0}],\"confidence\":0.0}. \
Confidence values are between 0 and 1. Use the class names exactly as written. \
For inheritance, `from` is the subclass. If there is no class diagram, return {\"classes\":[],\"relations\":[],\"confidence\":0}.";

/// Supported vision providers.
pub enum VisionProvider {
    OpenAI { api_key: String, model: String },
    Gemini { api_key: String, model: String },
}

impl VisionProvider {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::OpenAI { api_key: api_key.into(), model: "gpt-4o".to_string() }
    }
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::Gemini { api_key: api_key.into(), model: "gemini-2.0-flash".to_string() }
    }

    pub fn with_model(self, model: impl Into<String>) -> Self {
        match self {
            Self::OpenAI { api_key, .. } => Self::OpenAI { api_key, model: model.into() },
            Self::Gemini { api_key, .. } => Self::Gemini { api_key, model: model.into() },
        }
    }
}

/// Describe an image from raw bytes using a vision LLM.
pub async fn describe_image(
    client: &Client,
    provider: &VisionProvider,
    image_bytes: &[u8],
    mime_type: &str,
    prompt: &str,
) -> Result<String> {
    let b64 = STANDARD.encode(image_bytes);
    match provider {
        VisionProvider::OpenAI { api_key, model } => {
            describe_via_openai(client, api_key, model, &b64, mime_type, prompt).await
        }
        VisionProvider::Gemini { api_key, model } => {
            describe_via_gemini(client, api_key, model, &b64, mime_type, prompt).await
        }
    }
}

async fn describe_via_openai(
    client: &Client, api_key: &str, model: &str, b64: &str, mime_type: &str, prompt: &str,
) -> Result<String> {
    info!("[Vision] Reading diagram via OpenAI {}", model);
    let body = serde_json::json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url",
                  "image_url": { "url": format!("data:{};base64,{}", mime_type, b64) } }
            ]
        }],
        "max_tokens": 2048,
        "temperature": 0.1
    });
    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("OpenAI vision error {}: {}", status, resp.text().await.unwrap_or_default());
    }
    let json: serde_json::Value = resp.json().await?;
    Ok(json["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string())
}

async fn describe_via_gemini(
    client: &Client, api_key: &str, model: &str, b64: &str, mime_type: &str, prompt: &str,
) -> Result<String> {
    info!("[Vision] Reading diagram via Gemini {}", model);
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        model, api_key
    );
    let body = serde_json::json!({
        "contents": [{ "parts": [
            { "text": prompt },
            { "inlineData": { "mimeType": mime_type, "data": b64 } }
        ]}],
        "generationConfig": { "temperature": 0.1, "responseMimeType": "application/json" }
    });
    let resp = client.post(&url).json(&body).send().await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("Gemini vision error {}: {}", status, resp.text().await.unwrap_or_default());
    }
    let json: serde_json::Value = resp.json().await?;
    Ok(json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("")
        .to_string())
}

/// Extraction backend backed by a vision LLM.
pub struct VisionExtractor {
    client: Client,
    provider: VisionProvider,
}

impl VisionExtractor {
    pub fn new(provider: VisionProvider) -> Self {
        Self { client: Client::new(), provider }
    }
}

#[async_trait]
impl ExtractionBackend for VisionExtractor {
    fn name(&self) -> &str {
        "vision"
    }

    async fn extract(&self, image: &ImageInput) -> Result<RawExtraction, ScanError> {
        let reply = describe_image(
            &self.client,
            &self.provider,
            &image.bytes,
            &image.mime_type,
            UML_EXTRACTION_PROMPT,
        )
        .await
        .map_err(|e| ScanError::unavailable(self.name(), format!("{e:#}")))?;

        parse_draft(&reply).map_err(|e| ScanError::malformed(self.name(), format!("{e:#}")))
    }
}
