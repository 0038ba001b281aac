use async_trait::async_trait;

use crate::context::DiagramContext;
use crate::error::ScanError;
use crate::types::RawExtraction;

/// A validated image ready for extraction.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Vision/OCR service turning an image into raw diagram candidates.
///
/// "Nothing detected" is an empty `RawExtraction`, not an error. Only
/// infrastructure faults (unreachable service, unparseable reply) are `Err`.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Backend name used in logs (e.g., "vision", "ocr").
    fn name(&self) -> &str;

    async fn extract(&self, image: &ImageInput) -> Result<RawExtraction, ScanError>;
}

/// The diagram open in the editor plus the user's request, if any.
#[derive(Debug, Clone, Copy)]
pub struct DraftRequest<'a> {
    pub context: &'a DiagramContext,
    pub message: Option<&'a str>,
}

/// Generative-AI service proposing additions to an open diagram.
///
/// Implementations own their prompt and wire format and hand back raw
/// candidates for the normalizer, like an `ExtractionBackend` does.
#[async_trait]
pub trait DiagramAssistant: Send + Sync {
    /// Provider name used in logs (e.g., "openrouter", "ollama").
    fn name(&self) -> &str;

    async fn draft(&self, request: &DraftRequest<'_>) -> Result<RawExtraction, ScanError>;
}
