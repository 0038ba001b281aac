//! The single entry point for scan and help requests.
//!
//! Every request ends in one of three terminal states and always yields a
//! well-formed `AssistantResponse`. This is the only place where
//! `ScanError` is collapsed into user-facing text.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use umlscan_core::{
    AssistantResponse, DiagramAssistant, DiagramContext, FailureClass, ImageInput, ScanError,
    Suggestions,
};
use umlscan_logging::{redact_sensitive_data, EventLogger, PipelineEvent};
use umlscan_understanding::DiagramScanner;

use crate::cardinality::{suggest_cardinality, CardinalityRequest, CardinalitySuggestion};
use crate::help::ContextualHelper;
use crate::locale::Locale;
use crate::synthesizer::Synthesizer;

/// A fresh scan. The image was validated at the transport boundary; a
/// rejected upload carries its input error here instead.
#[derive(Debug)]
pub struct ScanRequest {
    pub image: Result<ImageInput, ScanError>,
    pub context: Option<DiagramContext>,
}

impl ScanRequest {
    pub fn new(image: ImageInput) -> Self {
        Self {
            image: Ok(image),
            context: None,
        }
    }

    pub fn rejected(error: ScanError) -> Self {
        Self {
            image: Err(error),
            context: None,
        }
    }

    pub fn with_context(mut self, context: DiagramContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<Result<ImageInput, ScanError>> for ScanRequest {
    fn from(image: Result<ImageInput, ScanError>) -> Self {
        Self {
            image,
            context: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualHelpRequest {
    #[serde(default)]
    pub context: DiagramContext,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum AssistantRequest {
    Scan(ScanRequest),
    ContextualHelp(ContextualHelpRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Suggested,
    Degraded,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: TerminalState,
    pub response: AssistantResponse,
}

fn failure_label(error: &ScanError) -> &'static str {
    match error {
        ScanError::NoImage => "no_image",
        ScanError::UnsupportedMediaType(_) => "unsupported_media_type",
        ScanError::ImageTooLarge { .. } => "image_too_large",
        ScanError::InvalidUpload(_) => "invalid_upload",
        ScanError::BackendUnavailable { .. } => "backend_unavailable",
        ScanError::MalformedResponse { .. } => "malformed_response",
        ScanError::Timeout(_) => "timeout",
        ScanError::Other(_) => "internal",
    }
}

pub struct ResponseBuilder {
    scanner: DiagramScanner,
    synthesizer: Synthesizer,
    helper: ContextualHelper,
}

impl ResponseBuilder {
    pub fn new(scanner: DiagramScanner, locale: Locale) -> Self {
        Self {
            scanner,
            synthesizer: Synthesizer::new(locale),
            helper: ContextualHelper::new(locale),
        }
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn DiagramAssistant>) -> Self {
        self.helper = self.helper.with_assistant(assistant);
        self
    }

    pub fn with_assistant_timeout(mut self, timeout: Duration) -> Self {
        self.helper = self.helper.with_timeout(timeout);
        self
    }

    pub fn locale(&self) -> Locale {
        self.synthesizer.locale()
    }

    pub fn scanner(&self) -> &DiagramScanner {
        &self.scanner
    }

    pub fn has_assistant(&self) -> bool {
        self.helper.has_assistant()
    }

    pub async fn respond(&self, request: AssistantRequest) -> Outcome {
        match request {
            AssistantRequest::Scan(scan) => self.scan(scan).await,
            AssistantRequest::ContextualHelp(help) => self.contextual_help(help).await,
        }
    }

    pub async fn scan(&self, request: ScanRequest) -> Outcome {
        let ScanRequest { image, context } = request;
        let result = match image {
            Ok(image) => self.scanner.scan_diagram_image(&image).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => {
                let response = self
                    .synthesizer
                    .convert_scan_to_suggestions(&result, context.as_ref());
                EventLogger::log_event(PipelineEvent::Suggested {
                    class_count: response.suggestions.classes.len(),
                    relation_count: response.suggestions.relations.len(),
                    confidence: result.confidence,
                    discarded: result.discarded,
                    merged: result.merged,
                    assistant_failure: None,
                });
                Outcome {
                    state: TerminalState::Suggested,
                    response,
                }
            }
            Err(e) => self.failed(e),
        }
    }

    pub async fn contextual_help(&self, request: ContextualHelpRequest) -> Outcome {
        let (response, failure) = self
            .helper
            .help(&request.context, request.message.as_deref())
            .await;

        // Degraded only when nothing usable came back; heuristic suggestions
        // that survived an AI failure are still a suggested outcome.
        let state = match failure {
            Some(e) if response.suggestions.is_empty() => {
                EventLogger::log_event(PipelineEvent::Degraded {
                    failure: failure_label(&e).to_string(),
                    detail: e.to_string(),
                });
                TerminalState::Degraded
            }
            failure => {
                EventLogger::log_event(PipelineEvent::Suggested {
                    class_count: response.suggestions.classes.len(),
                    relation_count: response.suggestions.relations.len(),
                    confidence: 1.0,
                    discarded: 0,
                    merged: 0,
                    assistant_failure: failure.map(|e| failure_label(&e).to_string()),
                });
                TerminalState::Suggested
            }
        };
        Outcome { state, response }
    }

    pub fn suggest_cardinality(&self, request: &CardinalityRequest) -> CardinalitySuggestion {
        suggest_cardinality(request, self.locale())
    }

    fn failed(&self, error: ScanError) -> Outcome {
        let locale = self.locale();
        match error.class() {
            FailureClass::Input => {
                info!(reason = failure_label(&error), "Scan request rejected before extraction");
                EventLogger::log_event(PipelineEvent::Empty {
                    reason: error.to_string(),
                });
                Outcome {
                    state: TerminalState::Empty,
                    response: AssistantResponse::new(
                        locale.input_rejected(&error),
                        Suggestions::default(),
                    )
                    .with_tips(locale.input_tips())
                    .with_next_steps(locale.input_next_steps()),
                }
            }
            FailureClass::Backend => {
                let detail = redact_sensitive_data(&format!("{error:#}"));
                warn!(failure = failure_label(&error), error = %detail, "Scan degraded");
                EventLogger::log_event(PipelineEvent::Degraded {
                    failure: failure_label(&error).to_string(),
                    detail,
                });

                let mut tips = locale.image_tips();
                if matches!(
                    error,
                    ScanError::Timeout(_) | ScanError::BackendUnavailable { .. }
                ) {
                    tips.push(locale.retry_later_tip());
                }
                Outcome {
                    state: TerminalState::Degraded,
                    response: AssistantResponse::new(
                        locale.backend_failure(&error),
                        Suggestions::default(),
                    )
                    .with_tips(tips)
                    .with_next_steps(locale.image_next_steps()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umlscan_core::{RawExtraction, RelationKind, ScannedClass, ScannedRelation};
    use umlscan_understanding::mock::MockExtractor;

    use crate::providers::MockAssistant;

    fn png() -> ImageInput {
        ImageInput::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png")
    }

    fn builder(backend: Arc<MockExtractor>) -> ResponseBuilder {
        ResponseBuilder::new(DiagramScanner::new(backend), Locale::Es)
    }

    fn detected() -> RawExtraction {
        RawExtraction {
            classes: vec![
                ScannedClass::new("User", 0.9).with_attributes(["id: int"]),
                ScannedClass::new("Order", 0.8),
            ],
            relations: vec![ScannedRelation::new(
                "Order",
                "User",
                RelationKind::Association,
                0.8,
            )],
            confidence: 0.85,
            ..RawExtraction::default()
        }
    }

    #[tokio::test]
    async fn backend_failure_degrades_gracefully() {
        let backend = Arc::new(MockExtractor::failing("connection refused"));
        let outcome = builder(backend.clone()).scan(ScanRequest::new(png())).await;

        assert_eq!(outcome.state, TerminalState::Degraded);
        assert!(outcome.response.suggestions.classes.is_empty());
        assert!(outcome.response.suggestions.relations.is_empty());
        assert!(!outcome.response.message.is_empty());
        assert!(!outcome.response.tips.unwrap().is_empty());
        assert!(!outcome.response.message.contains("connection refused"));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn missing_file_never_reaches_backend() {
        let backend = Arc::new(MockExtractor::returning(detected()));
        let outcome = builder(backend.clone())
            .scan(ScanRequest::rejected(ScanError::NoImage))
            .await;

        assert_eq!(outcome.state, TerminalState::Empty);
        assert_eq!(
            outcome.response.message,
            "❌ No se proporcionó ningún archivo de imagen"
        );
        assert_eq!(
            outcome.response.tips,
            Some(vec!["Por favor, selecciona un archivo de imagen válido".to_string()])
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn empty_buffer_is_treated_as_no_file() {
        let backend = Arc::new(MockExtractor::returning(detected()));
        let outcome = builder(backend.clone())
            .scan(ScanRequest::new(ImageInput::new(Vec::new(), "image/png")))
            .await;
        assert_eq!(outcome.state, TerminalState::Empty);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_type_is_an_input_error() {
        let backend = Arc::new(MockExtractor::returning(detected()));
        let outcome = builder(backend.clone())
            .scan(ScanRequest::rejected(ScanError::UnsupportedMediaType(
                "application/pdf".into(),
            )))
            .await;
        assert_eq!(outcome.state, TerminalState::Empty);
        assert!(outcome.response.message.contains("PNG"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn scan_filters_against_open_diagram() {
        let backend = Arc::new(MockExtractor::returning(detected()));
        let context: DiagramContext = serde_json::from_value(serde_json::json!({
            "nodes": [{ "id": "n1", "name": "User" }]
        }))
        .unwrap();
        let outcome = builder(backend)
            .scan(ScanRequest::new(png()).with_context(context))
            .await;

        assert_eq!(outcome.state, TerminalState::Suggested);
        let names: Vec<_> = outcome
            .response
            .suggestions
            .classes
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Order"]);
        assert_eq!(outcome.response.suggestions.relations.len(), 1);
    }

    #[tokio::test]
    async fn nothing_detected_is_suggested_with_guidance() {
        let backend = Arc::new(MockExtractor::returning(RawExtraction::empty()));
        let outcome = builder(backend).scan(ScanRequest::new(png())).await;
        assert_eq!(outcome.state, TerminalState::Suggested);
        assert!(outcome.response.suggestions.is_empty());
        assert!(outcome.response.next_steps.is_some());
    }

    #[tokio::test]
    async fn timeout_degrades_with_retry_tip() {
        let backend = Arc::new(
            MockExtractor::returning(detected()).with_delay(Duration::from_millis(200)),
        );
        let scanner = DiagramScanner::new(backend).with_timeout(Duration::from_millis(20));
        let outcome = ResponseBuilder::new(scanner, Locale::En)
            .scan(ScanRequest::new(png()))
            .await;
        assert_eq!(outcome.state, TerminalState::Degraded);
        assert!(outcome.response.message.contains("too long"));
        assert!(outcome
            .response
            .tips
            .unwrap()
            .iter()
            .any(|t| t.contains("few minutes")));
    }

    #[tokio::test]
    async fn malformed_reply_degrades() {
        let backend = Arc::new(MockExtractor::malformed("not json"));
        let outcome = builder(backend).scan(ScanRequest::new(png())).await;
        assert_eq!(outcome.state, TerminalState::Degraded);
        assert!(outcome.response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn respond_routes_help_requests() {
        let backend = Arc::new(MockExtractor::returning(detected()));
        let outcome = builder(backend.clone())
            .respond(AssistantRequest::ContextualHelp(ContextualHelpRequest {
                context: DiagramContext::default(),
                message: Some("agrega la clase Factura".into()),
            }))
            .await;
        assert_eq!(outcome.state, TerminalState::Suggested);
        assert_eq!(outcome.response.suggestions.classes[0].name, "Factura");
        assert_eq!(backend.calls(), 0);
    }

    fn help(message: Option<&str>) -> ContextualHelpRequest {
        ContextualHelpRequest {
            context: DiagramContext::default(),
            message: message.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn heuristics_surviving_assistant_failure_are_suggested() {
        let assistant = Arc::new(MockAssistant::new("mock").failing("connection refused"));
        let builder = builder(Arc::new(MockExtractor::returning(detected())))
            .with_assistant(assistant.clone());
        let outcome = builder.contextual_help(help(Some("add class Invoice"))).await;

        assert_eq!(outcome.state, TerminalState::Suggested);
        assert_eq!(outcome.response.suggestions.classes[0].name, "Invoice");
        assert!(outcome
            .response
            .tips
            .unwrap()
            .iter()
            .any(|t| t.contains("asistente de IA")));
        assert_eq!(assistant.calls(), 1);
    }

    #[tokio::test]
    async fn degraded_help_never_carries_suggestions() {
        let builder = builder(Arc::new(MockExtractor::returning(detected())))
            .with_assistant(Arc::new(MockAssistant::new("mock").failing("connection refused")));

        let outcome = builder.contextual_help(help(None)).await;
        assert_eq!(outcome.state, TerminalState::Degraded);

        for message in [None, Some("add class Invoice"), Some("hola"), Some("Admin extends User")] {
            let outcome = builder.contextual_help(help(message)).await;
            if outcome.state == TerminalState::Degraded {
                assert!(outcome.response.suggestions.is_empty(), "{message:?}");
            }
        }
    }

    #[test]
    fn help_request_accepts_missing_fields() {
        let request: ContextualHelpRequest = serde_json::from_str("{}").unwrap();
        assert!(request.context.is_empty());
        assert!(request.message.is_none());
    }
}
