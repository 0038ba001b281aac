//! `getContextualHelp`: guidance and suggestions for the diagram being edited.
//!
//! Suggestions come from three places, folded through the normalizer in
//! one pass: the classes already on the canvas (so proposed relations can
//! point at them), intents recognized in the user's message, and an
//! optional generative-AI draft. Anything already drawn is filtered out.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use umlscan_core::{
    AssistantResponse, DiagramAssistant, DiagramContext, DraftRequest, RawExtraction,
    RelationKind, ScanError, ScannedClass, ScannedRelation, Suggestions,
};
use umlscan_logging::redact_sensitive_data;
use umlscan_understanding::normalize;

use crate::locale::Locale;
use crate::synthesizer::suggestions_for;

pub const DEFAULT_ASSISTANT_TIMEOUT: Duration = Duration::from_secs(30);

/// Classes with more attributes than this get a split suggestion.
pub const MAX_ATTRIBUTES_PER_CLASS: usize = 12;

const MAX_REVIEW_TIPS: usize = 6;
const INTENT_CONFIDENCE: f32 = 0.9;

static ADD_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:add|create|new|agrega|agregar|añade|añadir|crea|crear|nueva)\s+(?:(?:a|an|the|una|la)\s+)?(?:class|clase)\s+(?:(?:called|named|llamada)\s+)?(\p{L}\w*)",
    )
    .unwrap()
});

static RELATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:relate|connect|link|relaciona|relacionar|conecta|conectar|une|unir)\s+(?:(?:the\s+)?(?:class|clase)\s+|(?:la\s+)?clase\s+)?(\p{L}\w*)\s+(?:with|to|and|con|y)\s+(?:(?:the\s+)?(?:class|clase)\s+|(?:la\s+)?clase\s+)?(\p{L}\w*)",
    )
    .unwrap()
});

static INHERIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\p{L}\w*)\s+(?:inherits\s+from|extends|hereda\s+de|extiende\s+de|extiende)\s+(\p{L}\w*)")
        .unwrap()
});

/// Class and relation requests recognized in free text.
pub fn detect_intents(message: &str) -> RawExtraction {
    let mut raw = RawExtraction::empty();

    for caps in ADD_CLASS_RE.captures_iter(message) {
        raw.classes.push(ScannedClass::new(&caps[1], INTENT_CONFIDENCE));
    }

    let relations = RELATE_RE
        .captures_iter(message)
        .map(|caps| (caps[1].to_string(), caps[2].to_string(), RelationKind::Association))
        .chain(
            INHERIT_RE
                .captures_iter(message)
                .map(|caps| (caps[1].to_string(), caps[2].to_string(), RelationKind::Inheritance)),
        );

    for (source, target, kind) in relations {
        raw.classes.push(ScannedClass::new(&source, INTENT_CONFIDENCE));
        raw.classes.push(ScannedClass::new(&target, INTENT_CONFIDENCE));
        raw.relations
            .push(ScannedRelation::new(source, target, kind, INTENT_CONFIDENCE));
    }

    if !raw.is_empty() {
        raw.confidence = INTENT_CONFIDENCE;
    }
    raw
}

/// Review notes on the diagram as drawn.
pub fn review_tips(context: &DiagramContext, locale: Locale) -> Vec<String> {
    let degrees = context.degrees();
    let mut tips = Vec::new();

    for node in &context.nodes {
        if node.attributes.is_empty() {
            tips.push(locale.class_without_attributes(&node.name));
        } else if node.attributes.len() > MAX_ATTRIBUTES_PER_CLASS {
            tips.push(locale.large_class(&node.name, node.attributes.len()));
        }
        if context.nodes.len() > 1 && degrees.get(node.id.as_str()).copied().unwrap_or(0) == 0 {
            tips.push(locale.isolated_class(&node.name));
        }
    }

    tips.truncate(MAX_REVIEW_TIPS);
    tips
}

/// Classes on the canvas as fully-certain candidates.
fn context_candidates(context: &DiagramContext) -> RawExtraction {
    RawExtraction {
        classes: context
            .nodes
            .iter()
            .map(|n| {
                ScannedClass::new(&n.name, 1.0)
                    .with_attributes(n.attributes.iter().cloned())
                    .with_methods(n.methods.iter().cloned())
            })
            .collect(),
        confidence: 1.0,
        ..RawExtraction::default()
    }
}

pub struct ContextualHelper {
    locale: Locale,
    assistant: Option<Arc<dyn DiagramAssistant>>,
    timeout: Duration,
}

impl ContextualHelper {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            assistant: None,
            timeout: DEFAULT_ASSISTANT_TIMEOUT,
        }
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn DiagramAssistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_assistant(&self) -> bool {
        self.assistant.is_some()
    }

    async fn ask_assistant(
        &self,
        assistant: &dyn DiagramAssistant,
        context: &DiagramContext,
        message: Option<&str>,
    ) -> Result<RawExtraction, ScanError> {
        let request = DraftRequest { context, message };
        let draft = tokio::time::timeout(self.timeout, assistant.draft(&request))
            .await
            .map_err(|_| ScanError::Timeout(self.timeout))??;
        debug!(
            assistant = assistant.name(),
            classes = draft.classes.len(),
            relations = draft.relations.len(),
            "Assistant drafted suggestions"
        );
        Ok(draft)
    }

    /// Build the help response. AI failures fall back to heuristics; the
    /// error is returned alongside so the caller can record it.
    pub async fn help(
        &self,
        context: &DiagramContext,
        message: Option<&str>,
    ) -> (AssistantResponse, Option<ScanError>) {
        let locale = self.locale;
        let message = message.map(str::trim).filter(|m| !m.is_empty());

        let mut raw = context_candidates(context);
        let intents = message.map(detect_intents).unwrap_or_default();
        let understood = !intents.is_empty();
        raw.absorb(intents);

        let mut failure = None;
        if let Some(assistant) = &self.assistant {
            match self.ask_assistant(assistant.as_ref(), context, message).await {
                Ok(draft) => raw.absorb(draft),
                Err(e) => {
                    warn!(
                        assistant = assistant.name(),
                        error = %redact_sensitive_data(&e.to_string()),
                        "Assistant unavailable, using heuristic suggestions"
                    );
                    failure = Some(e);
                }
            }
        }

        let suggestions: Suggestions = suggestions_for(&normalize(&raw), Some(context));

        let mut tips = review_tips(context, locale);
        if message.is_some() && !understood && suggestions.is_empty() {
            tips.push(locale.message_not_understood());
        }
        if failure.is_some() {
            tips.push(locale.assistant_unavailable_tip());
        }

        let response = if !suggestions.is_empty() {
            let text = locale.help_suggestions(suggestions.classes.len(), suggestions.relations.len());
            AssistantResponse::new(text, suggestions)
                .with_tips(tips)
                .with_next_steps(vec![locale.review_suggestions_step()])
        } else if context.nodes.is_empty() {
            tips.extend(locale.welcome_tips());
            AssistantResponse::new(locale.welcome(), suggestions)
                .with_tips(tips)
                .with_next_steps(locale.welcome_next_steps())
        } else {
            let text = locale.diagram_summary(context.nodes.len(), context.edges.len());
            AssistantResponse::new(text, suggestions).with_tips(tips)
        };

        (response, failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockAssistant;

    fn shop() -> DiagramContext {
        serde_json::from_value(serde_json::json!({
            "nodes": [
                { "id": "n1", "name": "Cliente", "attributes": ["id: int", "nombre: string"] },
                { "id": "n2", "name": "Pedido", "attributes": ["id: int"] },
                { "id": "n3", "name": "Producto" }
            ],
            "edges": [{ "id": "e1", "source": "n1", "target": "n2", "type": "association" }]
        }))
        .unwrap()
    }

    #[test]
    fn detects_add_class_in_both_languages() {
        let raw = detect_intents("Please add class Invoice");
        assert_eq!(raw.classes[0].name, "Invoice");
        let raw = detect_intents("agrega la clase Factura");
        assert_eq!(raw.classes[0].name, "Factura");
    }

    #[test]
    fn detects_relation_intents() {
        let raw = detect_intents("relaciona Pedido con Producto");
        assert_eq!(raw.relations.len(), 1);
        assert_eq!(raw.relations[0].source, "Pedido");
        assert_eq!(raw.relations[0].target, "Producto");
        assert_eq!(raw.relations[0].kind, RelationKind::Association);

        let raw = detect_intents("Admin extends User");
        assert_eq!(raw.relations[0].kind, RelationKind::Inheritance);
    }

    #[test]
    fn unrelated_text_has_no_intent() {
        assert!(detect_intents("how are you?").is_empty());
    }

    #[test]
    fn review_flags_empty_isolated_and_large_classes() {
        let mut context = shop();
        context.nodes[1].attributes = (0..13).map(|i| format!("a{i}: int")).collect();
        let tips = review_tips(&context, Locale::En);
        assert!(tips.iter().any(|t| t.contains("Producto has no attributes")));
        assert!(tips.iter().any(|t| t.contains("Producto is not connected")));
        assert!(tips.iter().any(|t| t.contains("Pedido has 13 attributes")));
        assert!(!tips.iter().any(|t| t.contains("Cliente")));
    }

    #[test]
    fn name_keyed_edges_count_as_connections() {
        let context: DiagramContext = serde_json::from_value(serde_json::json!({
            "nodes": [
                { "id": "n1", "name": "Cliente", "attributes": ["id: int"] },
                { "id": "n2", "name": "Pedido", "attributes": ["id: int"] }
            ],
            "edges": [{ "id": "e1", "source": "Cliente", "target": "Pedido" }]
        }))
        .unwrap();
        let tips = review_tips(&context, Locale::En);
        assert!(!tips.iter().any(|t| t.contains("not connected")));
    }

    #[tokio::test]
    async fn empty_diagram_gets_started() {
        let helper = ContextualHelper::new(Locale::En);
        let (response, failure) = helper.help(&DiagramContext::default(), None).await;
        assert!(failure.is_none());
        assert!(response.message.contains("empty"));
        assert!(response.suggestions.is_empty());
        assert!(response.tips.is_some());
        assert!(response.next_steps.is_some());
    }

    #[tokio::test]
    async fn relation_to_existing_class_is_proposed() {
        let helper = ContextualHelper::new(Locale::Es);
        let (response, _) = helper
            .help(&shop(), Some("relaciona Pedido con Producto"))
            .await;
        assert!(response.suggestions.classes.is_empty());
        assert_eq!(response.suggestions.relations.len(), 1);
        assert_eq!(response.suggestions.relations[0].source, "Pedido");
    }

    #[tokio::test]
    async fn existing_relation_is_not_reproposed() {
        let helper = ContextualHelper::new(Locale::En);
        let (response, _) = helper.help(&shop(), Some("connect Cliente with Pedido")).await;
        assert!(response.suggestions.is_empty());
        assert!(response.message.contains("3 classes"));
    }

    #[tokio::test]
    async fn assistant_draft_is_filtered_against_context() {
        let assistant = Arc::new(MockAssistant::new("mock").with_reply(
            r#"{"classes":[{"name":"Cliente"},{"name":"Factura","attributes":["total: float"]}],
                "relations":[{"from":"Factura","to":"Pedido","type":"association"}]}"#,
        ));
        let helper = ContextualHelper::new(Locale::En).with_assistant(assistant.clone());
        let (response, failure) = helper.help(&shop(), None).await;
        assert_eq!(assistant.calls(), 1);
        assert!(failure.is_none());
        let names: Vec<_> = response.suggestions.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Factura"]);
        assert_eq!(response.suggestions.relations.len(), 1);
    }

    #[tokio::test]
    async fn assistant_failure_falls_back_to_heuristics() {
        let assistant = Arc::new(MockAssistant::new("mock").failing("connection refused"));
        let helper = ContextualHelper::new(Locale::En).with_assistant(assistant);
        let (response, failure) = helper.help(&shop(), Some("add class Invoice")).await;
        assert!(matches!(failure, Some(ScanError::BackendUnavailable { .. })));
        assert_eq!(response.suggestions.classes[0].name, "Invoice");
        assert!(response
            .tips
            .unwrap()
            .iter()
            .any(|t| t.contains("AI assistant")));
    }

    #[tokio::test]
    async fn slow_assistant_times_out() {
        let assistant = Arc::new(
            MockAssistant::new("mock")
                .with_reply("{}")
                .with_delay(Duration::from_millis(200)),
        );
        let helper = ContextualHelper::new(Locale::En)
            .with_assistant(assistant)
            .with_timeout(Duration::from_millis(20));
        let (_, failure) = helper.help(&shop(), None).await;
        assert!(matches!(failure, Some(ScanError::Timeout(_))));
    }
}
