//! Suggestion synthesis: scan result (plus the open diagram) to response.

use std::collections::HashMap;

use umlscan_core::{
    canonical_name, AssistantResponse, DiagramContext, DiagramScanResult, Suggestions,
};

use crate::locale::Locale;

pub const HIGH_CONFIDENCE: f32 = 0.7;
pub const LOW_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn of(result: &DiagramScanResult) -> Self {
        if result.classes.is_empty() || result.confidence < LOW_CONFIDENCE {
            Self::Low
        } else if result.confidence >= HIGH_CONFIDENCE {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// Candidates worth proposing: anything not already in the open diagram.
///
/// Classes keep their first-seen order. Relations whose endpoints are not
/// classes of `result` are dropped; the rest are grouped by source class in
/// class order.
pub fn suggestions_for(result: &DiagramScanResult, context: Option<&DiagramContext>) -> Suggestions {
    let index = context.map(DiagramContext::index).unwrap_or_default();

    let order: HashMap<String, usize> = result
        .classes
        .iter()
        .enumerate()
        .map(|(i, c)| (canonical_name(&c.name), i))
        .collect();

    let classes = result
        .classes
        .iter()
        .filter(|c| !index.has_class(&c.name))
        .cloned()
        .collect();

    let mut relations: Vec<_> = result
        .relations
        .iter()
        .filter_map(|r| {
            let source = *order.get(&canonical_name(&r.source))?;
            order.get(&canonical_name(&r.target))?;
            (!index.has_edge(&r.source, &r.target, r.kind)).then(|| (source, r.clone()))
        })
        .collect();
    relations.sort_by_key(|(source, _)| *source);

    Suggestions {
        classes,
        relations: relations.into_iter().map(|(_, r)| r).collect(),
    }
}

pub struct Synthesizer {
    locale: Locale,
}

impl Synthesizer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// `convertScanToSuggestions`. Never fails; low-confidence results still
    /// carry whatever was detected.
    pub fn convert_scan_to_suggestions(
        &self,
        result: &DiagramScanResult,
        context: Option<&DiagramContext>,
    ) -> AssistantResponse {
        let locale = self.locale;
        let suggestions = suggestions_for(result, context);
        let class_count = suggestions.classes.len();
        let relation_count = suggestions.relations.len();

        match ConfidenceTier::of(result) {
            ConfidenceTier::Low => {
                AssistantResponse::new(locale.scan_failed(result.classes.len()), suggestions)
                    .with_tips(locale.image_tips())
                    .with_next_steps(locale.image_next_steps())
            }
            _ if suggestions.is_empty() => {
                AssistantResponse::new(locale.scan_already_present(), suggestions)
            }
            ConfidenceTier::High => AssistantResponse::new(
                locale.scan_success(class_count, relation_count, result.confidence),
                suggestions,
            ),
            ConfidenceTier::Medium => AssistantResponse::new(
                locale.scan_partial(class_count, relation_count, result.confidence),
                suggestions,
            )
            .with_tips(locale.caution_tips()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umlscan_core::{RelationKind, ScannedClass, ScannedRelation};

    fn result(confidence: f32) -> DiagramScanResult {
        DiagramScanResult {
            classes: vec![
                ScannedClass::new("Order", confidence),
                ScannedClass::new("User", confidence),
                ScannedClass::new("Invoice", confidence),
            ],
            relations: vec![
                ScannedRelation::new("User", "Order", RelationKind::Association, confidence),
                ScannedRelation::new("Order", "User", RelationKind::Association, confidence),
                ScannedRelation::new("Invoice", "Order", RelationKind::Composition, confidence),
                ScannedRelation::new("Order", "Invoice", RelationKind::Dependency, confidence),
            ],
            confidence,
            discarded: 0,
            merged: 0,
        }
    }

    fn context_with_user() -> DiagramContext {
        serde_json::from_value(serde_json::json!({
            "nodes": [{ "id": "n1", "name": "user" }, { "id": "n2", "name": "Order" }],
            "edges": [{ "id": "e1", "source": "n1", "target": "n2", "type": "association" }]
        }))
        .unwrap()
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(ConfidenceTier::of(&result(0.7)), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::of(&result(0.5)), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::of(&result(0.29)), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::of(&DiagramScanResult::default()), ConfidenceTier::Low);
    }

    #[test]
    fn existing_user_is_not_proposed() {
        let context = context_with_user();
        let suggestions = suggestions_for(&result(0.9), Some(&context));
        let names: Vec<_> = suggestions.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Invoice"]);
        // User -> Order association already drawn; the reverse edge is new.
        assert!(!suggestions
            .relations
            .iter()
            .any(|r| r.source == "User" && r.target == "Order"));
        assert!(suggestions
            .relations
            .iter()
            .any(|r| r.source == "Order" && r.target == "User"));
    }

    #[test]
    fn relations_grouped_by_source_class_order() {
        let suggestions = suggestions_for(&result(0.9), None);
        let sources: Vec<_> = suggestions.relations.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["Order", "Order", "User", "Invoice"]);
        assert_eq!(suggestions.relations[0].target, "User");
        assert_eq!(suggestions.relations[1].target, "Invoice");
    }

    #[test]
    fn dangling_relations_are_skipped() {
        let mut scan = result(0.9);
        scan.relations.push(ScannedRelation::new(
            "Order",
            "Ghost",
            RelationKind::Association,
            0.9,
        ));
        let suggestions = suggestions_for(&scan, None);
        assert!(suggestions.relations.iter().all(|r| r.target != "Ghost"));
    }

    #[test]
    fn medium_confidence_adds_caution_tips() {
        let response = Synthesizer::new(Locale::En).convert_scan_to_suggestions(&result(0.5), None);
        assert!(response.message.contains("partially"));
        assert!(!response.tips.unwrap().is_empty());
        assert!(response.next_steps.is_none());
    }

    #[test]
    fn high_confidence_is_concise() {
        let response = Synthesizer::new(Locale::En).convert_scan_to_suggestions(&result(0.9), None);
        assert!(response.message.contains("3 classes"));
        assert!(response.tips.is_none());
    }

    #[test]
    fn low_confidence_keeps_partial_candidates() {
        let response = Synthesizer::new(Locale::Es).convert_scan_to_suggestions(&result(0.1), None);
        assert_eq!(response.suggestions.classes.len(), 3);
        assert!(response.tips.is_some());
        assert!(response.next_steps.is_some());
    }

    #[test]
    fn everything_already_present() {
        let context: DiagramContext = serde_json::from_value(serde_json::json!({
            "nodes": [{ "id": "a", "name": "A" }]
        }))
        .unwrap();
        let scan = DiagramScanResult {
            classes: vec![ScannedClass::new("a", 0.9)],
            confidence: 0.9,
            ..Default::default()
        };
        let response = Synthesizer::new(Locale::En).convert_scan_to_suggestions(&scan, Some(&context));
        assert!(response.suggestions.is_empty());
        assert!(response.message.contains("already"));
    }
}
