//! Multiplicity inference for a relation between two classes.
//!
//! Evidence is read off the attributes: a collection of the other class
//! (`List<T>`, `T[]`, `Vec<T>`, `Set<T>`) marks a "many" end, a foreign key
//! (`customerId`, `customer_id`) marks the referencing side as the many side.

use serde::{Deserialize, Serialize};

use umlscan_core::{canonical_name, RelationKind};

use crate::locale::{CardinalityReason, Locale};

const COLLECTION_WRAPPERS: &[&str] = &["list", "vec", "set", "collection", "array", "ienumerable"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardinalityRequest {
    pub source_class: String,
    pub target_class: String,
    #[serde(default)]
    pub source_attributes: Vec<String>,
    #[serde(default)]
    pub target_attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardinalitySuggestion {
    pub source_cardinality: String,
    pub target_cardinality: String,
    pub relation_kind: RelationKind,
    pub reasoning: String,
    pub confidence: f32,
}

/// Compact lowercase key for matching against attribute text.
fn class_key(name: &str) -> String {
    canonical_name(name).replace(' ', "")
}

fn holds_collection_of(attributes: &[String], class: &str) -> bool {
    let key = class_key(class);
    attributes.iter().any(|attr| {
        let compact: String = attr
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        compact.contains(&format!("{key}[]"))
            || COLLECTION_WRAPPERS
                .iter()
                .any(|w| compact.contains(&format!("{w}<{key}>")))
    })
}

fn references(attributes: &[String], class: &str) -> bool {
    let key = class_key(class);
    let candidates = [format!("{key}id"), format!("{key}_id")];
    attributes.iter().any(|attr| {
        attr.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .map(str::to_lowercase)
            .any(|word| candidates.contains(&word))
    })
}

pub fn suggest_cardinality(request: &CardinalityRequest, locale: Locale) -> CardinalitySuggestion {
    let source = request.source_class.trim();
    let target = request.target_class.trim();

    let source_many = holds_collection_of(&request.source_attributes, target);
    let target_many = holds_collection_of(&request.target_attributes, source);

    let (source_card, target_card, reason, confidence) = if source_many && target_many {
        ("*", "*", CardinalityReason::ManyToMany, 0.85)
    } else if source_many {
        ("1", "*", CardinalityReason::SourceHoldsMany, 0.8)
    } else if target_many {
        ("*", "1", CardinalityReason::TargetHoldsMany, 0.8)
    } else if references(&request.target_attributes, source) {
        ("1", "*", CardinalityReason::TargetReferencesSource, 0.75)
    } else if references(&request.source_attributes, target) {
        ("*", "1", CardinalityReason::SourceReferencesTarget, 0.75)
    } else {
        ("1", "*", CardinalityReason::Default, 0.4)
    };

    CardinalitySuggestion {
        source_cardinality: source_card.to_string(),
        target_cardinality: target_card.to_string(),
        relation_kind: RelationKind::Association,
        reasoning: locale.cardinality_reason(reason, source, target),
        confidence,
    }
}
