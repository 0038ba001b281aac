//! Diagram normalizer: folds noisy candidates into a unique, typed model.
//!
//! Classes are keyed by canonical name (trimmed, whitespace-collapsed,
//! case-folded); the first-seen spelling is kept for display. Relations are
//! keyed by `(source, target, kind)` over resolved class identities. The fold
//! is a single pass per collection and never fails: bad confidences are
//! clamped and unresolvable relations are counted and dropped.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use umlscan_core::{
    canonical_name, clamp_confidence, display_name, DiagramScanResult, RawExtraction,
    RelationKind, ScannedClass, ScannedRelation,
};

/// Normalize a backend extraction.
pub fn normalize(raw: &RawExtraction) -> DiagramScanResult {
    let mut fold = DiagramFold::default();
    fold.absorb(&raw.classes, &raw.relations);
    fold.finish()
}

/// Re-run the fold over an existing result, carrying its counters.
///
/// `normalize_result(&normalize(raw)) == normalize(raw)` for every `raw`.
pub fn normalize_result(result: &DiagramScanResult) -> DiagramScanResult {
    let mut fold = DiagramFold {
        discarded: result.discarded,
        merged: result.merged,
        ..DiagramFold::default()
    };
    fold.absorb(&result.classes, &result.relations);
    fold.finish()
}

/// Aggregate confidence: class confidences averaged with weight
/// `1 + degree`, where degree counts the relations touching the class.
///
/// Returns 0 for an empty class list.
pub fn aggregate_confidence(classes: &[ScannedClass], relations: &[ScannedRelation]) -> f32 {
    if classes.is_empty() {
        return 0.0;
    }

    let mut degree: HashMap<String, usize> = HashMap::new();
    for rel in relations {
        let source = canonical_name(&rel.source);
        let target = canonical_name(&rel.target);
        if source != target {
            *degree.entry(target).or_default() += 1;
        }
        *degree.entry(source).or_default() += 1;
    }

    let (weighted, total) = classes.iter().fold((0.0f64, 0.0f64), |(sum, weights), class| {
        let weight = 1.0 + degree.get(&canonical_name(&class.name)).copied().unwrap_or(0) as f64;
        (
            sum + weight * clamp_confidence(class.confidence) as f64,
            weights + weight,
        )
    });

    clamp_confidence((weighted / total) as f32)
}

struct ClassEntry {
    class: ScannedClass,
    attribute_keys: HashSet<String>,
    method_keys: HashSet<String>,
}

impl ClassEntry {
    fn new(name: String, confidence: f32) -> Self {
        Self {
            class: ScannedClass::new(name, confidence),
            attribute_keys: HashSet::new(),
            method_keys: HashSet::new(),
        }
    }

    fn absorb_members(&mut self, candidate: &ScannedClass) {
        append_unique(
            &mut self.class.attributes,
            &mut self.attribute_keys,
            &candidate.attributes,
        );
        append_unique(
            &mut self.class.methods,
            &mut self.method_keys,
            &candidate.methods,
        );
        self.class.tokens.extend(candidate.tokens.iter().cloned());
    }
}

/// Order-preserving union keyed by canonical text.
fn append_unique(target: &mut Vec<String>, seen: &mut HashSet<String>, items: &[String]) {
    for item in items {
        let shown = display_name(item);
        if shown.is_empty() {
            continue;
        }
        if seen.insert(shown.to_lowercase()) {
            target.push(shown);
        }
    }
}

#[derive(Default)]
struct DiagramFold {
    classes: Vec<ClassEntry>,
    class_index: HashMap<String, usize>,
    relations: Vec<ScannedRelation>,
    relation_index: HashMap<(usize, usize, RelationKind), usize>,
    discarded: usize,
    merged: usize,
}

impl DiagramFold {
    fn absorb(&mut self, classes: &[ScannedClass], relations: &[ScannedRelation]) {
        // Every class must be known before any relation is resolved.
        for class in classes {
            self.absorb_class(class);
        }
        for relation in relations {
            self.absorb_relation(relation);
        }
    }

    fn absorb_class(&mut self, candidate: &ScannedClass) {
        let name = display_name(&candidate.name);
        if name.is_empty() {
            debug!("Discarding unnamed class candidate");
            self.discarded += 1;
            return;
        }

        let key = name.to_lowercase();
        let confidence = clamp_confidence(candidate.confidence);

        let idx = match self.class_index.get(&key) {
            Some(&idx) => {
                self.merged += 1;
                let entry = &mut self.classes[idx];
                entry.class.confidence = entry.class.confidence.max(confidence);
                idx
            }
            None => {
                let idx = self.classes.len();
                self.classes.push(ClassEntry::new(name, confidence));
                self.class_index.insert(key, idx);
                idx
            }
        };
        self.classes[idx].absorb_members(candidate);
    }

    fn absorb_relation(&mut self, candidate: &ScannedRelation) {
        let source = self.class_index.get(&canonical_name(&candidate.source)).copied();
        let target = self.class_index.get(&canonical_name(&candidate.target)).copied();

        let (Some(source), Some(target)) = (source, target) else {
            debug!(
                source = %candidate.source,
                target = %candidate.target,
                "Discarding relation with unresolved endpoint"
            );
            self.discarded += 1;
            return;
        };

        let relation = ScannedRelation {
            source: self.classes[source].class.name.clone(),
            target: self.classes[target].class.name.clone(),
            kind: candidate.kind,
            cardinality: candidate.cardinality.as_ref().and_then(|c| c.cleaned()),
            confidence: clamp_confidence(candidate.confidence),
            self_relation: source == target,
        };

        let key = (source, target, candidate.kind);
        match self.relation_index.get(&key) {
            Some(&idx) => {
                self.merged += 1;
                let existing = &mut self.relations[idx];
                merge_relation(existing, relation);
            }
            None => {
                self.relation_index.insert(key, self.relations.len());
                self.relations.push(relation);
            }
        }
    }

    fn finish(self) -> DiagramScanResult {
        let classes: Vec<ScannedClass> = self.classes.into_iter().map(|e| e.class).collect();
        let confidence = aggregate_confidence(&classes, &self.relations);

        debug!(
            classes = classes.len(),
            relations = self.relations.len(),
            merged = self.merged,
            discarded = self.discarded,
            confidence,
            "Normalized diagram"
        );

        DiagramScanResult {
            classes,
            relations: self.relations,
            confidence,
            discarded: self.discarded,
            merged: self.merged,
        }
    }
}

/// Keep the more confident duplicate; cardinality ends it lacks are filled
/// from the other one. Ties keep the earlier entry.
fn merge_relation(existing: &mut ScannedRelation, incoming: ScannedRelation) {
    if incoming.confidence > existing.confidence {
        let loser = std::mem::replace(existing, incoming);
        fill_cardinality(existing, &loser);
    } else {
        fill_cardinality(existing, &incoming);
    }
}

fn fill_cardinality(winner: &mut ScannedRelation, loser: &ScannedRelation) {
    match (&mut winner.cardinality, &loser.cardinality) {
        (Some(mine), Some(theirs)) => mine.fill_from(theirs),
        (None, Some(theirs)) => winner.cardinality = Some(theirs.clone()),
        _ => {}
    }
}
