//! Optical Character Recognition (OCR)
//!
//! Sends the diagram image to an external OCR/layout service and turns its
//! tokens and shape boxes into class and relation candidates with simple
//! geometric heuristics.

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::{debug, info};

use umlscan_core::{
    clamp_confidence, BoundingBox, ExtractionBackend, ImageInput, RawExtraction, RawToken,
    RelationKind, ScanError, ScannedClass, ScannedRelation,
};

/// Tokens whose vertical centers differ by less than this share a line.
const LINE_TOLERANCE_PX: f32 = 8.0;

/// A detected rectangle, usually a class box.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeBox {
    #[serde(alias = "box")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub confidence: f32,
}

/// Layout returned by the OCR service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrLayout {
    #[serde(default)]
    pub tokens: Vec<RawToken>,
    #[serde(default)]
    pub shapes: Vec<ShapeBox>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// OCR-backed extractor posting the image to `endpoint` as multipart.
pub struct OcrExtractor {
    client: Client,
    endpoint: String,
}

impl OcrExtractor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn recognize(&self, image: &ImageInput) -> anyhow::Result<reqwest::Response> {
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name("diagram")
            .mime_str(&image.mime_type)?;
        let form = multipart::Form::new().part("image", part);
        self.client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("OCR HTTP request failed")
    }
}

#[async_trait]
impl ExtractionBackend for OcrExtractor {
    fn name(&self) -> &str {
        "ocr"
    }

    async fn extract(&self, image: &ImageInput) -> Result<RawExtraction, ScanError> {
        info!(bytes = image.bytes.len(), "Running OCR on diagram image");

        let response = self
            .recognize(image)
            .await
            .map_err(|e| ScanError::unavailable(self.name(), format!("{e:#}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::unavailable(self.name(), format!("{status}: {body}")));
        }

        let layout: OcrLayout = response
            .json()
            .await
            .map_err(|e| ScanError::malformed(self.name(), e))?;

        Ok(candidates_from_layout(&layout))
    }
}

/// A run of tokens on the same visual line.
struct TextLine {
    text: String,
    confidence: f32,
    tokens: Vec<RawToken>,
}

/// Group tokens into lines by vertical center, left to right within a line.
fn group_lines(mut tokens: Vec<RawToken>) -> Vec<TextLine> {
    let center = |t: &RawToken| t.bbox.map(|b| b.center()).unwrap_or((0.0, 0.0));
    tokens.sort_by(|a, b| center(a).1.total_cmp(&center(b).1));

    let mut rows: Vec<(f32, Vec<RawToken>)> = Vec::new();
    for token in tokens {
        let cy = center(&token).1;
        match rows.last_mut() {
            Some((row_y, row)) if (cy - *row_y).abs() < LINE_TOLERANCE_PX => row.push(token),
            _ => rows.push((cy, vec![token])),
        }
    }

    rows.into_iter()
        .filter_map(|(_, mut row)| {
            row.sort_by(|a, b| center(a).0.total_cmp(&center(b).0));
            let text = row
                .iter()
                .map(|t| t.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }
            let confidence =
                row.iter().map(|t| clamp_confidence(t.confidence)).sum::<f32>() / row.len() as f32;
            Some(TextLine {
                text,
                confidence,
                tokens: row,
            })
        })
        .collect()
}

fn is_separator(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| matches!(c, '-' | '_' | '=' | '—' | ' '))
}

fn is_stereotype(line: &str) -> bool {
    line.starts_with("<<") || line.starts_with('«')
}

/// Build a class candidate from the lines inside one shape box.
fn class_from_shape(shape: &ShapeBox, lines: Vec<TextLine>) -> Option<ScannedClass> {
    let mut lines = lines
        .into_iter()
        .filter(|l| !is_separator(&l.text) && !is_stereotype(&l.text));
    let header = lines.next()?;

    let mut class = ScannedClass::new(header.text, header.confidence);
    let mut confidences = vec![header.confidence];
    class.tokens.extend(header.tokens);

    for line in lines {
        confidences.push(line.confidence);
        if line.text.contains('(') {
            class.methods.push(line.text);
        } else {
            class.attributes.push(line.text);
        }
        class.tokens.extend(line.tokens);
    }

    let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
    let shape_confidence = clamp_confidence(shape.confidence);
    class.confidence = if shape_confidence > 0.0 {
        mean.min(shape_confidence)
    } else {
        mean
    };
    Some(class)
}

static RELATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*([\p{L}_][\p{L}\p{N}_]*)\s*(?:"([^"]+)"\s*)?(<\|--|--\|>|<\|\.\.|\.\.\|>|\*--|--\*|o--|--o|\.\.>|<\.\.|-->|<--|--)\s*(?:"([^"]+)"\s*)?([\p{L}_][\p{L}\p{N}_]*)\s*$"#,
    )
    .unwrap()
});

/// Parse a PlantUML/Mermaid-style relation line such as `Order "1" *-- "0..*" Line`.
pub fn parse_relation_line(line: &str, confidence: f32) -> Option<ScannedRelation> {
    let caps = RELATION_RE.captures(line)?;
    let left = caps.get(1)?.as_str();
    let left_card = caps.get(2).map(|m| m.as_str());
    let arrow = caps.get(3)?.as_str();
    let right_card = caps.get(4).map(|m| m.as_str());
    let right = caps.get(5)?.as_str();

    // (kind, reversed): reversed means the right-hand side is the source.
    let (kind, reversed) = match arrow {
        "<|--" => (RelationKind::Inheritance, true),
        "--|>" => (RelationKind::Inheritance, false),
        "<|.." => (RelationKind::Realization, true),
        "..|>" => (RelationKind::Realization, false),
        "*--" => (RelationKind::Composition, false),
        "--*" => (RelationKind::Composition, true),
        "o--" => (RelationKind::Aggregation, false),
        "--o" => (RelationKind::Aggregation, true),
        "..>" => (RelationKind::Dependency, false),
        "<.." => (RelationKind::Dependency, true),
        "<--" => (RelationKind::Association, true),
        _ => (RelationKind::Association, false),
    };

    let relation = if reversed {
        ScannedRelation::new(right, left, kind, confidence).with_cardinality(right_card, left_card)
    } else {
        ScannedRelation::new(left, right, kind, confidence).with_cardinality(left_card, right_card)
    };
    Some(relation)
}

/// Turn an OCR layout into raw candidates.
///
/// Every shape with text becomes a class: its first line is the name,
/// lines containing `(` are methods, the rest attributes. Tokens outside all
/// shapes are read as textual relation lines.
pub fn candidates_from_layout(layout: &OcrLayout) -> RawExtraction {
    let mut per_shape: Vec<Vec<RawToken>> = vec![Vec::new(); layout.shapes.len()];
    let mut loose = Vec::new();

    for token in &layout.tokens {
        let owner = token.bbox.and_then(|b| {
            let (cx, cy) = b.center();
            layout.shapes.iter().position(|s| s.bbox.contains(cx, cy))
        });
        match owner {
            Some(idx) => per_shape[idx].push(token.clone()),
            None => loose.push(token.clone()),
        }
    }

    let classes: Vec<ScannedClass> = layout
        .shapes
        .iter()
        .zip(per_shape)
        .filter_map(|(shape, tokens)| class_from_shape(shape, group_lines(tokens)))
        .collect();

    let relations: Vec<ScannedRelation> = group_lines(loose)
        .into_iter()
        .filter_map(|line| parse_relation_line(&line.text, line.confidence))
        .collect();

    debug!(
        shapes = layout.shapes.len(),
        classes = classes.len(),
        relations = relations.len(),
        "OCR layout converted"
    );

    let confidence = layout.confidence.map(clamp_confidence).unwrap_or_else(|| {
        if classes.is_empty() {
            0.0
        } else {
            classes.iter().map(|c| c.confidence).sum::<f32>() / classes.len() as f32
        }
    });

    RawExtraction {
        classes,
        relations,
        tokens: layout.tokens.clone(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, x: f32, y: f32, confidence: f32) -> RawToken {
        RawToken::new(text, Some(BoundingBox::new(x, y, 40.0, 10.0)), confidence)
    }

    #[test]
    fn shape_tokens_become_a_class() {
        let layout = OcrLayout {
            tokens: vec![
                token("<<entity>>", 10.0, 5.0, 0.9),
                token("Order", 10.0, 20.0, 0.9),
                token("-----", 10.0, 35.0, 0.5),
                token("id:", 10.0, 50.0, 0.8),
                token("int", 55.0, 50.0, 0.8),
                token("pay()", 10.0, 70.0, 0.7),
            ],
            shapes: vec![ShapeBox {
                bbox: BoundingBox::new(0.0, 0.0, 200.0, 100.0),
                confidence: 0.95,
            }],
            confidence: None,
        };

        let raw = candidates_from_layout(&layout);
        assert_eq!(raw.classes.len(), 1);
        let order = &raw.classes[0];
        assert_eq!(order.name, "Order");
        assert_eq!(order.attributes, vec!["id: int"]);
        assert_eq!(order.methods, vec!["pay()"]);
        assert!((order.confidence - 0.8).abs() < 1e-6);
        assert_eq!(order.tokens.len(), 4);
    }

    #[test]
    fn shape_confidence_caps_class_confidence() {
        let layout = OcrLayout {
            tokens: vec![token("User", 10.0, 10.0, 0.9)],
            shapes: vec![ShapeBox {
                bbox: BoundingBox::new(0.0, 0.0, 100.0, 50.0),
                confidence: 0.4,
            }],
            confidence: None,
        };
        let raw = candidates_from_layout(&layout);
        assert_eq!(raw.classes[0].confidence, 0.4);
    }

    #[test]
    fn empty_shapes_are_skipped() {
        let layout = OcrLayout {
            tokens: vec![],
            shapes: vec![ShapeBox {
                bbox: BoundingBox::new(0.0, 0.0, 100.0, 50.0),
                confidence: 0.9,
            }],
            confidence: None,
        };
        let raw = candidates_from_layout(&layout);
        assert!(raw.is_empty());
        assert_eq!(raw.confidence, 0.0);
    }

    #[test]
    fn loose_lines_become_relations() {
        let layout = OcrLayout {
            tokens: vec![
                token("Animal", 300.0, 200.0, 0.8),
                token("<|--", 345.0, 200.0, 0.6),
                token("Dog", 390.0, 200.0, 0.7),
            ],
            shapes: vec![],
            confidence: Some(0.5),
        };
        let raw = candidates_from_layout(&layout);
        assert_eq!(raw.relations.len(), 1);
        let rel = &raw.relations[0];
        assert_eq!(rel.source, "Dog");
        assert_eq!(rel.target, "Animal");
        assert_eq!(rel.kind, RelationKind::Inheritance);
        assert_eq!(raw.confidence, 0.5);
    }

    #[test]
    fn parses_cardinality_labels() {
        let rel = parse_relation_line(r#"Order "1" *-- "0..*" LineItem"#, 0.7).unwrap();
        assert_eq!(rel.kind, RelationKind::Composition);
        assert_eq!(rel.source, "Order");
        let card = rel.cardinality.unwrap();
        assert_eq!(card.source.as_deref(), Some("1"));
        assert_eq!(card.target.as_deref(), Some("0..*"));

        let rel = parse_relation_line(r#"LineItem "0..*" --* "1" Order"#, 0.7).unwrap();
        assert_eq!(rel.source, "Order");
        assert_eq!(rel.cardinality.unwrap().source.as_deref(), Some("1"));
    }

    #[test]
    fn non_relation_text_is_ignored() {
        assert!(parse_relation_line("Figure 1: class diagram", 0.9).is_none());
    }
}
