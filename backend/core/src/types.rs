use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Clamp a detector score into `[0, 1]`. NaN becomes 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Axis-aligned region of the source image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// One OCR/vision detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawToken {
    pub text: String,
    #[serde(default, alias = "box", skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub confidence: f32,
}

impl RawToken {
    pub fn new(text: impl Into<String>, bbox: Option<BoundingBox>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }
}

/// UML relation kinds understood by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    Association,
    Inheritance,
    Realization,
    Composition,
    Aggregation,
    Dependency,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown relation kind: {0}")]
pub struct UnknownRelationKind(pub String);

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Association => "association",
            Self::Inheritance => "inheritance",
            Self::Realization => "realization",
            Self::Composition => "composition",
            Self::Aggregation => "aggregation",
            Self::Dependency => "dependency",
        }
    }

    /// Parse a kind, falling back to `Association` for unknown labels.
    pub fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = UnknownRelationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        let kind = match key.as_str() {
            "association" | "asociacion" | "asociación" | "associates" | "has" | "uses_a" => {
                Self::Association
            }
            "inheritance" | "herencia" | "generalization" | "generalizacion"
            | "generalización" | "extends" | "inherits" | "is_a" => Self::Inheritance,
            "realization" | "realizacion" | "realización" | "implements" | "implementation"
            | "interface_realization" => Self::Realization,
            "composition" | "composicion" | "composición" | "composed_of" => Self::Composition,
            "aggregation" | "agregacion" | "agregación" | "aggregates" => Self::Aggregation,
            "dependency" | "dependencia" | "depends_on" | "uses" => Self::Dependency,
            _ => return Err(UnknownRelationKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Multiplicity labels at either end of a relation (e.g. `"1"`, `"0..*"`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cardinality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Cardinality {
    pub fn new(source: Option<&str>, target: Option<&str>) -> Self {
        Self {
            source: source.map(str::to_string),
            target: target.map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.target.is_none()
    }

    /// Fill whichever ends are missing here from `other`.
    pub fn fill_from(&mut self, other: &Cardinality) {
        if self.source.is_none() {
            self.source.clone_from(&other.source);
        }
        if self.target.is_none() {
            self.target.clone_from(&other.target);
        }
    }

    /// Trim labels and drop blank ends; `None` when nothing remains.
    pub fn cleaned(&self) -> Option<Cardinality> {
        let clean = |side: &Option<String>| {
            side.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let cleaned = Cardinality {
            source: clean(&self.source),
            target: clean(&self.target),
        };
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

/// A candidate UML class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedClass {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub confidence: f32,
    /// Detections that contributed to this class, kept for diagnostics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<RawToken>,
}

impl ScannedClass {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            methods: Vec::new(),
            confidence,
            tokens: Vec::new(),
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A candidate directed relation between two classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedRelation {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub kind: RelationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    #[serde(default)]
    pub confidence: f32,
    /// Set by the normalizer when both ends resolve to the same class.
    #[serde(default, skip_serializing_if = "is_false")]
    pub self_relation: bool,
}

impl ScannedRelation {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
        confidence: f32,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            cardinality: None,
            confidence,
            self_relation: false,
        }
    }

    pub fn with_cardinality(mut self, source: Option<&str>, target: Option<&str>) -> Self {
        self.cardinality = Cardinality::new(source, target).cleaned();
        self
    }
}

/// Unreconciled candidates produced by an extraction backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtraction {
    #[serde(default)]
    pub classes: Vec<ScannedClass>,
    #[serde(default)]
    pub relations: Vec<ScannedRelation>,
    #[serde(default)]
    pub tokens: Vec<RawToken>,
    /// Backend-reported overall confidence.
    #[serde(default)]
    pub confidence: f32,
}

impl RawExtraction {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.relations.is_empty()
    }

    /// Append another backend's candidates. Overlap is left for the normalizer.
    pub fn absorb(&mut self, other: RawExtraction) {
        self.classes.extend(other.classes);
        self.relations.extend(other.relations);
        self.tokens.extend(other.tokens);
        self.confidence = self.confidence.max(clamp_confidence(other.confidence));
    }
}

/// Normalized scan output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramScanResult {
    pub classes: Vec<ScannedClass>,
    pub relations: Vec<ScannedRelation>,
    /// Weighted aggregate over class confidences, in `[0, 1]`.
    pub confidence: f32,
    /// Detections dropped: dangling relations and unnamed classes.
    #[serde(default)]
    pub discarded: usize,
    /// Duplicate classes and relations folded into an earlier entry.
    #[serde(default)]
    pub merged: usize,
}

impl DiagramScanResult {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
