//! Parser for generative-AI suggestion drafts.
//!
//! Models are asked for a JSON object with `classes` and `relations`, but
//! replies arrive wrapped in Markdown fences, with Spanish or PlantUML-ish
//! field names, and with members given either as strings or objects. This
//! module accepts all of those and produces a `RawExtraction`.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use umlscan_core::{
    Cardinality, RawExtraction, RelationKind, ScannedClass, ScannedRelation,
};

/// Confidence assumed for AI candidates that carry no score of their own.
pub const DEFAULT_DRAFT_CONFIDENCE: f32 = 0.75;

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap());

#[derive(Debug, Deserialize)]
struct Draft {
    #[serde(default, alias = "clases")]
    classes: Vec<DraftClass>,
    #[serde(default, alias = "relationships", alias = "relaciones")]
    relations: Vec<DraftRelation>,
    #[serde(default, alias = "confianza")]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftClass {
    #[serde(alias = "className", alias = "nombre")]
    name: String,
    #[serde(default, alias = "atributos", alias = "fields")]
    attributes: Vec<DraftMember>,
    #[serde(default, alias = "metodos", alias = "métodos", alias = "operations")]
    methods: Vec<DraftMember>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DraftMember {
    Text(String),
    Detailed {
        #[serde(alias = "nombre")]
        name: String,
        #[serde(default, rename = "type", alias = "tipo", alias = "returnType")]
        ty: Option<String>,
        #[serde(default, alias = "visibilidad")]
        visibility: Option<String>,
        #[serde(default, alias = "parametros", alias = "params")]
        parameters: Option<serde_json::Value>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftRelation {
    #[serde(alias = "source", alias = "origen", alias = "sourceClass")]
    from: String,
    #[serde(alias = "target", alias = "destino", alias = "targetClass")]
    to: String,
    #[serde(default, rename = "type", alias = "kind", alias = "tipo")]
    kind: Option<String>,
    #[serde(default, alias = "cardinality", alias = "cardinalidad")]
    multiplicity: Option<DraftMultiplicity>,
    #[serde(default, alias = "sourceMultiplicity")]
    source_cardinality: Option<String>,
    #[serde(default, alias = "targetMultiplicity")]
    target_cardinality: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DraftMultiplicity {
    Pair {
        #[serde(default, alias = "from")]
        source: Option<String>,
        #[serde(default, alias = "to")]
        target: Option<String>,
    },
    Text(String),
}

impl DraftMember {
    fn render(&self, as_method: bool) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Detailed {
                name,
                ty,
                visibility,
                parameters,
            } => {
                let mut out = String::new();
                if let Some(symbol) = visibility.as_deref().and_then(visibility_symbol) {
                    out.push_str(symbol);
                }
                out.push_str(name.trim());
                if as_method && !name.contains('(') {
                    out.push('(');
                    out.push_str(&render_parameters(parameters.as_ref()));
                    out.push(')');
                }
                if let Some(ty) = ty.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    out.push_str(": ");
                    out.push_str(ty);
                }
                out
            }
        }
    }
}

fn visibility_symbol(visibility: &str) -> Option<&'static str> {
    match visibility.trim().to_lowercase().as_str() {
        "+" | "public" | "publico" | "público" => Some("+"),
        "-" | "private" | "privado" => Some("-"),
        "#" | "protected" | "protegido" => Some("#"),
        "~" | "package" | "paquete" => Some("~"),
        _ => None,
    }
}

fn render_parameters(parameters: Option<&serde_json::Value>) -> String {
    match parameters {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|p| match p {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Object(map) => {
                    let name = map.get("name").and_then(|v| v.as_str())?;
                    Some(match map.get("type").and_then(|v| v.as_str()) {
                        Some(ty) => format!("{name}: {ty}"),
                        None => name.to_string(),
                    })
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

impl DraftMultiplicity {
    fn into_cardinality(self) -> Cardinality {
        match self {
            Self::Pair { source, target } => Cardinality { source, target },
            Self::Text(text) => {
                let parts: Vec<&str> = text
                    .split(|c| c == ':' || c == ',')
                    .flat_map(|p| p.split("->"))
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect();
                match parts.as_slice() {
                    [single] => Cardinality::new(None, Some(single)),
                    [source, target, ..] => Cardinality::new(Some(source), Some(target)),
                    [] => Cardinality::default(),
                }
            }
        }
    }
}

/// Locate the JSON object inside a model reply.
///
/// Returns `None` when the reply contains no object at all.
fn json_payload(text: &str) -> Option<&str> {
    if let Some(caps) = FENCE_RE.captures(text) {
        return caps.get(1).map(|m| m.as_str());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into raw candidates.
///
/// A reply with no JSON object (e.g. "no diagram found") is an empty
/// extraction. A reply with an object that does not parse is an error.
pub fn parse_draft(text: &str) -> Result<RawExtraction> {
    let Some(payload) = json_payload(text) else {
        return Ok(RawExtraction::empty());
    };

    let draft: Draft =
        serde_json::from_str(payload).context("AI draft is not a valid diagram object")?;

    let overall = draft.confidence.unwrap_or(DEFAULT_DRAFT_CONFIDENCE);

    let classes = draft
        .classes
        .into_iter()
        .map(|c| ScannedClass {
            attributes: c.attributes.iter().map(|a| a.render(false)).collect(),
            methods: c.methods.iter().map(|m| m.render(true)).collect(),
            confidence: c.confidence.unwrap_or(overall),
            name: c.name,
            tokens: Vec::new(),
        })
        .collect();

    let relations = draft
        .relations
        .into_iter()
        .map(|r| {
            let mut cardinality = Cardinality::new(
                r.source_cardinality.as_deref(),
                r.target_cardinality.as_deref(),
            );
            if let Some(multiplicity) = r.multiplicity {
                cardinality.fill_from(&multiplicity.into_cardinality());
            }
            ScannedRelation {
                source: r.from,
                target: r.to,
                kind: r
                    .kind
                    .as_deref()
                    .map(RelationKind::parse_lenient)
                    .unwrap_or_default(),
                cardinality: cardinality.cleaned(),
                confidence: r.confidence.unwrap_or(overall),
                self_relation: false,
            }
        })
        .collect();

    Ok(RawExtraction {
        classes,
        relations,
        tokens: Vec::new(),
        confidence: overall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply_with_aliases() {
        let reply = r#"Here is the diagram:
```json
{
  "clases": [
    { "nombre": "Pedido", "atributos": ["id: number", { "name": "total", "type": "float", "visibility": "private" }],
      "metodos": [{ "name": "pagar", "type": "void" }], "confidence": 0.9 }
  ],
  "relaciones": [
    { "origen": "Pedido", "destino": "Cliente", "tipo": "composición", "cardinality": "0..* : 1" }
  ],
  "confidence": 0.6
}
```"#;
        let raw = parse_draft(reply).unwrap();
        assert_eq!(raw.classes.len(), 1);
        let pedido = &raw.classes[0];
        assert_eq!(pedido.name, "Pedido");
        assert_eq!(pedido.attributes, vec!["id: number", "-total: float"]);
        assert_eq!(pedido.methods, vec!["pagar(): void"]);
        assert_eq!(pedido.confidence, 0.9);

        let rel = &raw.relations[0];
        assert_eq!(rel.kind, RelationKind::Composition);
        assert_eq!(rel.confidence, 0.6);
        assert_eq!(rel.cardinality, Some(Cardinality::new(Some("0..*"), Some("1"))));
    }

    #[test]
    fn bare_json_and_split_cardinality_fields() {
        let raw = parse_draft(
            r#"{"classes":[{"name":"A"},{"name":"B"}],
                "relations":[{"from":"A","to":"B","type":"extends","targetCardinality":"1"}]}"#,
        )
        .unwrap();
        assert_eq!(raw.classes[0].confidence, DEFAULT_DRAFT_CONFIDENCE);
        assert_eq!(raw.relations[0].kind, RelationKind::Inheritance);
        assert_eq!(raw.relations[0].cardinality, Some(Cardinality::new(None, Some("1"))));
    }

    #[test]
    fn prose_without_json_is_empty() {
        let raw = parse_draft("I could not find any UML diagram in this picture.").unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn broken_json_is_an_error() {
        assert!(parse_draft(r#"{"classes": [ {"name": }"#).is_err());
    }
}
