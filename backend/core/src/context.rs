//! Read-only snapshot of the diagram currently open in the editor.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::names::canonical_name;
use crate::types::RelationKind;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramContext {
    #[serde(default)]
    pub nodes: Vec<ContextNode>,
    #[serde(default)]
    pub edges: Vec<ContextEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextNode {
    pub id: String,
    #[serde(alias = "label", alias = "className")]
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ContextEdge {
    pub fn relation_kind(&self) -> RelationKind {
        self.kind
            .as_deref()
            .map(RelationKind::parse_lenient)
            .unwrap_or_default()
    }
}

impl DiagramContext {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Class name behind an edge endpoint. Endpoints that match no node id
    /// are taken to be class names already.
    pub fn endpoint_name<'a>(&'a self, endpoint: &'a str) -> &'a str {
        self.nodes
            .iter()
            .find(|n| n.id == endpoint)
            .map(|n| n.name.as_str())
            .unwrap_or(endpoint)
    }

    /// Number of edges touching each node id. Endpoints may name the node
    /// by id or by class name.
    pub fn degrees(&self) -> HashMap<&str, usize> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for edge in &self.edges {
            for end in [edge.source.as_str(), edge.target.as_str()] {
                *by_name
                    .entry(canonical_name(self.endpoint_name(end)))
                    .or_default() += 1;
            }
        }
        self.nodes
            .iter()
            .map(|n| {
                let count = by_name.get(&canonical_name(&n.name)).copied().unwrap_or(0);
                (n.id.as_str(), count)
            })
            .collect()
    }

    pub fn index(&self) -> ContextIndex {
        let class_keys = self
            .nodes
            .iter()
            .map(|n| canonical_name(&n.name))
            .filter(|k| !k.is_empty())
            .collect();
        let edge_keys = self
            .edges
            .iter()
            .map(|e| {
                (
                    canonical_name(self.endpoint_name(&e.source)),
                    canonical_name(self.endpoint_name(&e.target)),
                    e.relation_kind(),
                )
            })
            .collect();
        ContextIndex {
            class_keys,
            edge_keys,
        }
    }
}

/// Canonicalized lookup sets built once per request.
#[derive(Debug, Clone, Default)]
pub struct ContextIndex {
    class_keys: HashSet<String>,
    edge_keys: HashSet<(String, String, RelationKind)>,
}

impl ContextIndex {
    pub fn has_class(&self, name: &str) -> bool {
        self.class_keys.contains(&canonical_name(name))
    }

    pub fn has_edge(&self, source: &str, target: &str, kind: RelationKind) -> bool {
        self.edge_keys
            .contains(&(canonical_name(source), canonical_name(target), kind))
    }
}
