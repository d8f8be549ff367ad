use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::document::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Vector,
    Graph,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Vector => "vector",
            Source::Graph => "graph",
        }
    }
}

/// A retrieved piece of evidence eligible for the generation prompt.
///
/// `weight` is the blending weight of the item's source, identical for every
/// item of that source within one ranking call. `score` is only set for
/// vector items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub content: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    pub weight: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ContextItem {
    pub fn from_vector(hit: &VectorHit, weight: f32) -> Self {
        Self {
            content: hit.content.clone(),
            source: Source::Vector,
            score: Some(hit.score),
            weight,
            metadata: hit.to_record(),
        }
    }

    /// Uses the description when present, otherwise
    /// `"<entity> is related to <related> (<type>)"`.
    pub fn from_graph(hit: &GraphHit, weight: f32) -> Self {
        let content = if hit.description.is_empty() {
            format!(
                "{} is related to {} ({})",
                hit.entity, hit.related, hit.entity_type
            )
        } else {
            hit.description.clone()
        };

        Self {
            content,
            source: Source::Graph,
            score: None,
            weight,
            metadata: hit.to_record(),
        }
    }

    pub fn score_or_zero(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }
}

/// Vector search result. `score` is cosine similarity: higher is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub index: usize,
}

impl VectorHit {
    pub fn to_record(&self) -> Metadata {
        let mut record = Metadata::new();
        record.insert("source".into(), json!("vector"));
        record.insert("score".into(), json!(self.score));
        record.insert("content".into(), json!(self.content));
        record.insert("index".into(), json!(self.index));
        record
    }
}

/// Related-entity record from graph traversal. Absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphHit {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub related: String,
    #[serde(default, rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub relationship: String,
}

impl GraphHit {
    pub fn new(entity: &str, related: &str, entity_type: &str) -> Self {
        Self {
            entity: entity.to_string(),
            related: related.to_string(),
            entity_type: entity_type.to_string(),
            description: String::new(),
            relationship: format!("{} -> {}", entity, related),
        }
    }

    pub fn to_record(&self) -> Metadata {
        let mut record = Metadata::new();
        record.insert("source".into(), json!("graph"));
        record.insert("entity".into(), json!(self.entity));
        record.insert("related".into(), json!(self.related));
        record.insert("type".into(), json!(self.entity_type));
        record.insert("description".into(), json!(self.description));
        record.insert("relationship".into(), json!(self.relationship));
        record
    }
}
