use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::types::GraphHit;
use super::GraphSource;
use crate::error::Result;
use crate::knowledge_graph::{params, GraphClient, Record};
use crate::knowledge_graph::schema::MENTIONS;
use crate::observability::Observability;

/// Expands entity names through `MENTIONS` relationships.
pub struct GraphRetriever {
    client: Arc<dyn GraphClient>,
    obs: Option<Arc<Observability>>,
}

/// Distinct entities reachable from `$name` in `1..=depth` hops.
pub fn traversal_query(depth: usize) -> String {
    format!(
        "MATCH (e:Entity {{name: $name}})-[:{}*1..{}]-(n:Entity)
         WHERE n <> e
         RETURN DISTINCT n.name AS name, n.type AS type, '' AS description",
        MENTIONS,
        depth.max(1)
    )
}

fn text_field(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl GraphRetriever {
    pub fn new(client: Arc<dyn GraphClient>) -> Self {
        Self { client, obs: None }
    }

    pub fn with_observability(mut self, obs: Arc<Observability>) -> Self {
        self.obs = Some(obs);
        self
    }

    async fn expand(&self, entity: &str, cypher: &str) -> Result<Vec<GraphHit>> {
        let records = self
            .client
            .run(cypher, params([("name", json!(entity))]))
            .await?;

        Ok(records
            .iter()
            .map(|record| {
                let related = text_field(record, "name");
                GraphHit {
                    entity: entity.to_string(),
                    relationship: format!("{} -> {}", entity, related),
                    related,
                    entity_type: text_field(record, "type"),
                    description: text_field(record, "description"),
                }
            })
            .collect())
    }
}

#[async_trait]
impl GraphSource for GraphRetriever {
    /// Without `entities` the whole query is looked up as one entity name.
    /// A failing entity is logged and skipped.
    async fn retrieve(
        &self,
        query: &str,
        entities: Option<&[String]>,
        depth: usize,
    ) -> Result<Vec<GraphHit>> {
        let _timer = self.obs.as_ref().map(|o| o.timer("retrieval.graph"));
        let fallback = [query.to_string()];
        let entities = entities.unwrap_or(&fallback);
        let cypher = traversal_query(depth);

        let mut results = Vec::new();
        for entity in entities {
            match self.expand(entity, &cypher).await {
                Ok(hits) => results.extend(hits),
                Err(e) => {
                    error!("Error retrieving graph data for entity '{}': {}", entity, e);
                }
            }
        }

        debug!("Graph retrieval returned {} results", results.len());
        Ok(results)
    }
}
