//! Read-only inspection queries used by `graph-check`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use super::client::{params, GraphClient, Record};
use crate::error::Result;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub entities: i64,
    pub documents: i64,
    pub relationships: i64,
    pub entity_types: Vec<String>,
}

pub struct GraphQueries {
    graph: Arc<dyn GraphClient>,
}

impl GraphQueries {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }

    /// Entities one hop away, with the relationship type as `relation`.
    pub async fn find_related_entities(&self, name: &str, limit: usize) -> Result<Vec<Record>> {
        self.graph
            .run(
                "MATCH (e1:Entity {name: $name})-[r]-(e2:Entity)
                 RETURN e2.name AS name, e2.type AS type, type(r) AS relation
                 LIMIT $limit",
                params([("name", json!(name)), ("limit", json!(limit))]),
            )
            .await
    }

    pub async fn find_documents_mentioning(&self, name: &str, limit: usize) -> Result<Vec<Record>> {
        self.graph
            .run(
                "MATCH (d:Document)-[:MENTIONS]->(e:Entity {name: $name})
                 RETURN d.id AS doc_id
                 LIMIT $limit",
                params([("name", json!(name)), ("limit", json!(limit))]),
            )
            .await
    }

    async fn count(&self, cypher: &str) -> Result<i64> {
        let rows = self.graph.run(cypher, Record::new()).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0))
    }

    pub async fn entity_count(&self) -> Result<i64> {
        self.count("MATCH (e:Entity) RETURN count(e) AS count").await
    }

    pub async fn document_count(&self) -> Result<i64> {
        self.count("MATCH (d:Document) RETURN count(d) AS count").await
    }

    /// Directed match, so each relationship is counted once.
    pub async fn relationship_count(&self) -> Result<i64> {
        self.count("MATCH ()-[r]->() RETURN count(r) AS count").await
    }

    pub async fn entity_types(&self) -> Result<Vec<String>> {
        let rows = self
            .graph
            .run("MATCH (e:Entity) RETURN DISTINCT e.type AS type", Record::new())
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("type").and_then(|v| v.as_str()).map(String::from))
            .collect())
    }

    pub async fn list_entities(&self, limit: usize) -> Result<Vec<Record>> {
        self.graph
            .run(
                "MATCH (e:Entity)
                 RETURN e.name AS name, e.type AS type
                 ORDER BY e.name
                 LIMIT $limit",
                params([("limit", json!(limit))]),
            )
            .await
    }

    pub async fn graph_stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            entities: self.entity_count().await?,
            documents: self.document_count().await?,
            relationships: self.relationship_count().await?,
            entity_types: self.entity_types().await?,
        })
    }
}
