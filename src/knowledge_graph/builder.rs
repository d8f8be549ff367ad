//! Populates the graph from chunked documents.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::client::{params, GraphClient};
use super::entity_extractor::{EntityExtractor, ExtractedEntity};
use crate::document::Document;
use crate::error::Result;

/// Counters for one `process_chunks` run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BuildStats {
    pub documents: usize,
    pub entities: usize,
    pub skipped_lines: usize,
    pub failed_lines: usize,
}

pub struct GraphBuilder {
    graph: Arc<dyn GraphClient>,
    extractor: EntityExtractor,
}

impl GraphBuilder {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self {
            graph,
            extractor: EntityExtractor::new(),
        }
    }

    pub async fn create_entity(&self, entity: &ExtractedEntity) -> Result<()> {
        self.graph
            .run(
                "MERGE (e:Entity {name: $name, type: $type})",
                params([
                    ("name", json!(entity.name)),
                    ("type", json!(entity.entity_type)),
                ]),
            )
            .await?;
        Ok(())
    }

    pub async fn link_document(&self, doc_id: &str, entity_name: &str) -> Result<()> {
        self.graph
            .run(
                "MATCH (d:Document {id: $doc_id})
                 MATCH (e:Entity {name: $entity_name})
                 MERGE (d)-[:MENTIONS]->(e)",
                params([
                    ("doc_id", json!(doc_id)),
                    ("entity_name", json!(entity_name)),
                ]),
            )
            .await?;
        Ok(())
    }

    async fn process_document(&self, doc_id: &str, content: &str) -> Result<usize> {
        self.graph
            .run("MERGE (d:Document {id: $id})", params([("id", json!(doc_id))]))
            .await?;

        let entities = self.extractor.extract(content);
        for entity in &entities {
            self.create_entity(entity).await?;
            self.link_document(doc_id, &entity.name).await?;
        }
        Ok(entities.len())
    }

    /// Line `i` of `chunks_file` becomes `Document {id: "doc_i"}` linked to
    /// the entities found in its content. Bad lines are logged and skipped.
    pub async fn process_chunks(&self, chunks_file: &Path) -> Result<BuildStats> {
        info!("Processing chunks from {}", chunks_file.display());
        let file = File::open(chunks_file).inspect_err(|_| {
            error!("Chunks file not found: {}", chunks_file.display());
        })?;

        let mut stats = BuildStats::default();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let doc: Document = match serde_json::from_str(line.trim()) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Skipping invalid JSON at line {}: {}", i + 1, e);
                    stats.skipped_lines += 1;
                    continue;
                }
            };

            match self.process_document(&format!("doc_{}", i), &doc.content).await {
                Ok(count) => {
                    stats.documents += 1;
                    stats.entities += count;
                }
                Err(e) => {
                    error!("Error processing line {}: {}", i + 1, e);
                    stats.failed_lines += 1;
                }
            }
        }

        info!(
            documents = stats.documents,
            entities = stats.entities,
            "Graph building completed"
        );
        Ok(stats)
    }
}
