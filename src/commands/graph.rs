//! Knowledge graph build and inspection.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::knowledge_graph::{BuildStats, GraphBuilder, GraphClient, GraphQueries, Neo4jClient};

async fn connect(config: &Config) -> Result<Arc<dyn GraphClient>> {
    let neo4j = config.require_neo4j()?;
    let client = Neo4jClient::from_config(neo4j)
        .await
        .context("Failed to connect to Neo4j")?;
    Ok(Arc::new(client))
}

pub async fn build(config: &Config) -> Result<BuildStats> {
    let graph = connect(config).await?;
    let stats = GraphBuilder::new(graph)
        .process_chunks(&config.chunks_path())
        .await
        .context("Graph build failed")?;

    println!(
        "Processed {} documents, {} entity mentions ({} skipped, {} failed lines)",
        stats.documents, stats.entities, stats.skipped_lines, stats.failed_lines
    );
    Ok(stats)
}

pub async fn check(config: &Config, entity: Option<&str>, limit: usize) -> Result<()> {
    report(&GraphQueries::new(connect(config).await?), entity, limit).await
}

async fn report(queries: &GraphQueries, entity: Option<&str>, limit: usize) -> Result<()> {
    let stats = queries.graph_stats().await?;
    println!("Entities:      {}", stats.entities);
    println!("Documents:     {}", stats.documents);
    println!("Relationships: {}", stats.relationships);
    println!("Entity types:  {}", stats.entity_types.join(", "));

    match entity {
        Some(name) => {
            println!("\nRelated to {}:", name);
            for record in queries.find_related_entities(name, limit).await? {
                println!("  {}", serde_json::Value::Object(record));
            }
            println!("\nDocuments mentioning {}:", name);
            for record in queries.find_documents_mentioning(name, limit).await? {
                println!("  {}", serde_json::Value::Object(record));
            }
        }
        None => {
            println!("\nSample entities:");
            for record in queries.list_entities(limit).await? {
                println!("  {}", serde_json::Value::Object(record));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_graph::builder::tests::RecordingClient;

    #[tokio::test]
    async fn report_runs_stats_and_entity_queries() {
        let client = Arc::new(RecordingClient::default());
        let queries = GraphQueries::new(client.clone());

        report(&queries, Some("Finance Team"), 5).await.unwrap();

        let calls = client.calls.lock().unwrap();
        assert!(calls.iter().any(|(q, _)| q.contains("count(e)")));
        assert!(calls
            .iter()
            .any(|(_, p)| p.get("name") == Some(&serde_json::json!("Finance Team"))));
    }

    #[tokio::test]
    async fn build_requires_neo4j_settings() {
        let mut config = {
            let _lock = crate::config::tests::ENV_LOCK
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            Config::default()
        };
        config.neo4j.uri = String::new();

        let err = build(&config).await.unwrap_err();
        assert!(err.to_string().contains("NEO4J_URI"));
    }
}
