//! Graph database access.

use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, Graph};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Neo4jConfig;
use crate::document::Metadata;
use crate::error::{Error, Result};

/// One result row, keyed by the column names of the `RETURN` clause.
pub type Record = Metadata;

/// Runs Cypher statements. Implementations hold one long-lived connection
/// and must tolerate concurrent callers.
#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn run(&self, cypher: &str, params: Record) -> Result<Vec<Record>>;
}

/// Neo4j over bolt.
pub struct Neo4jClient {
    graph: Graph,
    uri: String,
}

impl Neo4jClient {
    /// Connect and verify the server answers before returning.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| Error::Connection(format!("Failed to connect to Neo4j at {}: {}", uri, e)))?;

        graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| Error::Connection(format!("Failed to connect to Neo4j at {}: {}", uri, e)))?;

        info!(%uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            uri: uri.to_string(),
        })
    }

    pub async fn from_config(config: &Neo4jConfig) -> Result<Self> {
        Self::connect(&config.uri, &config.user, &config.password).await
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait]
impl GraphClient for Neo4jClient {
    async fn run(&self, cypher: &str, params: Record) -> Result<Vec<Record>> {
        let mut q = query(cypher);
        for (key, value) in params {
            q = q.param(&key, to_bolt(value));
        }

        let mut stream = self.graph.execute(q).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            let record: Record = row
                .to()
                .map_err(|e| Error::Graph(format!("Failed to decode row: {}", e)))?;
            records.push(record);
        }

        debug!(rows = records.len(), "Cypher query completed");
        Ok(records)
    }
}

/// Scalars map to their bolt counterparts; arrays and objects are passed as
/// JSON text.
pub(crate) fn to_bolt(value: Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => b.into(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        Value::String(s) => s.into(),
        other => other.to_string().into(),
    }
}

/// Build a parameter map from `(key, value)` pairs.
pub fn params<I, K, V>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
