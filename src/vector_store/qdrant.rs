//! Vector store backed by a Qdrant collection

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, CreateCollectionBuilder, Distance, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{check_lengths, StoredMatch, VectorStore};
use crate::document::Metadata;
use crate::error::{Error, Result};

fn store_err(err: impl std::fmt::Display) -> Error {
    Error::VectorStore(err.to_string())
}

pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
    // Serialises `add` so positional ids stay contiguous.
    write_lock: Mutex<()>,
}

impl QdrantStore {
    /// Connect to Qdrant and make sure the collection exists.
    pub async fn connect(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| Error::Connection(format!("Invalid Qdrant URL {}: {}", url, e)))?;
        client
            .health_check()
            .await
            .map_err(|e| Error::Connection(format!("Qdrant at {} unreachable: {}", url, e)))?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension,
            write_lock: Mutex::new(()),
        };
        store.init_collection().await?;
        Ok(store)
    }

    async fn init_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(store_err)?;

        if !exists {
            info!("Creating collection '{}'", self.collection);
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(store_err)?;
        } else {
            debug!("Collection '{}' already exists", self.collection);
        }
        Ok(())
    }

    async fn points_count(&self) -> Result<usize> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(store_err)?;
        Ok(info
            .result
            .map(|r| r.points_count.unwrap_or(0))
            .unwrap_or(0) as usize)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn add(&self, vectors: Vec<Vec<f32>>, metadata: Vec<Metadata>) -> Result<()> {
        check_lengths(&vectors, &metadata)?;
        if vectors.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let offset = self.points_count().await?;

        let points: Vec<PointStruct> = vectors
            .into_iter()
            .zip(metadata.iter())
            .enumerate()
            .map(|(i, (vector, meta))| {
                PointStruct::new((offset + i) as u64, vector, to_payload(meta))
            })
            .collect();

        let count = points.len();
        debug!("Upserting {} points to Qdrant", count);
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(store_err)?;

        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<StoredMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(store_err)?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| {
                let index = match point.id?.point_id_options? {
                    PointIdOptions::Num(n) => n as usize,
                    PointIdOptions::Uuid(_) => return None,
                };
                Some(StoredMatch {
                    index,
                    score: point.score,
                    metadata: from_payload(point.payload),
                })
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        self.points_count().await
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(store_err)?;
        self.init_collection().await
    }
}

/// Scalars map one-to-one; arrays and objects are stored as JSON text.
fn to_payload(metadata: &Metadata) -> HashMap<String, QdrantValue> {
    metadata
        .iter()
        .filter_map(|(key, value)| {
            let converted: QdrantValue = match value {
                Value::Null => return None,
                Value::Bool(b) => (*b).into(),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => i.into(),
                    None => n.as_f64().unwrap_or_default().into(),
                },
                Value::String(s) => s.clone().into(),
                other => other.to_string().into(),
            };
            Some((key.clone(), converted))
        })
        .collect()
}

fn from_payload(payload: HashMap<String, QdrantValue>) -> Metadata {
    payload
        .into_iter()
        .map(|(key, value)| {
            let json = if let Some(s) = value.as_str() {
                Value::from(s.as_str())
            } else if let Some(i) = value.as_integer() {
                Value::from(i)
            } else if let Some(f) = value.as_double() {
                Value::from(f)
            } else if let Some(b) = value.as_bool() {
                Value::from(b)
            } else {
                Value::Null
            };
            (key, json)
        })
        .collect()
}
