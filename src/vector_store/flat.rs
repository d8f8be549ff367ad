//! Exact in-process vector index.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{check_lengths, StoredMatch, VectorStore};
use crate::document::Metadata;
use crate::error::{Error, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FlatState {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
    metadata: Vec<Metadata>,
}

/// Brute-force cosine index. `add` takes the write lock, so it never
/// overlaps a `search`.
#[derive(Debug, Default)]
pub struct FlatIndex {
    state: RwLock<FlatState>,
    path: Option<PathBuf>,
}

impl FlatIndex {
    /// Empty, memory-only index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index bound to `path`, loaded from it when the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let state: FlatState = serde_json::from_reader(reader)?;
            if state.vectors.len() != state.metadata.len() {
                return Err(Error::VectorStore(format!(
                    "Corrupt index {}: {} vectors, {} metadata records",
                    path.display(),
                    state.vectors.len(),
                    state.metadata.len()
                )));
            }
            info!(path = %path.display(), vectors = state.vectors.len(), "Loaded vector index");
            state
        } else {
            FlatState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    /// Write the index as JSON while holding an exclusive lock on `<path>.lock`.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| Error::Lock(format!("Failed to open lock file: {}", e)))?;
        lock_file.try_lock_exclusive().map_err(|_| {
            Error::Lock(format!(
                "Vector index {} is being written by another process",
                path.display()
            ))
        })?;

        let state = self.state.read().await;
        let result = (|| -> Result<()> {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer(&mut writer, &*state)?;
            writer.flush()?;
            Ok(())
        })();

        let _ = lock_file.unlock();
        let _ = fs::remove_file(&lock_path);
        result?;

        debug!(path = %path.display(), vectors = state.vectors.len(), "Saved vector index");
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FlatIndex {
    async fn add(&self, vectors: Vec<Vec<f32>>, metadata: Vec<Metadata>) -> Result<()> {
        check_lengths(&vectors, &metadata)?;

        let mut state = self.state.write().await;
        let Some(first) = vectors.first() else {
            return Ok(());
        };

        // Whole batch is checked before the index is touched.
        let dim = state.dimension.unwrap_or(first.len());
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::InvalidArgument(format!(
                "Vector dimension {} does not match index dimension {}",
                bad.len(),
                dim
            )));
        }

        state.dimension = Some(dim);
        state.vectors.extend(vectors);
        state.metadata.extend(metadata);
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<StoredMatch>> {
        let state = self.state.read().await;
        if k == 0 || state.vectors.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(dim) = state.dimension {
            if dim != vector.len() {
                return Err(Error::VectorStore(format!(
                    "Query dimension {} does not match index dimension {}",
                    vector.len(),
                    dim
                )));
            }
        }

        let mut scored: Vec<(usize, f32)> = state
            .vectors
            .iter()
            .enumerate()
            .map(|(i, stored)| (i, cosine_similarity(vector, stored)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(index, score)| StoredMatch {
                index,
                score,
                metadata: state.metadata[index].clone(),
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.state.read().await.vectors.len())
    }

    async fn clear(&self) -> Result<()> {
        *self.state.write().await = FlatState::default();
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save(path).await,
            None => Ok(()),
        }
    }
}

/// Cosine similarity; 0 for empty, zero or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
