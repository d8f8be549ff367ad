//! Document record shared by ingestion, chunking and indexing.
//!
//! Documents travel between pipeline stages as JSON Lines: one
//! `{"content": ..., "metadata": {...}}` object per line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;

/// Opaque key/value metadata attached to documents and retrieval records.
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Copy of this document's metadata with chunk bookkeeping added.
    pub fn chunk_metadata(&self, chunk_type: &str, token_count: usize) -> Metadata {
        let mut metadata = self.metadata.clone();
        metadata.insert("chunk_type".into(), Value::from(chunk_type));
        metadata.insert("token_count".into(), Value::from(token_count));
        metadata
    }
}

/// Read documents from a JSONL file, skipping malformed lines.
pub fn read_jsonl(path: &Path) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(path)?);
    let mut documents = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(&line) {
            Ok(doc) => documents.push(doc),
            Err(err) => warn!(
                path = %path.display(),
                line = line_no + 1,
                "Skipping malformed document line: {}",
                err
            ),
        }
    }

    Ok(documents)
}

/// Write documents to a JSONL file, replacing previous content.
pub fn write_jsonl(path: &Path, documents: &[Document]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for doc in documents {
        serde_json::to_writer(&mut writer, doc)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chunk_metadata_keeps_parent_fields() {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!("policy.md"));
        let doc = Document::new("text", metadata);

        let chunk_meta = doc.chunk_metadata("fixed", 12);

        assert_eq!(chunk_meta["source"], json!("policy.md"));
        assert_eq!(chunk_meta["chunk_type"], json!("fixed"));
        assert_eq!(chunk_meta["token_count"], json!(12));
        assert!(!doc.metadata.contains_key("chunk_type"));
    }

    #[test]
    fn jsonl_write_then_read_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("docs.jsonl");

        write_jsonl(
            &path,
            &[
                Document::new("first", Metadata::new()),
                Document::new("second", Metadata::new()),
            ],
        )
        .unwrap();

        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("not json\n\n");
        std::fs::write(&path, raw).unwrap();

        let docs = read_jsonl(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].content, "second");
    }

    #[test]
    fn missing_metadata_defaults_to_empty() {
        let doc: Document = serde_json::from_str(r#"{"content": "bare"}"#).unwrap();
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn read_jsonl_missing_file_is_io_error() {
        let err = read_jsonl(Path::new("/nonexistent/chunks.jsonl")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
