//! Plain-text loading and normalisation.

use std::fs;
use std::path::Path;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::document::{Document, Metadata};
use crate::error::Result;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Load a `.txt`/`.md` file as a single document tagged with its source path.
pub fn load_text(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)?;
    let mut metadata = Metadata::new();
    metadata.insert(
        "source".into(),
        Value::from(path.to_string_lossy().into_owned()),
    );
    Ok(Document::new(content, metadata))
}

/// Collapse whitespace runs, drop NUL characters and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUN
        .replace_all(text, " ")
        .replace('\0', "")
        .trim()
        .to_string()
}

/// Stamp metadata with the ingestion time (UTC, ISO-8601).
pub fn enrich_metadata(mut metadata: Metadata) -> Metadata {
    metadata.insert(
        "ingested_at".into(),
        Value::from(Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
    );
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace_and_strips_nul() {
        assert_eq!(clean_text("  a\n\n b\t\tc \0 "), "a b c");
        assert_eq!(clean_text("x\0y"), "xy");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn enrich_metadata_adds_timestamp() {
        let meta = enrich_metadata(Metadata::new());
        let stamp = meta["ingested_at"].as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn load_text_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Title\nBody").unwrap();

        let doc = load_text(&path).unwrap();

        assert_eq!(doc.content, "# Title\nBody");
        assert_eq!(
            doc.metadata["source"].as_str().unwrap(),
            path.to_string_lossy()
        );
    }
}
