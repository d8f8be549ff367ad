//! PDF loading, one document per page with extractable text.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{Document, Metadata};
use crate::error::Result;

/// Load every page of `path` that yields text. Pages are numbered from 0 in
/// `metadata.page`; pages whose text cannot be extracted are skipped.
pub fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    let pdf = lopdf::Document::load(path)?;
    let source = path.to_string_lossy().into_owned();

    let mut docs = Vec::new();
    for (index, page_number) in pdf.get_pages().into_keys().enumerate() {
        let text = match pdf.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(err) => {
                warn!(source = %source, page = index, "Failed to extract page text: {}", err);
                continue;
            }
        };
        if text.trim().is_empty() {
            debug!(source = %source, page = index, "Skipping page without text");
            continue;
        }

        let mut metadata = Metadata::new();
        metadata.insert("source".into(), Value::from(source.clone()));
        metadata.insert("page".into(), Value::from(index));
        docs.push(Document::new(text, metadata));
    }

    Ok(docs)
}
