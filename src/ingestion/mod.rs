//! Document ingestion: raw files in, cleaned `documents.jsonl` out.

pub mod pdf;
pub mod text;

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{write_jsonl, Document};
use crate::error::Result;

pub use pdf::load_pdf;
pub use text::{clean_text, enrich_metadata, load_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Text,
    Pdf,
}

fn file_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "txt" | "md" => Some(FileKind::Text),
        "pdf" => Some(FileKind::Pdf),
        _ => None,
    }
}

/// Load every `.txt`, `.md` and `.pdf` file directly under `raw_dir`, clean
/// and enrich each document, then write the result to `out_file`. A PDF that
/// cannot be parsed is logged and skipped.
pub fn ingest(raw_dir: &Path, out_file: &Path) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    if raw_dir.exists() {
        for entry in WalkDir::new(raw_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| crate::Error::Io(e.into()))?;
            let path = entry.path();
            let kind = match file_kind(path) {
                Some(kind) if entry.file_type().is_file() => kind,
                _ => {
                    debug!(path = %path.display(), "Skipping unsupported file");
                    continue;
                }
            };

            let docs = match kind {
                FileKind::Text => vec![load_text(path)?],
                FileKind::Pdf => match load_pdf(path) {
                    Ok(docs) => docs,
                    Err(e) => {
                        warn!(path = %path.display(), "Skipping unreadable PDF: {}", e);
                        continue;
                    }
                },
            };

            for mut doc in docs {
                doc.content = clean_text(&doc.content);
                doc.metadata = enrich_metadata(doc.metadata);
                documents.push(doc);
            }
        }
    }

    info!("Ingested {} documents", documents.len());
    write_jsonl(out_file, &documents)?;

    Ok(documents)
}
