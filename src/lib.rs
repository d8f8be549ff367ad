//! Hybrid Retrieval-Augmented Generation Library
//!
//! This library provides tools to:
//! - Ingest and clean text, markdown and PDF documents
//! - Chunk documents with fixed, semantic and structural strategies
//! - Embed chunks and index them in a flat or Qdrant vector store
//! - Build a lightweight entity knowledge graph in Neo4j
//! - Combine vector and graph retrieval into one ranked context list
//! - Generate grounded answers with an OpenAI chat model
//! - Evaluate retrieval/generation quality and serve an HTTP API

pub mod chunking;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod evaluation;
pub mod generation;
pub mod ingestion;
pub mod knowledge_graph;
pub mod observability;
pub mod retrieval;
pub mod server;
pub mod vector_store;

// Re-export common types
pub use config::Config;
pub use document::{Document, Metadata};
pub use error::{Error, Result};
pub use retrieval::{ContextItem, HybridRetriever, RetrievalOptions, Source};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
