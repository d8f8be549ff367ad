//! Knowledge graph: entity extraction, graph construction and queries.

pub mod builder;
pub mod client;
pub mod entity_extractor;
pub mod queries;
pub mod schema;

pub use builder::{BuildStats, GraphBuilder};
pub use client::{params, GraphClient, Neo4jClient, Record};
pub use entity_extractor::{EntityExtractor, ExtractedEntity};
pub use queries::{GraphQueries, GraphStats};
