//! Configuration for the RAG pipeline
//!
//! Loads configuration from config.yml, resolves `${VAR}` placeholders and
//! lets well-known environment variables take precedence.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.7;
pub const DEFAULT_GRAPH_WEIGHT: f32 = 0.3;
pub const DEFAULT_GRAPH_DEPTH: usize = 2;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 4000;
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    data_dir: Option<String>,
    env: Option<String>,
    neo4j: Option<YamlNeo4j>,
    openai: Option<YamlOpenAi>,
    embeddings: Option<YamlEmbeddings>,
    vector_store: Option<YamlVectorStore>,
    retrieval: Option<YamlRetrieval>,
    chunking: Option<YamlChunking>,
    server: Option<YamlServer>,
    evaluation: Option<YamlEvaluation>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlNeo4j {
    uri: Option<String>,
    user: Option<String>,
    password: Option<String>,
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlOpenAi {
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    embedding_model: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlEmbeddings {
    provider: Option<String>,
    dimension: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlVectorStore {
    backend: Option<String>,
    qdrant_url: Option<String>,
    collection: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlRetrieval {
    top_k: Option<usize>,
    vector_weight: Option<f32>,
    graph_weight: Option<f32>,
    graph_depth: Option<usize>,
    max_context_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlChunking {
    max_tokens: Option<usize>,
    overlap: Option<usize>,
    strategies: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlServer {
    addr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlEvaluation {
    test_cases: Option<String>,
    min_coverage: Option<f32>,
    min_success_rate: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub embedding_model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsConfig {
    /// `local` (alias `hf`) or `openai`
    pub provider: String,
    pub dimension: usize,
}

#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// `flat` or `qdrant`
    pub backend: String,
    pub qdrant_url: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub vector_weight: f32,
    pub graph_weight: f32,
    pub graph_depth: usize,
    pub max_context_chars: usize,
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap: usize,
    pub strategies: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub test_cases: PathBuf,
    pub min_coverage: f32,
    pub min_success_rate: f32,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub env: String,
    pub neo4j: Neo4jConfig,
    pub openai: OpenAiConfig,
    pub embeddings: EmbeddingsConfig,
    pub vector_store: VectorStoreConfig,
    pub retrieval: RetrievalConfig,
    pub chunking: ChunkingConfig,
    pub server_addr: String,
    pub evaluation: EvaluationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults.
    /// Environment variables take precedence over config.yml values.
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::from_yaml(YamlConfig::default()))
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                let var_name = &v[2..v.len() - 1];
                if let Ok(env_val) = std::env::var(var_name) {
                    return Some(env_val);
                }
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return Some(env_val);
        }
        value.filter(|v| !(v.starts_with("${") && v.ends_with('}')))
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let neo4j = yaml.neo4j.unwrap_or_default();
        let openai = yaml.openai.unwrap_or_default();
        let embeddings = yaml.embeddings.unwrap_or_default();
        let vector_store = yaml.vector_store.unwrap_or_default();
        let retrieval = yaml.retrieval.unwrap_or_default();
        let chunking = yaml.chunking.unwrap_or_default();
        let server = yaml.server.unwrap_or_default();
        let evaluation = yaml.evaluation.unwrap_or_default();

        let data_dir = Self::resolve_env_string(yaml.data_dir, "DATA_DIR")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        Self {
            data_dir: PathBuf::from(data_dir),
            env: Self::resolve_env_string(yaml.env, "ENV").unwrap_or_else(|| "dev".to_string()),
            neo4j: Neo4jConfig {
                uri: Self::resolve_env_string(neo4j.uri, "NEO4J_URI").unwrap_or_default(),
                user: Self::resolve_env_string(neo4j.user, "NEO4J_USER")
                    .unwrap_or_else(|| "neo4j".to_string()),
                password: Self::resolve_env_string(neo4j.password, "NEO4J_PASSWORD")
                    .unwrap_or_default(),
                enabled: neo4j.enabled.unwrap_or(true),
            },
            openai: OpenAiConfig {
                api_key: Self::resolve_env_string(openai.api_key, "OPENAI_API_KEY")
                    .unwrap_or_default(),
                model: openai
                    .model
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                temperature: openai.temperature.unwrap_or(0.2),
                max_tokens: openai.max_tokens.unwrap_or(800),
                embedding_model: openai
                    .embedding_model
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                base_url: openai
                    .base_url
                    .unwrap_or_else(|| OPENAI_API_URL.to_string()),
            },
            embeddings: EmbeddingsConfig {
                provider: Self::resolve_env_string(embeddings.provider, "EMBEDDING_PROVIDER")
                    .unwrap_or_else(|| "local".to_string()),
                dimension: embeddings.dimension.unwrap_or(384),
            },
            vector_store: VectorStoreConfig {
                backend: vector_store.backend.unwrap_or_else(|| "flat".to_string()),
                qdrant_url: Self::resolve_env_string(vector_store.qdrant_url, "QDRANT_URL")
                    .unwrap_or_else(|| "http://localhost:6334".to_string()),
                collection: vector_store
                    .collection
                    .unwrap_or_else(|| "rag_chunks".to_string()),
            },
            retrieval: RetrievalConfig {
                top_k: retrieval.top_k.unwrap_or(DEFAULT_TOP_K),
                vector_weight: retrieval.vector_weight.unwrap_or(DEFAULT_VECTOR_WEIGHT),
                graph_weight: retrieval.graph_weight.unwrap_or(DEFAULT_GRAPH_WEIGHT),
                graph_depth: retrieval.graph_depth.unwrap_or(DEFAULT_GRAPH_DEPTH),
                max_context_chars: retrieval
                    .max_context_chars
                    .unwrap_or(DEFAULT_MAX_CONTEXT_CHARS),
            },
            chunking: ChunkingConfig {
                max_tokens: chunking.max_tokens.unwrap_or(512),
                overlap: chunking.overlap.unwrap_or(50),
                strategies: chunking.strategies.unwrap_or_else(|| {
                    vec![
                        "fixed".to_string(),
                        "semantic".to_string(),
                        "structural".to_string(),
                    ]
                }),
            },
            server_addr: server.addr.unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            evaluation: EvaluationConfig {
                test_cases: PathBuf::from(
                    evaluation
                        .test_cases
                        .unwrap_or_else(|| "evaluation/test_cases.json".to_string()),
                ),
                min_coverage: evaluation.min_coverage.unwrap_or(0.5),
                min_success_rate: evaluation.min_success_rate.unwrap_or(0.6),
            },
        }
    }

    /// Create `data_dir` if it doesn't exist and return it.
    pub fn ensure_data_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn documents_path(&self) -> PathBuf {
        self.data_dir.join("processed").join("documents.jsonl")
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.data_dir.join("processed").join("chunks.jsonl")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("vector_store").join("index.json")
    }

    pub fn monitoring_path(&self) -> PathBuf {
        self.data_dir.join("monitoring").join("stats.json")
    }

    /// Neo4j credentials, failing when the connection parameters are missing.
    pub fn require_neo4j(&self) -> Result<&Neo4jConfig> {
        if self.neo4j.uri.trim().is_empty() {
            return Err(Error::Config("NEO4J_URI not set".to_string()));
        }
        if self.neo4j.password.is_empty() {
            return Err(Error::Config("NEO4J_PASSWORD not set".to_string()));
        }
        Ok(&self.neo4j)
    }

    /// OpenAI API key, failing when it is missing.
    pub fn require_openai_key(&self) -> Result<&str> {
        if self.openai.api_key.trim().is_empty() {
            return Err(Error::Config("OPENAI_API_KEY not set".to_string()));
        }
        Ok(&self.openai.api_key)
    }
}
