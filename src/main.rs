//! Hybrid RAG CLI - main entry point
//!
//! One subcommand per pipeline stage, plus evaluation, monitoring and the
//! HTTP API.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use hybrid_rag::commands::{self, query::RetrieveArgs};
use hybrid_rag::observability::Observability;
use hybrid_rag::server::{self, AppState};
use hybrid_rag::Config;
use tracing::{error, warn};

#[derive(Parser)]
#[command(name = "hybrid_rag")]
#[command(about = "Hybrid vector + knowledge-graph question answering", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (default: ./config.yml when present)
    #[arg(long, env = "RAG_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load raw .txt/.md files into documents.jsonl
    Ingest,

    /// Split documents into chunks.jsonl
    Chunk {
        /// Chunking strategies: fixed, semantic, structural (repeatable)
        #[arg(short, long = "strategy")]
        strategies: Vec<String>,
    },

    /// Embed chunks and build the vector index
    Index,

    /// Extract entities from chunks into the knowledge graph
    GraphBuild,

    /// Print knowledge graph statistics
    GraphCheck {
        /// Show related entities and mentioning documents for this entity
        #[arg(short, long)]
        entity: Option<String>,

        /// Maximum rows per listing
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Run hybrid retrieval and print the ranked context
    Retrieve {
        query: String,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        #[arg(long)]
        vector_weight: Option<f32>,

        #[arg(long)]
        graph_weight: Option<f32>,

        /// Graph traversal depth
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Answer a question from retrieved context
    Generate { question: String },

    /// Run retrieval and generation metrics over test cases
    Evaluate {
        #[arg(long)]
        test_cases: Option<PathBuf>,

        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show recorded latency and token usage
    Monitor {
        /// Clear recorded data
        #[arg(long, default_value_t = false)]
        reset: bool,
    },

    /// Check expected keywords in answers; fails below the success rate
    RegressionTest {
        #[arg(long)]
        test_cases: Option<PathBuf>,

        #[arg(long)]
        min_success_rate: Option<f64>,
    },

    /// Serve the HTTP API
    Serve {
        /// Listen address (default from config, 0.0.0.0:8000)
        #[arg(long, env = "SERVER_ADDR")]
        addr: Option<String>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest => "ingest",
            Commands::Chunk { .. } => "chunk",
            Commands::Index => "index",
            Commands::GraphBuild => "graph_build",
            Commands::GraphCheck { .. } => "graph_check",
            Commands::Retrieve { .. } => "retrieve",
            Commands::Generate { .. } => "generate",
            Commands::Evaluate { .. } => "evaluate",
            Commands::Monitor { .. } => "monitor",
            Commands::RegressionTest { .. } => "regression_test",
            Commands::Serve { .. } => "serve",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    let filter = match "hybrid_rag=info".parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{}", err);
                return ExitCode::from(2);
            }
        },
        None => Config::new(),
    };

    // `monitor` reports on earlier runs and is not itself recorded.
    let record = !matches!(cli.command, Commands::Monitor { .. });
    let obs = Arc::new(Observability::new());
    let command_name = format!("command.{}", cli.command.name());

    let result = {
        let mut timer = obs.timer(&command_name);
        let result = execute_command(cli.command, &config, obs.clone()).await;
        if result.is_err() {
            timer.mark_failed();
        }
        result
    };

    if record {
        if let Err(err) = obs.save_snapshot(&config.monitoring_path()) {
            warn!("Failed to save monitoring data: {}", err);
        }
    }

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn execute_command(
    command: Commands,
    config: &Config,
    obs: Arc<Observability>,
) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Ingest => {
            commands::pipeline::ingest(config)?;
        }
        Commands::Chunk { strategies } => {
            commands::pipeline::chunk(config, &strategies)?;
        }
        Commands::Index => {
            commands::pipeline::index(config).await?;
        }
        Commands::GraphBuild => {
            commands::graph::build(config).await?;
        }
        Commands::GraphCheck { entity, limit } => {
            commands::graph::check(config, entity.as_deref(), limit).await?;
        }
        Commands::Retrieve {
            query,
            top_k,
            vector_weight,
            graph_weight,
            depth,
        } => {
            let args = RetrieveArgs {
                top_k,
                vector_weight,
                graph_weight,
                depth,
            };
            commands::query::retrieve(config, obs, &query, args).await?;
        }
        Commands::Generate { question } => {
            commands::query::generate(config, obs, &question).await?;
        }
        Commands::Evaluate { test_cases, output } => {
            let test_cases = test_cases.unwrap_or_else(|| config.evaluation.test_cases.clone());
            commands::evaluate_run(config, obs, &test_cases, output.as_deref()).await?;
        }
        Commands::Monitor { reset } => {
            commands::monitor_run(&config.monitoring_path(), reset)?;
        }
        Commands::RegressionTest {
            test_cases,
            min_success_rate,
        } => {
            let test_cases = test_cases.unwrap_or_else(|| config.evaluation.test_cases.clone());
            let threshold =
                min_success_rate.unwrap_or(config.evaluation.min_success_rate as f64);
            let summary = commands::regression_test_run(config, obs, &test_cases).await?;
            if !summary.passes(threshold) {
                error!(
                    "Regression success rate {:.2} is below {:.2}",
                    summary.success_rate, threshold
                );
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server_addr.clone());
            let socket: SocketAddr = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid server address {}: {}", addr, e))?;
            let generator = commands::build_generator(config, obs.clone()).await?;
            server::serve(
                socket,
                AppState {
                    generator: Arc::new(generator),
                    obs,
                },
            )
            .await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
