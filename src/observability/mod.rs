//! Observability context shared by pipeline components.
//!
//! One [`Observability`] is created per process (or per test) and handed to
//! components as `Arc<Observability>`. It owns:
//! - a private Prometheus registry with
//!   `rag_operation_duration_seconds` (histogram),
//!   `rag_operation_total` (counter with status) and
//!   `rag_tokens_total` (counter by model and kind)
//! - latency samples and token usage for the `monitor` report
//!
//! Timing goes through [`Observability::timer`], whose guard records on drop,
//! so every exit path of the timed scope is measured.

pub mod latency;
pub mod tokens;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use prometheus::process_collector::ProcessCollector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use latency::{LatencyStats, LatencyTracker};
pub use tokens::{estimate_tokens, TokenTracker};

/// Samples kept per operation in a persisted snapshot.
const MAX_SNAPSHOT_SAMPLES: usize = latency::MAX_SAMPLES;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Observability {
    registry: Registry,
    duration: HistogramVec,
    total: IntCounterVec,
    tokens: IntCounterVec,
    latency: Mutex<LatencyTracker>,
    token_tracker: Mutex<TokenTracker>,
}

impl Default for Observability {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Observability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observability")
            .field("operations", &lock(&self.latency).samples().len())
            .finish()
    }
}

impl Observability {
    pub fn new() -> Self {
        let registry = Registry::new();

        // Exponential buckets from 5ms up to ~40 seconds.
        let buckets =
            prometheus::exponential_buckets(0.005, 2.0, 14).expect("failed to create histogram buckets");
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "rag_operation_duration_seconds",
                "Pipeline operation duration in seconds",
            )
            .buckets(buckets),
            &["operation"],
        )
        .expect("failed to create duration histogram");
        let total = IntCounterVec::new(
            Opts::new("rag_operation_total", "Pipeline operations by status"),
            &["operation", "status"],
        )
        .expect("failed to create operation counter");
        let tokens = IntCounterVec::new(
            Opts::new("rag_tokens_total", "LLM tokens by operation, model and kind"),
            &["operation", "model", "kind"],
        )
        .expect("failed to create token counter");

        registry
            .register(Box::new(duration.clone()))
            .expect("failed to register duration histogram");
        registry
            .register(Box::new(total.clone()))
            .expect("failed to register operation counter");
        registry
            .register(Box::new(tokens.clone()))
            .expect("failed to register token counter");
        if let Err(err) = registry.register(Box::new(ProcessCollector::for_self())) {
            warn!("Failed to register process collector: {}", err);
        }

        Self {
            registry,
            duration,
            total,
            tokens,
            latency: Mutex::new(LatencyTracker::new()),
            token_tracker: Mutex::new(TokenTracker::new()),
        }
    }

    /// Start timing `operation`; the sample is recorded when the guard drops.
    pub fn timer(&self, operation: &str) -> ScopedTimer<'_> {
        ScopedTimer {
            obs: self,
            operation: operation.to_string(),
            start: Instant::now(),
            success: true,
        }
    }

    pub fn record(&self, operation: &str, elapsed: Duration, success: bool) {
        let secs = elapsed.as_secs_f64();
        lock(&self.latency).record(operation, secs);
        self.duration.with_label_values(&[operation]).observe(secs);
        self.total
            .with_label_values(&[operation, if success { "ok" } else { "error" }])
            .inc();
        debug!("[LATENCY] {}: {:.3}s", operation, secs);
    }

    pub fn record_tokens(&self, operation: &str, model: &str, prompt: u64, completion: u64) {
        lock(&self.token_tracker).track_usage(operation, model, prompt, completion);
        self.tokens
            .with_label_values(&[operation, model, "prompt"])
            .inc_by(prompt);
        self.tokens
            .with_label_values(&[operation, model, "completion"])
            .inc_by(completion);
        debug!(operation, model, prompt, completion, "Tracked token usage");
    }

    pub fn count_tokens(&self, text: &str, model: &str) -> usize {
        lock(&self.token_tracker).count_tokens(text, model)
    }

    pub fn latency_stats(&self, operation: &str) -> LatencyStats {
        lock(&self.latency).stats(operation)
    }

    pub fn all_latency_stats(&self) -> BTreeMap<String, LatencyStats> {
        lock(&self.latency).all_stats()
    }

    pub fn token_usage(&self, operation: &str) -> BTreeMap<String, u64> {
        lock(&self.token_tracker).usage(operation)
    }

    pub fn estimate_cost(&self, operation: &str, model: &str) -> f64 {
        lock(&self.token_tracker).estimate_cost(operation, model)
    }

    /// Clear trackers and Prometheus series.
    pub fn reset(&self) {
        lock(&self.latency).reset();
        lock(&self.token_tracker).reset();
        self.duration.reset();
        self.total.reset();
        self.tokens.reset();
        info!("Observability state reset");
    }

    /// Prometheus text exposition of this context's registry.
    pub fn render_prometheus(&self) -> Result<(String, String)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| Error::Serialization(format!("Failed to encode metrics: {}", e)))?;
        let text = String::from_utf8(buffer)
            .map_err(|e| Error::Serialization(format!("Metrics are not UTF-8: {}", e)))?;
        Ok((encoder.format_type().to_string(), text))
    }

    pub fn snapshot(&self) -> MonitoringSnapshot {
        MonitoringSnapshot {
            updated_at: Some(Utc::now()),
            latency_samples: lock(&self.latency).samples().clone(),
            token_usage: lock(&self.token_tracker).all_usage().clone(),
        }
    }

    /// Merge this run into the snapshot stored at `path` and write it back.
    pub fn save_snapshot(&self, path: &Path) -> Result<MonitoringSnapshot> {
        let mut stored = load_snapshot(path)?;
        stored.merge(self.snapshot());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&stored)?)?;
        debug!(path = %path.display(), "Saved monitoring snapshot");
        Ok(stored)
    }
}

/// Read a persisted snapshot; a missing file is an empty snapshot.
pub fn load_snapshot(path: &Path) -> Result<MonitoringSnapshot> {
    if !path.exists() {
        return Ok(MonitoringSnapshot::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Remove the persisted snapshot, if any.
pub fn clear_snapshot(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Guard returned by [`Observability::timer`].
pub struct ScopedTimer<'a> {
    obs: &'a Observability,
    operation: String,
    start: Instant,
    success: bool,
}

impl ScopedTimer<'_> {
    /// Record this scope with status `error`.
    pub fn mark_failed(&mut self) {
        self.success = false;
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.obs
            .record(&self.operation, self.start.elapsed(), self.success);
    }
}

/// Latency samples and token usage, accumulated across runs.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSnapshot {
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latency_samples: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub token_usage: BTreeMap<String, BTreeMap<String, u64>>,
}

impl MonitoringSnapshot {
    pub fn merge(&mut self, other: MonitoringSnapshot) {
        for (op, samples) in other.latency_samples {
            let entry = self.latency_samples.entry(op).or_default();
            entry.extend(samples);
            if entry.len() > MAX_SNAPSHOT_SAMPLES {
                let excess = entry.len() - MAX_SNAPSHOT_SAMPLES;
                entry.drain(..excess);
            }
        }
        for (op, usage) in other.token_usage {
            let entry = self.token_usage.entry(op).or_default();
            for (key, count) in usage {
                *entry.entry(key).or_default() += count;
            }
        }
        if other.updated_at.is_some() {
            self.updated_at = other.updated_at;
        }
    }

    pub fn latency_stats(&self) -> BTreeMap<String, LatencyStats> {
        self.latency_samples
            .iter()
            .map(|(op, s)| (op.clone(), latency::summarize(s)))
            .collect()
    }

    pub fn estimate_cost(&self, operation: &str, model: &str) -> f64 {
        self.token_usage
            .get(operation)
            .map(|usage| tokens::cost_for(usage, model))
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.latency_samples.is_empty() && self.token_usage.is_empty()
    }
}
