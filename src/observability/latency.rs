use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Most recent samples kept per operation.
pub const MAX_SAMPLES: usize = 1000;

/// Latency samples in seconds, per operation. Older samples are dropped once
/// an operation holds [`MAX_SAMPLES`].
#[derive(Debug, Default, Clone)]
pub struct LatencyTracker {
    samples: BTreeMap<String, Vec<f64>>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, operation: &str, seconds: f64) {
        let samples = self.samples.entry(operation.to_string()).or_default();
        samples.push(seconds);
        if samples.len() > MAX_SAMPLES {
            let excess = samples.len() - MAX_SAMPLES;
            samples.drain(..excess);
        }
    }

    /// Zeroed stats for operations never recorded.
    pub fn stats(&self, operation: &str) -> LatencyStats {
        self.samples
            .get(operation)
            .map(|s| summarize(s))
            .unwrap_or_default()
    }

    pub fn all_stats(&self) -> BTreeMap<String, LatencyStats> {
        self.samples
            .iter()
            .map(|(op, s)| (op.clone(), summarize(s)))
            .collect()
    }

    pub fn samples(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.samples
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

pub(crate) fn summarize(samples: &[f64]) -> LatencyStats {
    if samples.is_empty() {
        return LatencyStats::default();
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    LatencyStats {
        count: n,
        mean: sorted.iter().sum::<f64>() / n as f64,
        median,
        min: sorted[0],
        max: sorted[n - 1],
    }
}
