//! Token accounting and cost estimates.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::chunking::TokenCounter;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

/// Prompt and completion price per 1K tokens, in USD.
pub fn cost_per_1k(model: &str) -> (f64, f64) {
    match model {
        "gpt-4o-mini" => (0.00015, 0.0006),
        "gpt-4o" => (0.005, 0.015),
        "gpt-3.5-turbo" => (0.0005, 0.0015),
        _ => (0.001, 0.002),
    }
}

/// Rough token estimate for when no encoder is available.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let words = WORD_RE.find_iter(text).count();
    let punctuation = text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();

    let estimated = text.chars().count() as f64 / 4.0 + words as f64 * 0.1 + punctuation as f64 * 0.5;
    estimated.floor() as usize
}

/// Per-operation counters keyed `<model>_prompt`, `<model>_completion` and
/// `<model>_total`.
#[derive(Debug, Default, Clone)]
pub struct TokenTracker {
    usage: BTreeMap<String, BTreeMap<String, u64>>,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens in `text` for `model`'s encoding.
    pub fn count_tokens(&self, text: &str, model: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let counter = TokenCounter::new(model);
        if counter.has_encoder() {
            counter.count(text)
        } else {
            estimate_tokens(text)
        }
    }

    pub fn track_usage(
        &mut self,
        operation: &str,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) {
        let entry = self.usage.entry(operation.to_string()).or_default();
        *entry.entry(format!("{}_prompt", model)).or_default() += prompt_tokens;
        *entry.entry(format!("{}_completion", model)).or_default() += completion_tokens;
        *entry.entry(format!("{}_total", model)).or_default() += prompt_tokens + completion_tokens;
    }

    pub fn usage(&self, operation: &str) -> BTreeMap<String, u64> {
        self.usage.get(operation).cloned().unwrap_or_default()
    }

    pub fn all_usage(&self) -> &BTreeMap<String, BTreeMap<String, u64>> {
        &self.usage
    }

    pub fn estimate_cost(&self, operation: &str, model: &str) -> f64 {
        cost_for(&self.usage(operation), model)
    }

    pub fn reset(&mut self) {
        self.usage.clear();
    }
}

pub(crate) fn cost_for(usage: &BTreeMap<String, u64>, model: &str) -> f64 {
    let (prompt_rate, completion_rate) = cost_per_1k(model);
    let prompt = usage.get(&format!("{}_prompt", model)).copied().unwrap_or(0);
    let completion = usage.get(&format!("{}_completion", model)).copied().unwrap_or(0);
    (prompt as f64 * prompt_rate + completion as f64 * completion_rate) / 1000.0
}
