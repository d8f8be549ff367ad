//! Retrieval and answer quality metrics.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can", "shall",
];

/// Fraction of distinct gold contents that were retrieved.
pub fn context_recall(retrieved: &[String], gold: &[String]) -> f64 {
    if gold.is_empty() {
        warn!("No gold chunks provided for recall calculation");
        return 0.0;
    }

    let retrieved: HashSet<&str> = retrieved.iter().map(String::as_str).collect();
    let gold: HashSet<&str> = gold.iter().map(String::as_str).collect();
    let matching = retrieved.intersection(&gold).count();
    let recall = matching as f64 / gold.len() as f64;

    debug!("Context recall: {}/{} = {:.3}", matching, gold.len(), recall);
    recall
}

/// Distinct relevant contents over the number of retrieved items.
pub fn context_precision(retrieved: &[String], gold: &[String]) -> f64 {
    if retrieved.is_empty() {
        warn!("No retrieved chunks for precision calculation");
        return 0.0;
    }

    let retrieved_set: HashSet<&str> = retrieved.iter().map(String::as_str).collect();
    let gold: HashSet<&str> = gold.iter().map(String::as_str).collect();
    let matching = retrieved_set.intersection(&gold).count();
    let precision = matching as f64 / retrieved.len() as f64;

    debug!("Context precision: {}/{} = {:.3}", matching, retrieved.len(), precision);
    precision
}

fn content_words(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Share of the question's content words that the answer repeats.
pub fn answer_relevance(answer: &str, question: &str) -> f64 {
    if answer.is_empty() || question.is_empty() {
        return 0.0;
    }

    let question_words = content_words(question);
    if question_words.is_empty() {
        return 0.0;
    }
    let answer_words = content_words(answer);

    let overlap = question_words.intersection(&answer_words).count();
    let relevance = overlap as f64 / question_words.len() as f64;

    debug!("Answer relevance: {}/{} = {:.3}", overlap, question_words.len(), relevance);
    relevance.min(1.0)
}

pub fn calculate_f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
