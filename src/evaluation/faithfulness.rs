//! Checks whether an answer is supported by its context.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));

const SIMILARITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaithfulnessReport {
    pub faithful: bool,
    pub unsupported_claims: Vec<String>,
    pub score: f64,
    pub total_sentences: usize,
    pub supported_sentences: usize,
}

impl FaithfulnessReport {
    fn rejected(reason: &str) -> Self {
        Self {
            faithful: false,
            unsupported_claims: vec![reason.to_string()],
            score: 0.0,
            total_sentences: 0,
            supported_sentences: 0,
        }
    }
}

pub fn check_faithfulness<S: AsRef<str>>(answer: &str, contexts: &[S]) -> FaithfulnessReport {
    if answer.trim().is_empty() {
        return FaithfulnessReport::rejected("Empty answer");
    }
    if contexts.is_empty() {
        return FaithfulnessReport::rejected("No context provided");
    }

    let contexts: Vec<String> = contexts.iter().map(|c| c.as_ref().to_lowercase()).collect();
    let sentences: Vec<&str> = SENTENCE_END_RE
        .split(answer)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut unsupported_claims = Vec::new();
    for sentence in &sentences {
        if !is_supported(sentence, &contexts) {
            unsupported_claims.push(sentence.to_string());
        }
    }

    let supported_sentences = sentences.len() - unsupported_claims.len();
    let score = if sentences.is_empty() {
        0.0
    } else {
        supported_sentences as f64 / sentences.len() as f64
    };

    debug!(
        "Faithfulness check: {}/{} sentences supported",
        supported_sentences,
        sentences.len()
    );

    FaithfulnessReport {
        faithful: unsupported_claims.is_empty(),
        unsupported_claims,
        score,
        total_sentences: sentences.len(),
        supported_sentences,
    }
}

/// Substring, near-duplicate or shared three-word phrase.
fn is_supported(sentence: &str, contexts_lower: &[String]) -> bool {
    let sentence = sentence.to_lowercase();
    let words: Vec<&str> = sentence.split_whitespace().collect();

    contexts_lower.iter().any(|context| {
        context.contains(&sentence)
            || similarity_ratio(&sentence, context) > SIMILARITY_THRESHOLD
            || words
                .windows(3)
                .any(|phrase| context.contains(&phrase.join(" ")))
    })
}

/// `2*M/T` where `M` counts characters in recursively matched longest
/// common blocks and `T` is the combined length.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + len..], &b[start_b + len..])
}

/// Leftmost longest common substring as `(start_a, start_b, len)`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for i in 0..a.len() {
        for j in 0..b.len() {
            curr[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            if curr[j + 1] > best.2 {
                best = (i + 1 - curr[j + 1], j + 1 - curr[j + 1], curr[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_is_unfaithful() {
        let report = check_faithfulness("   ", &["context"]);
        assert!(!report.faithful);
        assert_eq!(report.unsupported_claims, vec!["Empty answer"]);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn missing_context_is_unfaithful() {
        let report = check_faithfulness::<&str>("Something.", &[]);
        assert_eq!(report.unsupported_claims, vec!["No context provided"]);
    }

    #[test]
    fn substring_sentences_are_supported() {
        let report = check_faithfulness(
            "Billing is owned by Finance. The moon is cheese!",
            &["Per policy, BILLING IS OWNED BY FINANCE and audited yearly."],
        );

        assert!(!report.faithful);
        assert_eq!(report.total_sentences, 2);
        assert_eq!(report.supported_sentences, 1);
        assert_eq!(report.unsupported_claims, vec!["The moon is cheese"]);
        assert!((report.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn shared_three_word_phrase_supports_sentence() {
        let report = check_faithfulness(
            "In short the security team reviews access quarterly",
            &["Every quarter the security team reviews all grants."],
        );
        assert!(report.faithful);
    }

    #[test]
    fn near_duplicate_sentence_is_supported() {
        let report = check_faithfulness("Data retention policx", &["data retention policy"]);
        assert!(report.faithful);
    }

    #[test]
    fn similarity_ratio_matches_known_values() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", "abc"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        // "abcd" vs "bcde": one block "bcd", 2*3/8.
        assert!((similarity_ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
    }
}
