//! End-to-end evaluation over a JSON file of test cases.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::faithfulness::{check_faithfulness, FaithfulnessReport};
use super::metrics::{answer_relevance, calculate_f1, context_precision, context_recall, mean};
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::retrieval::{HybridRetriever, RetrievalOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub question: String,
    #[serde(default)]
    pub gold_context: Vec<String>,
    #[serde(default)]
    pub expected_answer_keywords: Vec<String>,
}

impl TestCase {
    /// The explicit id, or `q_<n>` from the 0-based position.
    pub fn id_or(&self, position: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("q_{}", position + 1))
    }
}

pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    let raw = fs::read_to_string(path)?;
    let cases: Vec<TestCase> = serde_json::from_str(&raw)?;
    info!("Loaded {} test cases from {}", cases.len(), path.display());
    Ok(cases)
}

/// Case-insensitive keyword hits, in keyword order.
pub fn split_keywords<'a>(answer: &str, keywords: &'a [String]) -> (Vec<&'a String>, Vec<&'a String>) {
    let answer = answer.to_lowercase();
    keywords
        .iter()
        .partition(|kw| answer.contains(&kw.to_lowercase()))
}

pub fn keyword_coverage(found: usize, expected: usize) -> f64 {
    if expected == 0 {
        0.0
    } else {
        found as f64 / expected as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub question_id: String,
    pub question: String,
    pub recall: f64,
    pub precision: f64,
    pub f1: f64,
    pub retrieved_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalSummary {
    pub mean_recall: f64,
    pub mean_precision: f64,
    pub mean_f1: f64,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalReport {
    pub individual_results: Vec<RetrievalResult>,
    pub summary: RetrievalSummary,
}

pub async fn evaluate_retrieval(
    retriever: &HybridRetriever,
    options: &RetrievalOptions,
    cases: &[TestCase],
) -> RetrievalReport {
    info!("Starting retrieval evaluation...");
    let mut results = Vec::with_capacity(cases.len());

    for (i, case) in cases.iter().enumerate() {
        debug!("Evaluating retrieval for question {}: {}", i + 1, case.question);

        let retrieved: Vec<String> = retriever
            .retrieve(&case.question, options)
            .await
            .into_iter()
            .map(|item| item.content)
            .collect();

        let recall = context_recall(&retrieved, &case.gold_context);
        let precision = context_precision(&retrieved, &case.gold_context);

        results.push(RetrievalResult {
            question_id: case.id_or(i),
            question: case.question.clone(),
            recall,
            precision,
            f1: calculate_f1(precision, recall),
            retrieved_count: retrieved.len(),
        });
    }

    let collect = |f: fn(&RetrievalResult) -> f64| results.iter().map(f).collect::<Vec<_>>();
    let summary = RetrievalSummary {
        mean_recall: mean(&collect(|r| r.recall)),
        mean_precision: mean(&collect(|r| r.precision)),
        mean_f1: mean(&collect(|r| r.f1)),
        total_questions: results.len(),
    };

    RetrievalReport {
        individual_results: results,
        summary,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    pub relevance: f64,
    pub faithfulness: FaithfulnessReport,
    pub keyword_coverage: f64,
    pub found_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub mean_relevance: f64,
    pub mean_faithfulness: f64,
    pub mean_keyword_coverage: f64,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub individual_results: Vec<GenerationResult>,
    pub summary: GenerationSummary,
}

/// Cases whose generation fails are logged and left out of the report.
pub async fn evaluate_generation(generator: &AnswerGenerator, cases: &[TestCase]) -> GenerationReport {
    info!("Starting generation evaluation...");
    let mut results = Vec::with_capacity(cases.len());

    for (i, case) in cases.iter().enumerate() {
        debug!("Evaluating generation for question {}: {}", i + 1, case.question);

        let (answer, context) = match generator.answer_with_context(&case.question).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("Error evaluating generation for question {}: {}", i + 1, e);
                continue;
            }
        };

        let contents: Vec<&str> = context.iter().map(|c| c.content.as_str()).collect();
        let (found, _) = split_keywords(&answer, &case.expected_answer_keywords);

        results.push(GenerationResult {
            question_id: case.id_or(i),
            question: case.question.clone(),
            relevance: answer_relevance(&answer, &case.question),
            faithfulness: check_faithfulness(&answer, &contents),
            keyword_coverage: keyword_coverage(found.len(), case.expected_answer_keywords.len()),
            found_keywords: found.into_iter().cloned().collect(),
            answer,
        });
    }

    let collect = |f: fn(&GenerationResult) -> f64| results.iter().map(f).collect::<Vec<_>>();
    let summary = GenerationSummary {
        mean_relevance: mean(&collect(|r| r.relevance)),
        mean_faithfulness: mean(&collect(|r| r.faithfulness.score)),
        mean_keyword_coverage: mean(&collect(|r| r.keyword_coverage)),
        total_questions: results.len(),
    };

    GenerationReport {
        individual_results: results,
        summary,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub test_cases_file: PathBuf,
    pub total_test_cases: usize,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub retrieval: RetrievalReport,
    pub generation: GenerationReport,
    pub metadata: ReportMetadata,
}

/// Run both evaluations; write the report as pretty JSON when `output`
/// is given.
pub async fn run_evaluation(
    generator: &AnswerGenerator,
    test_file: &Path,
    output: Option<&Path>,
) -> Result<EvaluationReport> {
    info!("Starting comprehensive RAG evaluation...");
    let cases = load_test_cases(test_file)?;

    let retrieval = evaluate_retrieval(generator.retriever(), generator.options(), &cases).await;
    let generation = evaluate_generation(generator, &cases).await;

    let report = EvaluationReport {
        retrieval,
        generation,
        metadata: ReportMetadata {
            test_cases_file: test_file.to_path_buf(),
            total_test_cases: cases.len(),
            generated_at: Utc::now().to_rfc3339(),
        },
    };

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Results saved to {}", path.display());
    }

    info!("Evaluation completed successfully");
    Ok(report)
}
