//! Keyword-coverage regression suite for prompt changes.

use serde::Serialize;
use tracing::{error, info, warn};

use super::runner::{keyword_coverage, split_keywords, TestCase};
use crate::generation::AnswerGenerator;

pub const DEFAULT_MIN_COVERAGE: f64 = 0.5;
pub const DEFAULT_MIN_SUCCESS_RATE: f64 = 0.6;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageResult {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub expected_keywords: Vec<String>,
    pub found_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub coverage: f64,
    pub min_coverage: f64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub results: Vec<CoverageResult>,
}

impl RegressionSummary {
    pub fn passes(&self, min_success_rate: f64) -> bool {
        self.success_rate >= min_success_rate
    }
}

pub struct PromptRegressionTester<'a> {
    generator: &'a AnswerGenerator,
    min_coverage: f64,
}

impl<'a> PromptRegressionTester<'a> {
    pub fn new(generator: &'a AnswerGenerator) -> Self {
        Self {
            generator,
            min_coverage: DEFAULT_MIN_COVERAGE,
        }
    }

    pub fn with_min_coverage(mut self, min_coverage: f64) -> Self {
        self.min_coverage = min_coverage;
        self
    }

    /// Ask `question` and check how many `keywords` the answer mentions.
    /// Generation failures produce a failed result carrying the error.
    pub async fn check_keyword_coverage(
        &self,
        question: &str,
        keywords: &[String],
        min_coverage: f64,
    ) -> CoverageResult {
        info!("Testing question: {}", question);

        let answer = match self.generator.answer(question).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Test failed with exception: {}", e);
                return CoverageResult {
                    question: question.to_string(),
                    expected_keywords: keywords.to_vec(),
                    min_coverage,
                    error: Some(e.to_string()),
                    ..Default::default()
                };
            }
        };

        let (found, missing) = split_keywords(&answer, keywords);
        let coverage = keyword_coverage(found.len(), keywords.len());
        let passed = coverage >= min_coverage;

        info!(
            "Test {}: {:.2} coverage ({}/{} keywords)",
            if passed { "PASSED" } else { "FAILED" },
            coverage,
            found.len(),
            keywords.len()
        );
        if !passed {
            warn!("Missing keywords: {:?}", missing);
        }

        CoverageResult {
            question: question.to_string(),
            answer: Some(answer),
            expected_keywords: keywords.to_vec(),
            found_keywords: found.into_iter().cloned().collect(),
            missing_keywords: missing.into_iter().cloned().collect(),
            coverage,
            min_coverage,
            passed,
            error: None,
        }
    }

    pub async fn run_suite(&self, cases: &[TestCase]) -> RegressionSummary {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(
                self.check_keyword_coverage(
                    &case.question,
                    &case.expected_answer_keywords,
                    self.min_coverage,
                )
                .await,
            );
        }

        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };
        info!("Regression testing completed: {}/{} tests passed", passed, total);

        RegressionSummary {
            total,
            passed,
            failed: total - passed,
            success_rate,
            results,
        }
    }
}
