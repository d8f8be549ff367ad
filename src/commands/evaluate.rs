//! Evaluation and prompt regression commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::setup::build_generator;
use crate::config::Config;
use crate::evaluation::{
    load_test_cases, run_evaluation, EvaluationReport, PromptRegressionTester, RegressionSummary,
};
use crate::observability::Observability;

pub async fn evaluate(
    config: &Config,
    obs: Arc<Observability>,
    test_cases: &Path,
    output: Option<&Path>,
) -> Result<EvaluationReport> {
    let generator = build_generator(config, obs).await?;
    let report = run_evaluation(&generator, test_cases, output)
        .await
        .with_context(|| format!("Evaluation of {} failed", test_cases.display()))?;

    print_evaluation(&report);
    Ok(report)
}

fn print_evaluation(report: &EvaluationReport) {
    let retrieval = &report.retrieval.summary;
    let generation = &report.generation.summary;

    println!("\n{}", "=".repeat(60));
    println!("EVALUATION SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Mean recall:           {:.3}", retrieval.mean_recall);
    println!("Mean precision:        {:.3}", retrieval.mean_precision);
    println!("Mean F1:               {:.3}", retrieval.mean_f1);
    println!("Mean relevance:        {:.3}", generation.mean_relevance);
    println!("Mean faithfulness:     {:.3}", generation.mean_faithfulness);
    println!("Mean keyword coverage: {:.3}", generation.mean_keyword_coverage);
    println!(
        "Questions: {} retrieval, {} generation",
        retrieval.total_questions, generation.total_questions
    );
}

pub async fn regression_test(
    config: &Config,
    obs: Arc<Observability>,
    test_cases: &Path,
) -> Result<RegressionSummary> {
    let cases = load_test_cases(test_cases)
        .with_context(|| format!("Failed to load test cases from {}", test_cases.display()))?;
    let generator = build_generator(config, obs).await?;

    let summary = PromptRegressionTester::new(&generator)
        .with_min_coverage(config.evaluation.min_coverage as f64)
        .run_suite(&cases)
        .await;

    for result in &summary.results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        println!("[{}] {:.2} {}", status, result.coverage, result.question);
        if let Some(err) = &result.error {
            println!("       error: {}", err);
        } else if !result.missing_keywords.is_empty() {
            println!("       missing: {}", result.missing_keywords.join(", "));
        }
    }
    println!(
        "\n{}/{} tests passed (success rate {:.2})",
        summary.passed, summary.total, summary.success_rate
    );

    Ok(summary)
}
