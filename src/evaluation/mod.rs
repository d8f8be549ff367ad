//! Offline quality evaluation and prompt regression testing.

pub mod faithfulness;
pub mod metrics;
pub mod regression;
pub mod runner;

pub use faithfulness::{check_faithfulness, FaithfulnessReport};
pub use metrics::{answer_relevance, calculate_f1, context_precision, context_recall};
pub use regression::{CoverageResult, PromptRegressionTester, RegressionSummary};
pub use runner::{
    evaluate_generation, evaluate_retrieval, load_test_cases, run_evaluation, EvaluationReport,
    TestCase,
};
