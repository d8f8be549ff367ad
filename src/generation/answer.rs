//! Question answering: hybrid retrieval followed by grounded reasoning.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::reasoner::ReasoningEngine;
use crate::error::Result;
use crate::retrieval::{ContextItem, HybridRetriever, RetrievalOptions};

pub struct AnswerGenerator {
    retriever: Arc<HybridRetriever>,
    reasoner: ReasoningEngine,
    options: RetrievalOptions,
}

impl AnswerGenerator {
    pub fn new(retriever: Arc<HybridRetriever>, reasoner: ReasoningEngine) -> Self {
        Self {
            retriever,
            reasoner,
            options: RetrievalOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    pub async fn answer(&self, question: &str) -> Result<String> {
        self.answer_with_context(question).await.map(|(answer, _)| answer)
    }

    /// The answer together with the context it was grounded on.
    pub async fn answer_with_context(&self, question: &str) -> Result<(String, Vec<ContextItem>)> {
        info!("Generating answer for question: {}", question);

        let context = self.retriever.retrieve(question, &self.options).await;
        debug!("Retrieved {} context items", context.len());

        match self.reasoner.reason(question, &context).await {
            Ok(answer) => {
                info!("Answer generated successfully");
                Ok((answer, context))
            }
            Err(e) => {
                error!("Error generating answer: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::reasoner::tests::ScriptedModel;
    use crate::retrieval::{VectorHit, VectorSource};
    use crate::Error;
    use async_trait::async_trait;

    struct FixedVector(Vec<VectorHit>);

    #[async_trait]
    impl VectorSource for FixedVector {
        async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<VectorHit>> {
            Ok(self.0.iter().take(top_k).cloned().collect())
        }
    }

    fn retriever() -> Arc<HybridRetriever> {
        let hits = vec![
            VectorHit { content: "Billing belongs to the Finance Team".into(), score: 0.9, index: 0 },
            VectorHit { content: "Security owns access reviews".into(), score: 0.4, index: 1 },
        ];
        Arc::new(HybridRetriever::vector_only(Arc::new(FixedVector(hits))))
    }

    #[tokio::test]
    async fn answer_uses_retrieved_context() {
        let model = Arc::new(ScriptedModel::answering("Finance Team"));
        let generator = AnswerGenerator::new(retriever(), ReasoningEngine::new(model.clone()))
            .with_options(RetrievalOptions { top_k: 1, ..Default::default() });

        let (answer, context) = generator.answer_with_context("who owns billing").await.unwrap();

        assert_eq!(answer, "Finance Team");
        assert_eq!(context.len(), 1);
        assert!(model
            .last_user_prompt()
            .unwrap()
            .contains("- Billing belongs to the Finance Team"));
    }

    #[tokio::test]
    async fn generation_errors_propagate() {
        let generator = AnswerGenerator::new(
            retriever(),
            ReasoningEngine::new(Arc::new(ScriptedModel::failing("quota exceeded"))),
        );

        let err = generator.answer("who owns billing").await.unwrap_err();

        assert!(matches!(err, Error::Llm(ref m) if m.contains("quota")));
    }
}
