//! Grounded reasoning over ranked context.

use std::sync::Arc;

use tracing::{debug, error};

use super::context_builder::ContextBuilder;
use super::llm::LanguageModel;
use super::prompts::{format_user_prompt, Prompt};
use crate::error::Result;
use crate::observability::Observability;
use crate::retrieval::ContextItem;

pub const GENERATION_OPERATION: &str = "generation";

pub struct ReasoningEngine {
    llm: Arc<dyn LanguageModel>,
    context_builder: ContextBuilder,
    system_prompt: String,
    user_template: String,
    obs: Option<Arc<Observability>>,
}

impl ReasoningEngine {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            context_builder: ContextBuilder::default(),
            system_prompt: Prompt::System.load(),
            user_template: Prompt::User.load(),
            obs: None,
        }
    }

    pub fn with_context_builder(mut self, context_builder: ContextBuilder) -> Self {
        self.context_builder = context_builder;
        self
    }

    pub fn with_prompts(mut self, system: impl Into<String>, user_template: impl Into<String>) -> Self {
        self.system_prompt = system.into();
        self.user_template = user_template.into();
        self
    }

    pub fn with_observability(mut self, obs: Arc<Observability>) -> Self {
        self.obs = Some(obs);
        self
    }

    /// Prompt the model with `question` and the budgeted context.
    pub async fn reason(&self, question: &str, items: &[ContextItem]) -> Result<String> {
        debug!("Reasoning for question: {}", question);
        let mut timer = self.obs.as_ref().map(|o| o.timer(GENERATION_OPERATION));

        let context = self.context_builder.build(items);
        let prompt = format_user_prompt(&self.user_template, question, &context);

        let completion = match self.llm.generate(&self.system_prompt, &prompt).await {
            Ok(completion) => completion,
            Err(e) => {
                error!("Error in reasoning: {}", e);
                if let Some(t) = timer.as_mut() {
                    t.mark_failed();
                }
                return Err(e);
            }
        };
        debug!("LLM generation completed");

        if let Some(obs) = &self.obs {
            let model = self.llm.model();
            let prompt_tokens = completion.prompt_tokens.unwrap_or_else(|| {
                obs.count_tokens(&format!("{}{}", self.system_prompt, prompt), model) as u64
            });
            let completion_tokens = completion
                .completion_tokens
                .unwrap_or_else(|| obs.count_tokens(&completion.text, model) as u64);
            obs.record_tokens(GENERATION_OPERATION, model, prompt_tokens, completion_tokens);
        }

        Ok(completion.text)
    }
}
