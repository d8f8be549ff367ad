//! Answer generation over retrieved context.

pub mod answer;
pub mod context_builder;
pub mod llm;
pub mod prompts;
pub mod reasoner;

pub use answer::AnswerGenerator;
pub use context_builder::{build_context, ContextBuilder};
pub use llm::{ChatMessage, Completion, LanguageModel, OpenAiChat};
pub use prompts::{format_user_prompt, Prompt, SYSTEM_PROMPT, USER_PROMPT_TEMPLATE};
pub use reasoner::{ReasoningEngine, GENERATION_OPERATION};
