//! Prompt templates for grounded answering.
//!
//! Built-in templates can be overridden by files in `prompts/` at the
//! project root.

use std::path::PathBuf;

use tracing::debug;

pub const SYSTEM_PROMPT: &str = "\
You are an enterprise AI assistant.
You must:
- Use ONLY the provided context
- Cite entities and policies explicitly
- Say \"I don't know\" if context is insufficient
";

pub const USER_PROMPT_TEMPLATE: &str = "\
QUESTION:
{question}

CONTEXT:
{context}

TASK:
1. Identify relevant facts from context
2. Perform step-by-step reasoning
3. Produce a grounded answer
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    System,
    User,
}

impl Prompt {
    pub fn filename(&self) -> &'static str {
        match self {
            Prompt::System => "system.md",
            Prompt::User => "user.md",
        }
    }

    pub fn builtin(&self) -> &'static str {
        match self {
            Prompt::System => SYSTEM_PROMPT,
            Prompt::User => USER_PROMPT_TEMPLATE,
        }
    }

    /// The override file when readable, else the built-in template.
    pub fn load(&self) -> String {
        let path = prompts_dir().join(self.filename());
        match std::fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => {
                debug!(path = %path.display(), "Loaded prompt override");
                text
            }
            _ => self.builtin().to_string(),
        }
    }
}

/// `prompts/` relative to the current or parent directory.
pub fn prompts_dir() -> PathBuf {
    let candidates = [PathBuf::from("prompts"), PathBuf::from("../prompts")];

    for path in candidates {
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("prompts")
}

/// Fill `{question}` and `{context}` in `template`.
pub fn format_user_prompt(template: &str, question: &str, context: &str) -> String {
    template
        .replace("{question}", question)
        .replace("{context}", context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_contains_question_and_context() {
        let prompt = format_user_prompt(USER_PROMPT_TEMPLATE, "Who owns billing?", "- Finance Team");

        assert!(prompt.contains("QUESTION:\nWho owns billing?"));
        assert!(prompt.contains("CONTEXT:\n- Finance Team"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn system_prompt_requires_grounding() {
        assert!(SYSTEM_PROMPT.contains("Use ONLY the provided context"));
        assert!(SYSTEM_PROMPT.contains("I don't know"));
    }

    #[test]
    fn builtin_matches_filename_pairing() {
        assert_eq!(Prompt::System.filename(), "system.md");
        assert_eq!(Prompt::User.builtin(), USER_PROMPT_TEMPLATE);
        assert!(Prompt::User.load().contains("{question}"));
    }
}
