//! Serialises ranked context into a bounded prompt section.

use tracing::debug;

use crate::config::DEFAULT_MAX_CONTEXT_CHARS;
use crate::retrieval::ContextItem;

#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    max_chars: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_CHARS)
    }
}

impl ContextBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// One `- <content>` line per item, in the given order. Stops at the
    /// first line that would push the block total past `max_chars`; lines
    /// are never cut. Joining newlines are not counted.
    pub fn build(&self, items: &[ContextItem]) -> String {
        debug!("Building context from {} chunks", items.len());
        let mut blocks: Vec<String> = Vec::new();
        let mut total_chars = 0;

        for item in items {
            let block = format!("- {}", item.content);
            let len = block.chars().count();
            if total_chars + len > self.max_chars {
                debug!("Context limit reached at {} chars", total_chars);
                break;
            }
            blocks.push(block);
            total_chars += len;
        }

        let context = blocks.join("\n");
        debug!("Built context with {} characters", context.chars().count());
        context
    }
}

pub fn build_context(items: &[ContextItem], max_chars: usize) -> String {
    ContextBuilder::new(max_chars).build(items)
}
