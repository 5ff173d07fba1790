//! Context formatting for answer prompts.

use crate::vector_store::RetrievedChunk;

/// Join retrieved chunk texts into the prompt's context block.
pub fn format_context_for_prompt(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|r| r.chunk.content.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}
