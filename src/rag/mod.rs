//! Grounded answer synthesis.
//!
//! Turns the retrieved chunks and the user's question into a prompt and asks a
//! language model for the answer.

mod context;
mod model;
mod synthesizer;

pub use model::{create_language_model, GenerationRequest, LanguageModel, OpenAIChatModel};
pub use synthesizer::AnswerSynthesizer;

use crate::vector_store::RetrievedChunk;

/// A generated answer with the chunks that grounded it.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// Chunks supplied to the model as context.
    pub sources: Vec<RetrievedChunk>,
}
