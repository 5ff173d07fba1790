//! Configuration module for finrag.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GenerationSettings, LoaderSettings, PromptSettings,
    RetrievalSettings, SearchSettings, ServerSettings, Settings, TimeoutSettings, TrustSettings,
    DEFAULT_TRUSTED_DOMAINS,
};
