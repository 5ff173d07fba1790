//! Content chunking for breaking fetched documents into searchable segments.

mod recursive;

pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::loader::RawDocument;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A bounded-size segment of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Index of the parent document in the loaded batch.
    pub document_index: usize,
    /// URL of the parent document.
    pub source_url: String,
    /// Position of this chunk across the whole batch.
    pub order: usize,
    /// Position of this chunk within its document.
    pub position: usize,
    /// Text content of this chunk.
    pub content: String,
    /// Start offset in the parent text, in characters.
    pub start: usize,
    /// End offset (exclusive) in the parent text, in characters.
    pub end: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A split point pair produced by a [`Chunker`], in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub max_size: usize,
    /// Characters shared with the previous chunk.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            overlap: 0,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            max_size: settings.max_size,
            overlap: settings.overlap,
        }
    }
}

/// Trait for text splitting strategies.
pub trait Chunker: Send + Sync {
    /// Split `text` into spans no longer than `config.max_size` characters.
    ///
    /// Spans are in ascending order and together cover the whole text.
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<TextSpan>;

    /// Split every document, numbering chunks in document order.
    fn chunk_documents(&self, documents: &[RawDocument], config: &ChunkingConfig) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (document_index, document) in documents.iter().enumerate() {
            let offsets = char_offsets(&document.content);
            for (position, span) in self.split(&document.content, config).into_iter().enumerate() {
                chunks.push(Chunk {
                    document_index,
                    source_url: document.source_url.clone(),
                    order: chunks.len(),
                    position,
                    content: document.content[offsets[span.start]..offsets[span.end]].to_string(),
                    start: span.start,
                    end: span.end,
                });
            }
        }

        info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );
        chunks
    }
}

/// Byte offset of every character boundary, including the end of the string.
pub(crate) fn char_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}
