//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::chunking::Chunk;
use crate::config::EmbeddingSettings;
use crate::error::{with_timeout, FinragError, Result};
use crate::vector_store::EmbeddedChunk;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Create the embedder named by the settings.
pub fn create_embedder(
    settings: &EmbeddingSettings,
    timeout: Duration,
) -> Result<Arc<dyn Embedder>> {
    match settings.provider.to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAIEmbedder::with_config(
            &settings.model,
            settings.dimensions as usize,
            timeout,
        )?)),
        other => Err(FinragError::Config(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}

/// Outcome of embedding a batch of chunks.
#[derive(Debug, Default)]
pub struct EmbedResult {
    /// Successfully embedded chunks, in chunk order.
    pub embedded: Vec<EmbeddedChunk>,
    /// Chunk orders that were dropped, with the reason.
    pub failed: Vec<(usize, String)>,
}

/// Embeds chunks one call per chunk, dropping the ones that fail.
pub struct ChunkEmbedder {
    embedder: Arc<dyn Embedder>,
    max_concurrent: usize,
    timeout: Duration,
}

impl ChunkEmbedder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            max_concurrent: 4,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the maximum number of in-flight embedding calls.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Set the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Embed every non-blank chunk. Results are returned in chunk order.
    pub async fn embed_chunks(&self, chunks: Vec<Chunk>) -> EmbedResult {
        let (chunks, blank): (Vec<Chunk>, Vec<Chunk>) =
            chunks.into_iter().partition(|c| !c.content.trim().is_empty());
        if !blank.is_empty() {
            debug!("Skipping {} whitespace-only chunks", blank.len());
        }

        let mut results: Vec<(Chunk, Result<Vec<f32>>)> = stream::iter(chunks)
            .map(|chunk| async move {
                let result =
                    with_timeout("embed chunk", self.timeout, self.embedder.embed(&chunk.content))
                        .await;
                (chunk, result)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        results.sort_by_key(|(chunk, _)| chunk.order);

        let mut outcome = EmbedResult::default();
        for (chunk, result) in results {
            match result {
                Ok(embedding) if !embedding.is_empty() => {
                    outcome.embedded.push(EmbeddedChunk { chunk, embedding });
                }
                Ok(_) => {
                    warn!("Chunk {} returned an empty embedding, dropping", chunk.order);
                    outcome.failed.push((chunk.order, "empty embedding".to_string()));
                }
                Err(e) => {
                    warn!("Failed to embed chunk {} ({}): {}", chunk.order, chunk.source_url, e);
                    outcome.failed.push((chunk.order, e.to_string()));
                }
            }
        }

        info!(
            "Embedded {} chunks ({} dropped)",
            outcome.embedded.len(),
            outcome.failed.len()
        );
        outcome
    }

    /// Embed the query text. Any failure here is fatal for the request.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embedding = with_timeout("embed query", self.timeout, self.embedder.embed(query))
            .await
            .map_err(|e| FinragError::QueryEmbedding(e.to_string()))?;

        if embedding.is_empty() {
            return Err(FinragError::QueryEmbedding(
                "Empty embedding returned for query".to_string(),
            ));
        }
        Ok(embedding)
    }
}
