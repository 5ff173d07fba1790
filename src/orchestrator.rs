//! Pipeline orchestrator for finrag.
//!
//! Runs one question through discovery, trust filtering, loading, chunking,
//! embedding, retrieval and synthesis. Every request builds its own index
//! and nothing is shared between requests.

use crate::chunking::{Chunker, ChunkingConfig, RecursiveChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, ChunkEmbedder, Embedder};
use crate::error::{with_timeout, FinragError, Result};
use crate::loader::{DocumentLoader, HttpPageFetcher, PageFetcher};
use crate::query::Query;
use crate::rag::{create_language_model, Answer, AnswerSynthesizer, LanguageModel};
use crate::search::{create_search, WebSearch};
use crate::trust::TrustFilter;
use crate::vector_store::{RetrievedChunk, VectorIndex};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Stages a request moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Discovering,
    Filtering,
    Loading,
    Chunking,
    Embedding,
    Retrieving,
    Synthesizing,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Discovering => "discovering",
            PipelineStage::Filtering => "filtering",
            PipelineStage::Loading => "loading",
            PipelineStage::Chunking => "chunking",
            PipelineStage::Embedding => "embedding",
            PipelineStage::Retrieving => "retrieving",
            PipelineStage::Synthesizing => "synthesizing",
        };
        f.write_str(name)
    }
}

/// Terminal state of a request.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(Answer),
    Failed {
        /// Stage that was running when the request failed.
        stage: PipelineStage,
        error: FinragError,
    },
}

/// Counts collected along the way, for display and logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub discovered: usize,
    pub trusted: usize,
    pub documents: usize,
    pub skipped_urls: usize,
    pub chunks: usize,
    pub embedded: usize,
    pub retrieved: usize,
}

/// Everything known about a finished request.
#[derive(Debug)]
pub struct PipelineReport {
    pub query_id: Uuid,
    /// Stages entered, in order.
    pub stages: Vec<PipelineStage>,
    pub stats: PipelineStats,
    pub outcome: PipelineOutcome,
}

impl PipelineReport {
    /// Collapse the report into the answer or the error that stopped it.
    pub fn into_result(self) -> Result<Answer> {
        match self.outcome {
            PipelineOutcome::Completed(answer) => Ok(answer),
            PipelineOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// Sources found for a question, before anything is fetched.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Every URL the search returned, in ranking order.
    pub discovered: Vec<String>,
    /// The trusted subset, in the same order.
    pub trusted: Vec<String>,
}

/// Web search plus the trust filter, bounded by the discovery deadline.
pub struct SourceDiscovery {
    search: Arc<dyn WebSearch>,
    trust: TrustFilter,
    result_limit: usize,
    timeout: Duration,
}

impl SourceDiscovery {
    /// Create discovery backed by the configured search provider.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::with_search(settings, create_search(&settings.search)?))
    }

    /// Create discovery around a custom search implementation.
    pub fn with_search(settings: &Settings, search: Arc<dyn WebSearch>) -> Self {
        Self {
            search,
            trust: TrustFilter::new(&settings.trust.domains),
            result_limit: settings.search.result_limit,
            timeout: Duration::from_secs(settings.timeouts.discovery_secs),
        }
    }

    /// Search and trust-filter without fetching anything.
    pub async fn discover(&self, query: &Query) -> Result<Discovery> {
        let discovered = with_timeout(
            "web discovery",
            self.timeout,
            self.search.search(query.text(), self.result_limit),
        )
        .await
        .map_err(|e| match e {
            FinragError::Discovery(_) => e,
            other => FinragError::Discovery(other.to_string()),
        })?;

        let trusted = self.trust.filter(&discovered);
        Ok(Discovery {
            discovered,
            trusted,
        })
    }
}

/// Records stage transitions for one request.
struct StageTracker {
    query_id: Uuid,
    stages: Vec<PipelineStage>,
}

impl StageTracker {
    fn new(query_id: Uuid) -> Self {
        Self {
            query_id,
            stages: vec![PipelineStage::Received],
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        debug!(query_id = %self.query_id, %stage, "Entering stage");
        self.stages.push(stage);
    }

    fn current(&self) -> PipelineStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(PipelineStage::Received)
    }
}

/// The main orchestrator for the finrag pipeline.
pub struct Orchestrator {
    discovery: SourceDiscovery,
    loader: DocumentLoader,
    chunker: Arc<dyn Chunker>,
    chunking: ChunkingConfig,
    embedder: ChunkEmbedder,
    synthesizer: AnswerSynthesizer,
    k: usize,
}

impl Orchestrator {
    /// Create an orchestrator backed by the configured providers.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let timeouts = &settings.timeouts;
        let search = create_search(&settings.search)?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::from_settings(
            &settings.loader,
            Duration::from_secs(timeouts.fetch_secs),
        )?);
        let embedder = create_embedder(
            &settings.embedding,
            Duration::from_secs(timeouts.embed_secs),
        )?;
        let model = create_language_model(
            &settings.generation,
            Duration::from_secs(timeouts.generate_secs),
        )?;

        info!(
            "Using {} for embeddings and {} for answers",
            settings.embedding.model, settings.generation.model
        );

        Ok(Self::with_components(
            &settings, prompts, search, fetcher, embedder, model,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        search: Arc<dyn WebSearch>,
        fetcher: Arc<dyn PageFetcher>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let timeouts = &settings.timeouts;

        let loader = DocumentLoader::new(fetcher)
            .with_max_concurrent(settings.loader.max_concurrent)
            .with_timeout(Duration::from_secs(timeouts.fetch_secs));
        let embedder = ChunkEmbedder::new(embedder)
            .with_max_concurrent(settings.embedding.max_concurrent)
            .with_timeout(Duration::from_secs(timeouts.embed_secs));
        let synthesizer = AnswerSynthesizer::new(model)
            .with_prompts(prompts)
            .with_settings(&settings.generation)
            .with_timeout(Duration::from_secs(timeouts.generate_secs));

        Self {
            discovery: SourceDiscovery::with_search(settings, search),
            loader,
            chunker: Arc::new(RecursiveChunker::new()),
            chunking: ChunkingConfig::from(&settings.chunking),
            embedder,
            synthesizer,
            k: settings.retrieval.k,
        }
    }

    /// Answer a question, returning only the answer or the failure.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let query = Query::new(question)?;
        self.run(&query).await.into_result()
    }

    /// Run the whole pipeline for one query.
    #[instrument(skip(self, query), fields(query_id = %query.id()))]
    pub async fn run(&self, query: &Query) -> PipelineReport {
        let mut tracker = StageTracker::new(query.id());
        let mut stats = PipelineStats::default();

        let result = match self.retrieve_tracked(query, &mut tracker, &mut stats).await {
            Ok(context) => {
                tracker.enter(PipelineStage::Synthesizing);
                self.synthesizer.synthesize(query, context).await
            }
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(answer) => {
                info!("Answered with {} sources", answer.sources.len());
                PipelineOutcome::Completed(answer)
            }
            Err(error) => {
                let stage = tracker.current();
                warn!("Request failed while {}: {}", stage, error);
                PipelineOutcome::Failed { stage, error }
            }
        };

        PipelineReport {
            query_id: query.id(),
            stages: tracker.stages,
            stats,
            outcome,
        }
    }

    /// Run every stage up to retrieval and return the context that would be
    /// handed to the model.
    pub async fn retrieve(&self, query: &Query) -> Result<Vec<RetrievedChunk>> {
        let mut tracker = StageTracker::new(query.id());
        let mut stats = PipelineStats::default();
        self.retrieve_tracked(query, &mut tracker, &mut stats).await
    }

    /// Search and trust-filter without fetching anything.
    pub async fn discover(&self, query: &Query) -> Result<Discovery> {
        self.discovery.discover(query).await
    }

    async fn retrieve_tracked(
        &self,
        query: &Query,
        tracker: &mut StageTracker,
        stats: &mut PipelineStats,
    ) -> Result<Vec<RetrievedChunk>> {
        tracker.enter(PipelineStage::Discovering);
        let discovery = self.discover(query).await?;
        stats.discovered = discovery.discovered.len();

        tracker.enter(PipelineStage::Filtering);
        stats.trusted = discovery.trusted.len();
        if discovery.trusted.is_empty() {
            info!(
                "None of {} discovered URLs are trusted; continuing without sources",
                stats.discovered
            );
        }

        tracker.enter(PipelineStage::Loading);
        let loaded = self.loader.load(&discovery.trusted).await;
        stats.documents = loaded.documents.len();
        stats.skipped_urls = loaded.errors.len();

        tracker.enter(PipelineStage::Chunking);
        let chunks = self.chunker.chunk_documents(&loaded.documents, &self.chunking);
        stats.chunks = chunks.len();

        tracker.enter(PipelineStage::Embedding);
        // Fail before paying for chunk embeddings.
        let query_embedding = self.embedder.embed_query(query.text()).await?;
        let embedded = self.embedder.embed_chunks(chunks).await;
        stats.embedded = embedded.embedded.len();
        let index = VectorIndex::build(embedded.embedded);

        tracker.enter(PipelineStage::Retrieving);
        let context = index.query(&query_embedding, self.k)?;
        stats.retrieved = context.len();
        debug!("Retrieved {} of {} chunks", context.len(), index.len());

        Ok(context)
    }
}
