//! Shared application state threaded through every route handler via `axum::extract::State`.
//!
//! Generic over the embedding backend, language model, page renderer, and audio transcriber:
//! `MultiVectorEmbedder`, `LanguageModel`, `PageRenderer`, and `AudioTranscriber` all return
//! `impl Future`/`impl Stream`, so none of them is object-safe — a trait-object `AppState` isn't
//! an option, and the concrete types are fixed once in `main` instead.

use std::sync::Arc;

use aither_core::{AudioTranscriber, MultiVectorEmbedder};
use aither_core::llm::LanguageModel;
use docmind_pipeline::{DocumentProcessor, Hub, PageRenderer, StatusManager, UploadRegistry};
use docmind_research::ResearchOrchestrator;
use docmind_vectorstore::VectorStore;

use crate::config::DocmindConfig;

/// Everything a request handler needs: the vector store, the status/broadcast fabric, the
/// upload registry, the document processor, and the research orchestrator.
pub struct AppState<A, E, M, R> {
    /// Two-collection multi-vector store, shared by ingestion and retrieval.
    pub store: Arc<VectorStore>,
    /// Per-document lifecycle tracker (spec §4.4).
    pub status: Arc<StatusManager>,
    /// Broadcast hub WebSocket clients subscribe to.
    pub hub: Hub,
    /// Upload intent / duplicate-detection ledger (spec §4.10).
    pub uploads: Arc<UploadRegistry>,
    /// Parses, embeds, and stores a single document (spec §4.6).
    pub processor: DocumentProcessor<A, E, R>,
    /// Answers research questions against the corpus (spec §4.8/§4.9).
    pub orchestrator: ResearchOrchestrator<E, M>,
    /// Layered runtime configuration (spec §6).
    pub config: DocmindConfig,
}

impl<A, E, M, R> AppState<A, E, M, R>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    /// Assembles application state from its already-constructed pieces.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<VectorStore>,
        status: Arc<StatusManager>,
        hub: Hub,
        uploads: Arc<UploadRegistry>,
        processor: DocumentProcessor<A, E, R>,
        orchestrator: ResearchOrchestrator<E, M>,
        config: DocmindConfig,
    ) -> Self {
        Self {
            store,
            status,
            hub,
            uploads,
            processor,
            orchestrator,
            config,
        }
    }
}
