//! `docmind-server`: HTTP + WebSocket front end for the docmind RAG service (spec §6).
//!
//! Wiring follows `Toasterson-akh-medu`'s `akh-medu-server` binary (`Router` assembly, CORS
//! layer, `tokio::net::TcpListener` + `axum::serve`) and `ravituringworks-generic-ai-agent`'s
//! `AgentConfig`-driven startup sequence.

mod config;
mod error;
mod placeholder;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use docmind_docparse::DocumentParser;
use docmind_pipeline::{DocumentProcessor, Hub, NoRenderer, StatusManager, UploadRegistry};
use docmind_research::{ContextOptions, ResearchOrchestrator};
use docmind_retrieval::RetrievalConfig;
use docmind_vectorstore::VectorStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{DocmindConfig, EmbeddingPrecision};
use crate::placeholder::{HashEmbedder, NoTranscriber, UnconfiguredModel};
use crate::state::AppState;

fn vectorstore_precision(precision: EmbeddingPrecision) -> docmind_vectorstore::EmbeddingPrecision {
    match precision {
        EmbeddingPrecision::Fp16 => docmind_vectorstore::EmbeddingPrecision::Fp16,
        EmbeddingPrecision::Int8 => docmind_vectorstore::EmbeddingPrecision::Int8,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DocmindConfig::load().expect("failed to load configuration");

    let db_path = config.data_dir.join("vectorstore.redb");
    let store = Arc::new(
        VectorStore::open(&db_path)
            .unwrap_or_else(|err| {
                tracing::warn!(%err, path = %db_path.display(), "opening persistent store failed; falling back to in-memory");
                VectorStore::new()
            })
            .with_precision(vectorstore_precision(config.embedding_precision)),
    );

    let hub = Hub::new();
    let status = Arc::new(StatusManager::new(hub.clone()));
    let uploads = Arc::new(UploadRegistry::new());

    let embedder = Arc::new(HashEmbedder::new(docmind_vectorstore::EMBEDDING_DIM));
    let model = Arc::new(UnconfiguredModel);

    let processor = DocumentProcessor::new(
        DocumentParser::with_transcriber(NoTranscriber),
        HashEmbedder::new(docmind_vectorstore::EMBEDDING_DIM),
        NoRenderer,
        Arc::clone(&store),
        Arc::clone(&status),
        hub.clone(),
    );

    let context_options = ContextOptions {
        vision_enabled: config.research_vision_enabled,
        max_images: config.research_max_images,
        image_base_url: config.research_image_base_url.clone(),
        ..ContextOptions::default()
    };
    let orchestrator = ResearchOrchestrator::new(
        Arc::clone(&embedder),
        Arc::clone(&store),
        Arc::clone(&model),
        RetrievalConfig::default(),
        context_options,
    );

    let bind_addr = config.bind_addr.clone();
    let app_state = Arc::new(AppState::new(
        Arc::clone(&store),
        status,
        hub,
        uploads,
        processor,
        orchestrator,
        config,
    ));

    let app = build_router(app_state);

    tracing::info!(%bind_addr, "docmind-server listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}

fn build_router(
    state: Arc<AppState<NoTranscriber, HashEmbedder, UnconfiguredModel, NoRenderer>>,
) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/upload/register", post(routes::register_upload))
        .route("/process", post(routes::process_document))
        .route("/documents", get(routes::list_documents))
        .route("/documents/{doc_id}", get(routes::get_document).delete(routes::delete_document))
        .route("/images/{doc_id}/{filename}", get(routes::get_image))
        .route("/status/queue", get(routes::get_queue))
        .route("/status/active", get(routes::get_active))
        .route("/status/stats", get(routes::get_stats))
        .route("/status/{doc_id}", get(routes::get_status))
        .route("/ws", get(routes::ws_upgrade))
        .route("/research/ask", post(routes::research_ask))
        .route("/research/context-only", post(routes::research_context_only))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
