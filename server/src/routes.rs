//! Route table (spec §6): one handler per endpoint, wired onto the `axum::Router` in `main.rs`.
//!
//! The WebSocket handler's "upgrade, greet, then forward hub broadcasts" shape is grounded on
//! `Toasterson-akh-medu`'s `ws_handler`/`handle_ws_session` (`src/bin/akh-medu-server.rs`).

use std::sync::Arc;
use std::sync::OnceLock;

use aither_core::{AudioTranscriber, MultiVectorEmbedder};
use aither_core::llm::LanguageModel;
use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use docmind_docparse::ParseOptions;
use docmind_pipeline::{DuplicateAction, PageRenderer, PipelineError};
use docmind_research::{AskRequest, ContextOptions, build_context};
use docmind_retrieval::{Filters, SearchMode, search};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DocmindError, Result};
use crate::state::AppState;

type SharedState<A, E, M, R> = State<Arc<AppState<A, E, M, R>>>;

fn image_filename_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(page\d{3}(_thumb\.jpg|\.png)|cover\.(jpg|jpeg|png))$")
            .expect("valid regex")
    })
}

fn validate_doc_id(doc_id: &str) -> Result<()> {
    let valid = !doc_id.is_empty()
        && doc_id.len() <= 64
        && doc_id.chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(DocmindError::BadRequest(format!("invalid doc_id: {doc_id}")))
    }
}

// ---------------------------------------------------------------------------
// Upload / processing
// ---------------------------------------------------------------------------

/// `POST /upload/register` request body (spec §4.10).
#[derive(Debug, Deserialize)]
pub struct RegisterUploadRequest {
    filename: String,
    expected_size: u64,
    content_hash: Option<String>,
}

/// `POST /upload/register` response body.
#[derive(Debug, Serialize)]
pub struct RegisterUploadResponse {
    doc_id: String,
    is_duplicate: bool,
    existing_filename: Option<String>,
}

pub async fn register_upload<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Json(body): Json<RegisterUploadRequest>,
) -> Result<Json<RegisterUploadResponse>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    let active = state.status.active_count();
    if active >= state.config.max_queue {
        return Err(DocmindError::Pipeline(PipelineError::QueueFull(active)));
    }

    let result = state.uploads.register_intent(
        &body.filename,
        body.expected_size,
        body.content_hash.as_deref(),
    );
    state
        .status
        .register(&result.doc_id, &body.filename)
        .map_err(DocmindError::Pipeline)?;
    Ok(Json(RegisterUploadResponse {
        doc_id: result.doc_id,
        is_duplicate: result.is_duplicate,
        existing_filename: result.existing_doc.map(|doc| doc.filename),
    }))
}

/// `POST /process` request body: the upload receiver has already written bytes to `path`
/// (spec §1 "Out of scope as external collaborators" excludes that receiver's own HTTP framing).
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    filename: String,
    path: String,
    /// What to do if `path`'s content hash matches an already-indexed document (spec §5
    /// duplicate policy). Defaults to `force` so callers that predate this field keep the prior
    /// unconditional-reprocess behavior.
    #[serde(default = "default_duplicate_action")]
    on_duplicate: DuplicateAction,
}

fn default_duplicate_action() -> DuplicateAction {
    DuplicateAction::Force
}

/// `POST /process` response body.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    doc_id: String,
    visual_embeddings: usize,
    text_embeddings: usize,
    /// `true` if this was a duplicate and `on_duplicate: "skip"` left the existing index untouched.
    skipped: bool,
}

pub async fn process_document<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Json(body): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    let bytes = tokio::fs::read(&body.path)
        .await
        .map_err(DocmindError::UploadFailed)?;
    let result = state.uploads.finalize(None, &bytes);
    let doc_id = result.doc_id;

    if result.is_duplicate && body.on_duplicate == DuplicateAction::Skip {
        return Ok(Json(ProcessResponse {
            doc_id,
            visual_embeddings: 0,
            text_embeddings: 0,
            skipped: true,
        }));
    }

    let options = ParseOptions {
        enable_table_structure: state.config.enable_table_structure,
        enable_picture_classification: state.config.enable_picture_classification,
        enable_code_enrichment: state.config.enable_code_enrichment,
        enable_formula_enrichment: state.config.enable_formula_enrichment,
        max_chunk_tokens: state.config.max_chunk_tokens,
        min_chunk_tokens: state.config.min_chunk_tokens,
        merge_peer_chunks: state.config.merge_peer_chunks,
        ..ParseOptions::default()
    };

    // A forced re-upload (`is_duplicate && on_duplicate == Force`) reprocesses the same
    // content-addressed `doc_id`; `DocumentProcessor::process` upserts by deterministic record ID
    // and prunes whatever the new run didn't rewrite, so this naturally replaces the prior run's
    // records without a separate swap step.
    let outcome = state
        .processor
        .process(&doc_id, &body.filename, &bytes, &options)
        .await
        .map_err(DocmindError::Pipeline)?;
    state.uploads.mark_indexed(&doc_id, &body.filename);

    Ok(Json(ProcessResponse {
        doc_id,
        visual_embeddings: outcome.visual_embeddings,
        text_embeddings: outcome.text_embeddings,
        skipped: false,
    }))
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Query parameters for `GET /documents`.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    sort_by: Option<String>,
}

fn default_limit() -> usize {
    50
}

pub async fn list_documents<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Query(query): Query<ListDocumentsQuery>,
) -> Json<Vec<docmind_vectorstore::DocumentSummary>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    let mut docs = state.store.list_documents();
    if let Some(needle) = query.search.as_deref() {
        let needle = needle.to_ascii_lowercase();
        docs.retain(|doc| doc.filename.to_ascii_lowercase().contains(&needle));
    }
    match query.sort_by.as_deref() {
        Some("filename") => docs.sort_by(|a, b| a.filename.cmp(&b.filename)),
        _ => docs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
    let page = docs.into_iter().skip(query.offset).take(query.limit).collect();
    Json(page)
}

pub async fn get_document<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Path(doc_id): Path<String>,
) -> Result<Json<docmind_vectorstore::DocumentSummary>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    validate_doc_id(&doc_id)?;
    state
        .store
        .document(&doc_id)
        .map(Json)
        .ok_or_else(|| DocmindError::DocumentNotFound(doc_id))
}

/// `DELETE /documents/{doc_id}` response body.
#[derive(Debug, Serialize)]
pub struct DeleteDocumentResponse {
    visual_deleted: usize,
    text_deleted: usize,
}

pub async fn delete_document<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Path(doc_id): Path<String>,
) -> Result<Json<DeleteDocumentResponse>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    validate_doc_id(&doc_id)?;
    if state.store.document(&doc_id).is_none() {
        return Err(DocmindError::DocumentNotFound(doc_id));
    }
    let (visual_deleted, text_deleted) = state.store.delete(&doc_id);
    state.uploads.forget(&doc_id);
    Ok(Json(DeleteDocumentResponse {
        visual_deleted,
        text_deleted,
    }))
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

pub async fn get_image<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Path((doc_id, filename)): Path<(String, String)>,
) -> Result<Vec<u8>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    validate_doc_id(&doc_id)?;
    if !image_filename_pattern().is_match(&filename) {
        return Err(DocmindError::ImageNotFound(filename));
    }
    let path = state.config.data_dir.join("page_images").join(&doc_id).join(&filename);
    tokio::fs::read(&path)
        .await
        .map_err(|_| DocmindError::ImageNotFound(format!("{doc_id}/{filename}")))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub async fn get_status<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Path(doc_id): Path<String>,
) -> Result<Json<docmind_pipeline::ProcessingStatus>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    validate_doc_id(&doc_id)?;
    state
        .status
        .get(&doc_id)
        .map(Json)
        .ok_or_else(|| DocmindError::DocumentNotFound(doc_id))
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pending: Vec<docmind_pipeline::ProcessingStatus>,
    active: Vec<docmind_pipeline::ProcessingStatus>,
}

pub async fn get_queue<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
) -> Json<QueueResponse>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    let (pending, active) = state.status.queue();
    Json(QueueResponse { pending, active })
}

pub async fn get_active<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
) -> Json<Vec<docmind_pipeline::ProcessingStatus>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    Json(state.status.active())
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    store: docmind_vectorstore::Stats,
    active_processing: usize,
}

pub async fn get_stats<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
) -> Json<StatsResponse>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    Json(StatsResponse {
        store: state.store.stats(),
        active_processing: state.status.active_count(),
    })
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

pub async fn ws_upgrade<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    ws.on_upgrade(move |socket| handle_ws(socket, state.hub.subscribe()))
}

async fn handle_ws(mut socket: WebSocket, mut rx: tokio::sync::broadcast::Receiver<docmind_pipeline::HubMessage>) {
    let greeting = docmind_pipeline::HubMessage::Connection {
        message: "connected".to_string(),
    };
    if send_hub_message(&mut socket, &greeting).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // inbound client messages are not part of this protocol
                    Some(Err(_)) => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(message) => {
                        if send_hub_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn send_hub_message(
    socket: &mut WebSocket,
    message: &docmind_pipeline::HubMessage,
) -> std::result::Result<(), axum::Error> {
    let json = serde_json::to_string(message).unwrap_or_default();
    socket.send(Message::Text(json.into())).await
}

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

/// `POST /research/ask` / `POST /research/context-only` shared request body.
#[derive(Debug, Deserialize)]
pub struct AskBody {
    query: String,
    #[serde(default = "default_num_sources")]
    num_sources: usize,
    #[serde(default)]
    search_mode: Option<String>,
    #[serde(default)]
    filters: Filters,
    #[serde(default)]
    vision_enabled: bool,
}

fn default_num_sources() -> usize {
    5
}

fn parse_search_mode(raw: Option<&str>) -> SearchMode {
    match raw {
        Some("visual") => SearchMode::Visual,
        Some("text") => SearchMode::Text,
        _ => SearchMode::Hybrid,
    }
}

pub async fn research_ask<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Json(body): Json<AskBody>,
) -> Result<Json<docmind_research::ResearchResult>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    let request = AskRequest {
        query: body.query,
        num_sources: body.num_sources,
        search_mode: parse_search_mode(body.search_mode.as_deref()),
        filters: body.filters,
        vision_enabled: body.vision_enabled,
    };
    let result = state.orchestrator.ask(&request).await.map_err(DocmindError::Research)?;
    Ok(Json(result))
}

/// `POST /research/context-only` response: the numbered context block the full `/research/ask`
/// call would have sent to the LLM, without spending a model call.
#[derive(Debug, Serialize)]
pub struct ContextOnlyResponse {
    context: String,
    context_truncated: bool,
    image_urls: Vec<String>,
}

pub async fn research_context_only<A, E, M, R>(
    State(state): SharedState<A, E, M, R>,
    Json(body): Json<AskBody>,
) -> Result<Json<ContextOnlyResponse>>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    M: LanguageModel,
    R: PageRenderer,
{
    let search_mode = parse_search_mode(body.search_mode.as_deref());
    let retrieval_config = docmind_retrieval::RetrievalConfig::default();
    let hits = search(
        state.orchestrator.embedder(),
        state.store.as_ref(),
        &body.query,
        search_mode,
        body.num_sources,
        &body.filters,
        &retrieval_config,
    )
    .await
    .map_err(DocmindError::Retrieval)?;

    let options = ContextOptions {
        num_sources: body.num_sources,
        vision_enabled: body.vision_enabled,
        image_base_url: state.config.research_image_base_url.clone(),
        max_images: state.config.research_max_images,
        ..ContextOptions::default()
    };
    let built = build_context(&hits, &options);
    Ok(Json(ContextOnlyResponse {
        context: built.text,
        context_truncated: built.context_truncated,
        image_urls: built.image_urls,
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
