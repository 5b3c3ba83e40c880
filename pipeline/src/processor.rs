//! Document processor (spec §4.6): parse → embed visual → embed text → store, with per-stage
//! fault isolation and graceful degradation.
//!
//! Orchestration shape is grounded on `rag/src/rag.rs`'s `Rag::index_directory_with_progress`
//! (drive a `Chunker`+`EmbeddingModel`+`VectorIndex` stack while emitting progress) and
//! `rag/src/indexing.rs`'s `IndexingJob`, generalized here to dual-modality embedding with a
//! status fabric in place of a bare progress stream.

use std::collections::HashMap;
use std::sync::Arc;

use aither_core::{AudioTranscriber, MultiVector, MultiVectorEmbedder};
use docmind_docparse::{DocumentParser, Page, ParseOptions, TextChunk};
use docmind_vectorstore::{RecordContext, VectorStore};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{PipelineError, Result};
use crate::hub::{Hub, HubMessage, LogLevel};
use crate::status::{DocStatus, StatusManager};

/// Pages/chunks per batch submitted to the embedder in a single call (spec §4.6
/// "embed_visual(batch=4)" / "embed_text(batch=8)"). The coordinator — not this processor —
/// decides batch size from device capacity per config; these are the configured defaults.
pub const VISUAL_BATCH_SIZE: usize = 4;
/// See [`VISUAL_BATCH_SIZE`].
pub const TEXT_BATCH_SIZE: usize = 8;

/// Renders a parsed document's pages into encoded images for visual embedding.
///
/// Capability-set wrapper (Design Note 9) kept separate from [`docmind_docparse`]'s `render`
/// feature (which needs the native pdfium library) so this crate can be compiled and tested
/// without it; a real implementation shells out to `docmind_docparse::render_pages_from_bytes`
/// and reads the resulting files back.
pub trait PageRenderer: Send + Sync {
    /// Renders `pages` from `source_bytes`, returning `(page_number, encoded_image_bytes)`
    /// pairs. A page absent from the source or unrenderable is simply omitted, not an error —
    /// the processor treats missing renders the same as an embedding failure for that page.
    fn render(&self, source_bytes: &[u8], pages: &[Page]) -> Result<Vec<(usize, Vec<u8>)>>;
}

/// A [`PageRenderer`] that renders nothing, for DOCX/audio pipelines and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRenderer;

impl PageRenderer for NoRenderer {
    fn render(&self, _source_bytes: &[u8], _pages: &[Page]) -> Result<Vec<(usize, Vec<u8>)>> {
        Ok(Vec::new())
    }
}

/// Final tally for a completed (or partially completed, then failed) run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOutcome {
    /// Visual records written.
    pub visual_embeddings: usize,
    /// Text records written.
    pub text_embeddings: usize,
}

fn now_iso8601() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Orchestrates a single document's run through parsing, embedding, and storage.
///
/// Generic over the audio transcriber, the embedding backend, and the page renderer so callers
/// can plug in real implementations or deterministic mocks without this crate depending on any
/// of their concrete types (Design Note 9's capability-set pattern).
pub struct DocumentProcessor<A, E, R> {
    parser: DocumentParser<A>,
    embedder: E,
    renderer: R,
    store: Arc<VectorStore>,
    status: Arc<StatusManager>,
    hub: Hub,
}

impl<A, E, R> DocumentProcessor<A, E, R>
where
    A: AudioTranscriber,
    E: MultiVectorEmbedder,
    R: PageRenderer,
{
    /// Builds a processor over the given embedder, renderer, store, and status manager,
    /// publishing through `hub`.
    pub fn new(
        parser: DocumentParser<A>,
        embedder: E,
        renderer: R,
        store: Arc<VectorStore>,
        status: Arc<StatusManager>,
        hub: Hub,
    ) -> Self {
        Self {
            parser,
            embedder,
            renderer,
            store,
            status,
            hub,
        }
    }

    fn log(&self, level: LogLevel, doc_id: &str, message: impl Into<String>) {
        self.hub.publish(HubMessage::Log {
            level,
            message: message.into(),
            doc_id: Some(doc_id.to_string()),
            timestamp: now_iso8601(),
        });
    }

    /// Runs the full pipeline for `doc_id`/`filename` over `bytes`, per spec §4.6's stage
    /// order. `doc_id` must already be `registered` on the status manager.
    pub async fn process(
        &self,
        doc_id: &str,
        filename: &str,
        bytes: &[u8],
        options: &ParseOptions,
    ) -> Result<ProcessOutcome> {
        let mut visual_so_far = 0usize;
        let mut text_so_far = 0usize;

        let parsed = match self.run_stage(doc_id, filename, bytes, options).await {
            Ok(parsed) => parsed,
            Err(err) => {
                self.status.fail(doc_id, err.to_string(), None, None)?;
                return Err(err);
            }
        };

        self.status
            .transition(doc_id, DocStatus::EmbeddingVisual, "embedding pages", 0.1)?;
        let visual_result = self
            .embed_visual(doc_id, filename, bytes, &parsed.pages)
            .await;
        let visual_records = match visual_result {
            Ok(records) => records,
            Err(err) => {
                self.status.fail(doc_id, err.to_string(), Some(0), None)?;
                return Err(err);
            }
        };
        visual_so_far = visual_records.len();

        self.status
            .transition(doc_id, DocStatus::EmbeddingText, "embedding chunks", 0.5)?;
        let text_result = self.embed_text(doc_id, &parsed.chunks).await;
        let text_records = match text_result {
            Ok(records) => records,
            Err(err) => {
                self.status
                    .fail(doc_id, err.to_string(), Some(visual_so_far), Some(0))?;
                return Err(err);
            }
        };
        text_so_far = text_records.len();

        self.status
            .transition(doc_id, DocStatus::Storing, "storing records", 0.8)?;
        let stored = match self
            .store_records(doc_id, filename, bytes.len(), &visual_records, &text_records)
            .await
        {
            Ok(stored) => stored,
            Err(err) => {
                self.status.fail(
                    doc_id,
                    err.to_string(),
                    Some(visual_so_far),
                    Some(text_so_far),
                )?;
                return Err(err);
            }
        };

        self.status
            .complete(doc_id, stored.visual_embeddings, stored.text_embeddings)?;
        Ok(stored)
    }

    async fn run_stage(
        &self,
        doc_id: &str,
        filename: &str,
        bytes: &[u8],
        options: &ParseOptions,
    ) -> Result<docmind_docparse::ParsedDocument> {
        self.status
            .transition(doc_id, DocStatus::Parsing, "parsing document", 0.0)?;
        let parsed = self.parser.parse_bytes(filename, bytes, options).await?;
        self.log(
            LogLevel::Info,
            doc_id,
            format!(
                "parsed {} pages, {} chunks",
                parsed.pages.len(),
                parsed.chunks.len()
            ),
        );
        Ok(parsed)
    }

    async fn embed_visual(
        &self,
        doc_id: &str,
        filename: &str,
        bytes: &[u8],
        pages: &[Page],
    ) -> Result<Vec<(usize, MultiVector)>> {
        if pages.is_empty() {
            return Ok(Vec::new());
        }

        let rendered = self.renderer.render(bytes, pages)?;
        if rendered.is_empty() {
            self.log(
                LogLevel::Warn,
                doc_id,
                format!("no renderable pages for {filename}; skipping visual embedding"),
            );
            return Ok(Vec::new());
        }

        let total_attempted = rendered.len();
        let mut out = Vec::with_capacity(rendered.len());
        let mut last_error: Option<String> = None;

        for batch in rendered.chunks(VISUAL_BATCH_SIZE) {
            let page_numbers: Vec<usize> = batch.iter().map(|(page, _)| *page).collect();
            let images: Vec<Vec<u8>> = batch.iter().map(|(_, image)| image.clone()).collect();
            match self.embedder.embed_images(images).await {
                Ok(vectors) => {
                    for (page_number, vector) in page_numbers.into_iter().zip(vectors) {
                        out.push((page_number, vector));
                    }
                }
                Err(err) => {
                    self.log(
                        LogLevel::Warn,
                        doc_id,
                        format!("visual embedding failed for pages {page_numbers:?}: {err}"),
                    );
                    last_error = Some(err.to_string());
                }
            }
        }

        if out.is_empty() {
            // Graceful degradation (spec §4.6): a wholesale visual failure does not fail the
            // document — text-only indexing still commits.
            self.log(
                LogLevel::Warn,
                doc_id,
                format!(
                    "all {total_attempted} visual embeddings failed; continuing text-only: {}",
                    last_error.clone().unwrap_or_default()
                ),
            );
        }
        Ok(out)
    }

    async fn embed_text(
        &self,
        doc_id: &str,
        chunks: &[TextChunk],
    ) -> Result<Vec<(TextChunk, MultiVector)>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        // Dedup identical chunk text within this run (grounded on `rag/src/dedup.rs`'s
        // xxh3-based `content_hash`): duplicate text is embedded once and the resulting
        // MultiVector is reused for every chunk_id sharing that hash.
        let mut cache: HashMap<u64, MultiVector> = HashMap::new();
        let mut unique_texts: Vec<(u64, String)> = Vec::new();
        for chunk in chunks {
            let hash = xxh3_64(chunk.text.as_bytes());
            if !cache.contains_key(&hash) && unique_texts.iter().all(|(h, _)| *h != hash) {
                unique_texts.push((hash, chunk.text.clone()));
            }
        }

        let mut last_error: Option<String> = None;
        for batch in unique_texts.chunks(TEXT_BATCH_SIZE) {
            let hashes: Vec<u64> = batch.iter().map(|(hash, _)| *hash).collect();
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            match self.embedder.embed_texts(texts).await {
                Ok(vectors) => {
                    for (hash, vector) in hashes.into_iter().zip(vectors) {
                        cache.insert(hash, vector);
                    }
                }
                Err(err) => {
                    self.log(
                        LogLevel::Warn,
                        doc_id,
                        format!("text embedding failed for {} chunks: {err}", hashes.len()),
                    );
                    last_error = Some(err.to_string());
                }
            }
        }

        let mut out = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let hash = xxh3_64(chunk.text.as_bytes());
            if let Some(vector) = cache.get(&hash) {
                out.push((chunk.clone(), vector.clone()));
            }
        }

        if out.is_empty() {
            return Err(PipelineError::TextEmbeddingExhausted {
                count: chunks.len(),
                reason: last_error.unwrap_or_else(|| "no embeddings produced".to_string()),
            });
        }
        Ok(out)
    }

    async fn store_records(
        &self,
        doc_id: &str,
        filename: &str,
        source_size: usize,
        visual_records: &[(usize, MultiVector)],
        text_records: &[(TextChunk, MultiVector)],
    ) -> Result<ProcessOutcome> {
        let _ = source_size;
        let timestamp = now_iso8601();
        let total = visual_records.len() + text_records.len();
        let mut stored = 0usize;
        let mut visual_count = 0usize;
        let mut text_count = 0usize;
        let mut written_visual_ids = std::collections::HashSet::new();
        let mut written_text_ids = std::collections::HashSet::new();

        for (page, vector) in visual_records {
            let id = self.write_with_retry(doc_id, || {
                self.store.add_visual(
                    doc_id,
                    filename,
                    *page,
                    vector,
                    RecordContext {
                        timestamp: timestamp.clone(),
                        source_path: filename.to_string(),
                        ..RecordContext::default()
                    },
                )
            })?;
            written_visual_ids.insert(id);
            visual_count += 1;
            stored += 1;
            self.report_storage_progress(doc_id, stored, total)?;
        }

        for (chunk, vector) in text_records {
            // Audio chunks carry no page number; anchor them to page 0 rather than fabricate
            // one (the vector store doesn't special-case this — it's an opaque metadata field).
            let page = chunk.page_number.unwrap_or(0);
            let word_count = chunk.text.split_whitespace().count();
            let id = self.write_with_retry(doc_id, || {
                self.store.add_text(
                    doc_id,
                    filename,
                    chunk.chunk_id,
                    page,
                    vector,
                    &chunk.text,
                    word_count,
                    None,
                    RecordContext {
                        timestamp: timestamp.clone(),
                        source_path: filename.to_string(),
                        page_context: Some(chunk.context.section_path.clone()),
                        ..RecordContext::default()
                    },
                )
            })?;
            written_text_ids.insert(id);
            text_count += 1;
            stored += 1;
            self.report_storage_progress(doc_id, stored, total)?;
        }

        // A reprocess of the same doc_id (spec §5 forced re-upload) can produce fewer records
        // than the run it supersedes, e.g. a config change between runs yields different chunk
        // counts. New records are already live by this point, so pruning here never opens a
        // window where valid content is missing from the store.
        let (visual_pruned, text_pruned) = self.store.prune_stale(doc_id, &written_visual_ids, &written_text_ids);
        if visual_pruned > 0 || text_pruned > 0 {
            self.log(
                LogLevel::Info,
                doc_id,
                format!("pruned {visual_pruned} stale visual and {text_pruned} stale text records from a prior run"),
            );
        }

        Ok(ProcessOutcome {
            visual_embeddings: visual_count,
            text_embeddings: text_count,
        })
    }

    fn report_storage_progress(&self, doc_id: &str, done: usize, total: usize) -> Result<()> {
        if total == 0 {
            return Ok(());
        }
        let fraction = done as f32 / total as f32;
        let progress = 0.8 + fraction * 0.2;
        self.status
            .transition(doc_id, DocStatus::Storing, format!("stored {done}/{total}"), progress)
    }

    fn write_with_retry(
        &self,
        doc_id: &str,
        mut write: impl FnMut() -> docmind_vectorstore::Result<String>,
    ) -> Result<String> {
        match write() {
            Ok(id) => Ok(id),
            Err(first_err) => {
                self.log(
                    LogLevel::Warn,
                    doc_id,
                    format!("storage write failed, retrying once: {first_err}"),
                );
                write().map_err(PipelineError::from)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmind_vectorstore::Collection;
    use futures_lite::stream::{self, Stream};

    struct NoopTranscriber;
    impl AudioTranscriber for NoopTranscriber {
        fn transcribe(&self, _audio: &[u8]) -> impl Stream<Item = String> + Send {
            stream::iter(Vec::<String>::new())
        }
    }

    struct MockEmbedder;
    impl MultiVectorEmbedder for MockEmbedder {
        fn dim(&self) -> usize {
            8
        }

        async fn embed_images(&self, images: Vec<Vec<u8>>) -> aither_core::Result<Vec<MultiVector>> {
            Ok(images
                .iter()
                .map(|img| MultiVector::new(vec![vec![img.len() as f32; 8]; 4]).unwrap())
                .collect())
        }

        async fn embed_texts(&self, texts: Vec<String>) -> aither_core::Result<Vec<MultiVector>> {
            Ok(texts
                .iter()
                .map(|t| MultiVector::new(vec![vec![t.len() as f32; 8]; 3]).unwrap())
                .collect())
        }

        async fn embed_query(&self, query: &str) -> aither_core::Result<MultiVector> {
            MultiVector::new(vec![vec![query.len() as f32; 8]; 2])
                .ok_or_else(|| anyhow::anyhow!("empty query"))
        }
    }

    struct FailingEmbedder;
    impl MultiVectorEmbedder for FailingEmbedder {
        fn dim(&self) -> usize {
            8
        }

        async fn embed_images(&self, _images: Vec<Vec<u8>>) -> aither_core::Result<Vec<MultiVector>> {
            Err(anyhow::anyhow!("model unavailable"))
        }

        async fn embed_texts(&self, _texts: Vec<String>) -> aither_core::Result<Vec<MultiVector>> {
            Err(anyhow::anyhow!("model unavailable"))
        }

        async fn embed_query(&self, _query: &str) -> aither_core::Result<MultiVector> {
            Err(anyhow::anyhow!("model unavailable"))
        }
    }

    struct StubRenderer;
    impl PageRenderer for StubRenderer {
        fn render(&self, _source_bytes: &[u8], pages: &[Page]) -> Result<Vec<(usize, Vec<u8>)>> {
            Ok(pages
                .iter()
                .map(|p| (p.page_number, vec![p.page_number as u8; 16]))
                .collect())
        }
    }

    fn processor(
        embedder: MockEmbedder,
    ) -> DocumentProcessor<NoopTranscriber, MockEmbedder, StubRenderer> {
        let hub = Hub::new();
        let status = Arc::new(StatusManager::new(hub.clone()));
        DocumentProcessor::new(
            DocumentParser::new(),
            embedder,
            StubRenderer,
            Arc::new(VectorStore::with_dim(8)),
            status,
            hub,
        )
    }

    fn text_chunk(chunk_id: u32, text: &str, page_number: Option<usize>) -> TextChunk {
        TextChunk {
            chunk_id,
            text: text.to_string(),
            page_number,
            token_count: text.split_whitespace().count(),
            context: Default::default(),
            start_time: None,
            end_time: None,
            word_timestamps: Vec::new(),
        }
    }

    #[tokio::test]
    async fn text_only_document_completes_without_visual_records() {
        let proc = processor(MockEmbedder);
        proc.status.register("doc1", "notes.docx").unwrap();
        let outcome = proc
            .store_records(
                "doc1",
                "notes.docx",
                10,
                &[],
                &[(
                    text_chunk(1, "hello world", Some(1)),
                    MultiVector::new(vec![vec![1.0; 8]; 2]).unwrap(),
                )],
            )
            .await
            .unwrap();
        assert_eq!(outcome.visual_embeddings, 0);
        assert_eq!(outcome.text_embeddings, 1);
    }

    #[tokio::test]
    async fn wholesale_visual_failure_degrades_gracefully() {
        let hub = Hub::new();
        let status = Arc::new(StatusManager::new(hub.clone()));
        let proc = DocumentProcessor::new(
            DocumentParser::<NoopTranscriber>::new(),
            FailingEmbedder,
            StubRenderer,
            Arc::new(VectorStore::with_dim(8)),
            status,
            hub,
        );
        proc.status.register("doc1", "report.pdf").unwrap();
        let pages = vec![Page {
            page_number: 1,
            text: "hello".to_string(),
        }];
        let result = proc.embed_visual("doc1", "report.pdf", b"pdf bytes", &pages).await;
        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wholesale_text_failure_is_fatal() {
        let hub = Hub::new();
        let status = Arc::new(StatusManager::new(hub.clone()));
        let proc = DocumentProcessor::new(
            DocumentParser::<NoopTranscriber>::new(),
            FailingEmbedder,
            StubRenderer,
            Arc::new(VectorStore::with_dim(8)),
            status,
            hub,
        );
        proc.status.register("doc1", "report.pdf").unwrap();
        let chunks = vec![text_chunk(1, "hello world", Some(1))];
        let result = proc.embed_text("doc1", &chunks).await;
        assert!(matches!(
            result,
            Err(PipelineError::TextEmbeddingExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_chunk_text_embeds_once() {
        let proc = processor(MockEmbedder);
        let chunks = vec![
            text_chunk(1, "same text", Some(1)),
            text_chunk(2, "same text", Some(2)),
        ];
        proc.status.register("doc1", "report.pdf").unwrap();
        let result = proc.embed_text("doc1", &chunks).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].1, result[1].1);
    }

    #[tokio::test]
    async fn stored_records_are_searchable() {
        let proc = processor(MockEmbedder);
        proc.status.register("doc1", "report.pdf").unwrap();
        let vector = MultiVector::new(vec![vec![1.0; 8]; 3]).unwrap();
        proc.store_records("doc1", "report.pdf", 10, &[(1, vector.clone())], &[])
            .await
            .unwrap();
        let hits = proc
            .store
            .search(Collection::Visual, vector.cls(), 5, &Default::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn reprocessing_with_fewer_records_prunes_the_leftovers() {
        let proc = processor(MockEmbedder);
        proc.status.register("doc1", "report.pdf").unwrap();
        let vector = MultiVector::new(vec![vec![1.0; 8]; 3]).unwrap();
        proc.store_records(
            "doc1",
            "report.pdf",
            10,
            &[(1, vector.clone()), (2, vector.clone()), (3, vector.clone())],
            &[],
        )
        .await
        .unwrap();
        assert_eq!(proc.store.stats().visual_count, 3);

        // A reprocess of the same doc_id (e.g. after a config change) yields only one page.
        proc.store_records("doc1", "report.pdf", 10, &[(1, vector.clone())], &[])
            .await
            .unwrap();

        let stats = proc.store.stats();
        assert_eq!(stats.visual_count, 1, "stale doc1-page002/003 should have been pruned");
    }
}
