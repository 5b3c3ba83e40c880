//! Research orchestrator (spec §4.9): validate → search → build context → assemble messages →
//! call the foundation LLM → parse citations → return a cited [`ResearchResult`].
//!
//! Message assembly reuses `core/src/llm/message.rs`'s [`Message`] enum verbatim in spirit —
//! `Message::system`/`Message::user`, `with_attachments` for vision-mode image URLs, the exact
//! mechanism the context builder's image-URL collection feeds into (spec §4.8). The overall
//! "drain a multi-stage run down to one terminal value" shape follows
//! `core/src/llm/researcher.rs`'s `research_report()` helper, generalized here from an
//! open-ended web/file research stream to this system's single document-corpus search.

use std::sync::Arc;
use std::time::Instant;

use aither_core::MultiVectorEmbedder;
use aither_core::llm::model::Parameters;
use aither_core::llm::{LanguageModel, LLMRequest, Message, collect_text};
use docmind_retrieval::{RetrievalConfig, search};
use docmind_vectorstore::VectorStore;

use crate::context::{self, BuiltContext, ContextOptions};
use crate::citation::parse_citations;
use crate::error::{ResearchError, Result};
use crate::types::{AskRequest, Reference, ResearchMetadata, ResearchResult};

const MIN_QUERY_LEN: usize = 3;
const MAX_QUERY_LEN: usize = 500;
const MAX_TEMPERATURE: f32 = 0.3;

const REFUSAL_ANSWER: &str =
    "I couldn't find any relevant documents in the corpus to answer this question.";

const SYSTEM_PROMPT: &str = "You are a research assistant answering questions strictly from the \
numbered sources provided below. Cite every claim you make using the `[N]` marker matching the \
source it came from. Never state a fact that is not supported by a source. If the sources do \
not contain enough information to answer, say so plainly instead of guessing.";

/// Ties retrieval, context building, and a foundation LLM together into cited answers.
#[derive(Debug, Clone)]
pub struct ResearchOrchestrator<E, M> {
    embedder: Arc<E>,
    store: Arc<VectorStore>,
    model: Arc<M>,
    retrieval_config: RetrievalConfig,
    context_options: ContextOptions,
}

impl<E: MultiVectorEmbedder, M: LanguageModel> ResearchOrchestrator<E, M> {
    /// Creates an orchestrator over the given embedding backend, vector store, and LLM.
    pub fn new(
        embedder: Arc<E>,
        store: Arc<VectorStore>,
        model: Arc<M>,
        retrieval_config: RetrievalConfig,
        context_options: ContextOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            model,
            retrieval_config,
            context_options,
        }
    }

    /// The embedding backend this orchestrator searches with, for callers that need to run
    /// retrieval directly (e.g. a context-preview endpoint that skips the LLM call).
    pub fn embedder(&self) -> &E {
        self.embedder.as_ref()
    }

    /// Runs the full research flow for one question (spec §4.9).
    ///
    /// # Errors
    /// Returns [`ResearchError::InvalidQuery`] if the query fails length validation,
    /// [`ResearchError::Retrieval`] if search fails outright, or [`ResearchError::Llm`] if the
    /// foundation model call fails. A zero-hit search is not an error — it produces the
    /// canonical refusal answer instead (spec §4.9 "Refusal").
    pub async fn ask(&self, request: &AskRequest) -> Result<ResearchResult> {
        let total_start = Instant::now();
        validate_query(&request.query)?;

        let search_start = Instant::now();
        let hits = search(
            self.embedder.as_ref(),
            self.store.as_ref(),
            &request.query,
            request.search_mode,
            request.num_sources,
            &request.filters,
            &self.retrieval_config,
        )
        .await?;
        let search_latency_ms = elapsed_ms(search_start);

        if hits.is_empty() {
            return Ok(ResearchResult {
                answer_markdown: REFUSAL_ANSWER.to_string(),
                references: Vec::new(),
                metadata: ResearchMetadata {
                    search_latency_ms,
                    total_latency_ms: elapsed_ms(total_start),
                    ..ResearchMetadata::default()
                },
            });
        }

        let mut options = self.context_options.clone();
        options.num_sources = request.num_sources;
        options.vision_enabled = request.vision_enabled;
        let built = context::build_context(&hits, &options);

        let candidates: Vec<Reference> = hits
            .iter()
            .take(request.num_sources)
            .enumerate()
            .map(|(index, hit)| Reference {
                citation_number: index + 1,
                doc_id: hit.metadata.doc_id.clone(),
                filename: hit.metadata.filename.clone(),
                page: hit.metadata.page,
                thumbnail_url: built.image_urls.get(index).cloned(),
                is_visual: hit.is_visual,
            })
            .collect();

        let messages = assemble_messages(&built, &request.query);
        let parameters = Parameters::default().temperature(MAX_TEMPERATURE);
        let llm_request = LLMRequest::new(messages).with_parameters(parameters);

        let llm_start = Instant::now();
        let raw_answer = collect_text(self.model.respond(llm_request))
            .await
            .map_err(|err| ResearchError::Llm(anyhow::anyhow!(err.to_string())))?;
        let llm_latency_ms = elapsed_ms(llm_start);

        let (answer_markdown, references) = parse_citations(&raw_answer, &candidates);
        let tokens = estimate_tokens(&built.text) + estimate_tokens(&raw_answer);

        Ok(ResearchResult {
            answer_markdown,
            references,
            metadata: ResearchMetadata {
                preprocessing_applied: false,
                preprocessing_strategy: None,
                context_truncated: built.context_truncated,
                search_latency_ms,
                llm_latency_ms,
                total_latency_ms: elapsed_ms(total_start),
                tokens: tokens as u32,
                cost_est: 0.0,
            },
        })
    }
}

fn validate_query(query: &str) -> Result<()> {
    let len = query.chars().count();
    if !(MIN_QUERY_LEN..=MAX_QUERY_LEN).contains(&len) {
        return Err(ResearchError::InvalidQuery {
            min: MIN_QUERY_LEN,
            max: MAX_QUERY_LEN,
            actual: len,
        });
    }
    Ok(())
}

fn assemble_messages(context: &BuiltContext, query: &str) -> Vec<Message> {
    let user_text = format!("Context:\n{}\n\nQuestion: {query}", context.text);
    let user_message =
        Message::user(user_text).with_attachments(context.image_urls.iter().map(String::as_str));
    vec![Message::system(SYSTEM_PROMPT), user_message]
}

fn estimate_tokens(text: &str) -> usize {
    ((text.split_whitespace().count() as f32) * 1.3).ceil() as usize
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use aither_core::{MultiVector, llm::Event};
    use docmind_vectorstore::RecordContext;
    use futures_core::Stream;

    struct MockEmbedder;

    impl MultiVectorEmbedder for MockEmbedder {
        fn dim(&self) -> usize {
            4
        }
        async fn embed_images(&self, _images: Vec<Vec<u8>>) -> aither_core::Result<Vec<MultiVector>> {
            unimplemented!()
        }
        async fn embed_texts(&self, _texts: Vec<String>) -> aither_core::Result<Vec<MultiVector>> {
            unimplemented!()
        }
        async fn embed_query(&self, _query: &str) -> aither_core::Result<MultiVector> {
            Ok(MultiVector::new(vec![vec![1.0, 0.0, 0.0, 0.0]]).unwrap())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("mock llm error")]
    struct MockLlmError;

    struct MockModel {
        answer: String,
    }

    impl LanguageModel for MockModel {
        type Error = MockLlmError;

        fn respond(
            &self,
            _request: LLMRequest,
        ) -> impl Stream<Item = std::result::Result<Event, Self::Error>> + Send {
            futures_lite::stream::iter(vec![Ok(Event::Text(self.answer.clone()))])
        }

        async fn profile(&self) -> aither_core::llm::model::Profile {
            aither_core::llm::model::Profile::new("mock", "test", "mock", "mock model", 4096)
        }
    }

    fn store_with_one_doc() -> VectorStore {
        let store = VectorStore::with_dim(4);
        let vector = MultiVector::new(vec![vec![1.0, 0.0, 0.0, 0.0]; 2]).unwrap();
        store
            .add_text(
                "doc1",
                "report.pdf",
                1,
                3,
                &vector,
                "Revenue grew twelve percent.",
                4,
                None,
                RecordContext::default(),
            )
            .unwrap();
        store
    }

    fn orchestrator(answer: &str) -> ResearchOrchestrator<MockEmbedder, MockModel> {
        ResearchOrchestrator::new(
            Arc::new(MockEmbedder),
            Arc::new(store_with_one_doc()),
            Arc::new(MockModel {
                answer: answer.to_string(),
            }),
            RetrievalConfig::default(),
            ContextOptions::default(),
        )
    }

    #[tokio::test]
    async fn empty_corpus_triggers_refusal_without_calling_llm() {
        let orch = ResearchOrchestrator::new(
            Arc::new(MockEmbedder),
            Arc::new(VectorStore::with_dim(4)),
            Arc::new(MockModel {
                answer: "should not be reached".to_string(),
            }),
            RetrievalConfig::default(),
            ContextOptions::default(),
        );
        let result = orch.ask(&AskRequest::new("What is the revenue growth?")).await.unwrap();
        assert!(result.answer_markdown.contains("couldn't find"));
        assert!(result.references.is_empty());
    }

    #[tokio::test]
    async fn rejects_too_short_query() {
        let orch = orchestrator("irrelevant");
        let err = orch.ask(&AskRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, ResearchError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn binds_citation_marker_to_reference() {
        let orch = orchestrator("Revenue grew sharply [1].");
        let result = orch
            .ask(&AskRequest::new("What happened to revenue?"))
            .await
            .unwrap();
        assert_eq!(result.answer_markdown, "Revenue grew sharply [1].");
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].doc_id, "doc1");
    }
}
