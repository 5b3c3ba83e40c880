//! Result and reference shapes returned by the research orchestrator (spec §3, §4.9).

use docmind_vectorstore::Filters;
use docmind_retrieval::SearchMode;
use serde::Serialize;

/// A research question, as posted to `/research/ask` (spec §6).
#[derive(Debug, Clone)]
pub struct AskRequest {
    /// The natural-language query.
    pub query: String,
    /// How many ranked hits to turn into sources. Defaults to 5.
    pub num_sources: usize,
    /// Which collection(s) to search. Defaults to [`SearchMode::Hybrid`].
    pub search_mode: SearchMode,
    /// Metadata filters, applied post-ANN-search (spec §4.7).
    pub filters: Filters,
    /// Whether the requesting client can accept image parts in the LLM prompt.
    pub vision_enabled: bool,
}

impl AskRequest {
    /// Creates a request with spec-default `num_sources`/`search_mode`/vision settings.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            num_sources: 5,
            search_mode: SearchMode::Hybrid,
            filters: Filters::new(),
            vision_enabled: false,
        }
    }
}

/// A single citeable source, 1:1 with a `[N]` marker in `answer_markdown`.
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    /// 1-based citation number, matching the `[N]` marker it backs.
    pub citation_number: usize,
    /// Document this reference points into.
    pub doc_id: String,
    /// Originating filename.
    pub filename: String,
    /// 1-based page number.
    pub page: usize,
    /// Thumbnail URL, present for visual hits when an image base URL is configured.
    pub thumbnail_url: Option<String>,
    /// `true` if this reference came from the visual collection.
    pub is_visual: bool,
}

/// Latency/usage metadata attached to every research answer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResearchMetadata {
    /// `true` if local-LLM context preprocessing ran.
    pub preprocessing_applied: bool,
    /// Strategy used, if preprocessing ran (`extract_facts` or `compress`).
    pub preprocessing_strategy: Option<String>,
    /// `true` if the context builder had to truncate the last included source to fit budget.
    pub context_truncated: bool,
    /// Wall-clock time spent in retrieval, in milliseconds.
    pub search_latency_ms: u64,
    /// Wall-clock time spent waiting on the foundation LLM, in milliseconds.
    pub llm_latency_ms: u64,
    /// Wall-clock time for the whole request, in milliseconds.
    pub total_latency_ms: u64,
    /// Approximate token count of the assembled prompt + answer (no provider usage event is
    /// available on the core `Event` stream, so this is the same `words * 1.3` estimator the
    /// chunker uses, not an exact provider-reported count).
    pub tokens: u32,
    /// Rough cost estimate in USD, `0.0` when no pricing table is configured.
    pub cost_est: f32,
}

/// The orchestrator's answer to a research question (spec §3 `ResearchResult`).
#[derive(Debug, Clone, Serialize)]
pub struct ResearchResult {
    /// Cited answer text. Citations appear as canonical `[N]` markers.
    pub answer_markdown: String,
    /// References `[N]` markers are bound to, 1:1 by `citation_number`.
    pub references: Vec<Reference>,
    /// Latency/usage metadata for this request.
    pub metadata: ResearchMetadata,
}
