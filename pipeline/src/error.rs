//! Errors raised by the document processor, status fabric, and upload registry (spec §4.6 /
//! §7).

use thiserror::Error;

/// Errors surfaced by this crate. Validation errors are reported straight to the caller;
/// transient and resource errors end a document's run with `status = failed` (spec §7).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document failed to parse (format-level failure, not a degradable one).
    #[error("parse failed: {0}")]
    Parse(#[from] docmind_docparse::DocparseError),
    /// All pages failed visual embedding. Not itself a document-failing error (spec §4.6
    /// graceful degradation commits text-only with `visual_embeddings=0`); kept as a distinct
    /// variant so callers that do want to treat it as fatal (e.g. a visual-only reprocessing
    /// request) can match on it.
    #[error("visual embedding failed for all {count} pages: {reason}")]
    VisualEmbeddingExhausted {
        /// Pages attempted.
        count: usize,
        /// Last underlying embedder error observed.
        reason: String,
    },
    /// All chunks failed text embedding — unlike the visual case, this fails the document
    /// (spec §4.6: a stage with zero surviving units is not "graceful").
    #[error("text embedding failed for all {count} chunks: {reason}")]
    TextEmbeddingExhausted {
        /// Chunks attempted.
        count: usize,
        /// Last underlying embedder error observed.
        reason: String,
    },
    /// A storage write failed twice in a row for the same record (spec §4.6: retried once,
    /// second failure fails the document).
    #[error("vector store write failed after retry: {0}")]
    Storage(#[from] docmind_vectorstore::VectorStoreError),
    /// The requested document is not known to the status manager.
    #[error("no status recorded for document {0}")]
    UnknownDocument(String),
    /// `reprocess` was requested for a document that is already actively processing.
    #[error("document {0} is already processing")]
    AlreadyProcessing(String),
    /// The upload registry is at `MAX_QUEUE` capacity (spec §5 backpressure).
    #[error("processing queue is full ({0} documents active)")]
    QueueFull(usize),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
