//! Errors raised while answering a research question (spec §4.9 / §7).

use thiserror::Error;

/// Errors surfaced by this crate.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// The query failed the 3–500 character validation bound.
    #[error("query must be between {min} and {max} characters, got {actual}")]
    InvalidQuery {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
        /// Length actually observed.
        actual: usize,
    },
    /// Retrieval failed outright (not to be confused with a zero-hit result, which is a
    /// normal refusal path, not an error).
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] docmind_retrieval::RetrievalError),
    /// The foundation LLM call failed.
    #[error("language model call failed: {0}")]
    Llm(#[source] anyhow::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ResearchError>;
