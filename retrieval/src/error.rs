use thiserror::Error;

/// Errors raised while running a two-stage retrieval (spec §4.7).
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The embedding backend failed to embed the query string.
    #[error("query embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),
    /// A vector store operation (search / `get_full`) failed.
    #[error("vector store error: {0}")]
    VectorStore(#[from] docmind_vectorstore::VectorStoreError),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, RetrievalError>;
