//! Two-collection multi-vector store (spec §4.5): `visual` and `text` collections, each ANN
//! indexed by CLS token with the full late-interaction sequence compressed into metadata.
//!
//! Grounded on `aither-rag`'s HNSW index (`rag/src/index/hnsw.rs`) and redb persistence
//! (`rag/src/persistence/redb_backend.rs`), generalized from a single text-chunk collection to
//! two collections storing [`aither_core::MultiVector`] sequences instead of single embeddings.

mod collection;
mod error;
mod persistence;
mod store;
mod types;

pub use error::{Result, VectorStoreError};
pub use store::{RecordContext, VectorStore, EMBEDDING_DIM};
pub use types::{
    BBox, Collection, DocumentSummary, EmbeddingPrecision, Filters, RecordMetadata, SearchHit,
    Stats,
};
