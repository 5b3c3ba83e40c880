use thiserror::Error;

/// Errors raised by the vector store adapter (spec §4.5 / §7).
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// A multi-vector sequence failed shape/dtype validation on insert.
    #[error("embedding validation failed: {0}")]
    EmbeddingValidation(String),
    /// Compression of the full sequence failed, or the compressed blob exceeds the metadata
    /// size budget.
    #[error("compression error: {0}")]
    Compression(#[from] docmind_codec::CodecError),
    /// The backing store could not be reached (transient; retried by callers per spec §7).
    #[error("vector store connection error: {0}")]
    Connection(String),
    /// A `get_full` lookup found no record with the given ID.
    #[error("record not found: {0}")]
    NotFound(String),
    /// A compressed blob failed to decompress or decoded to the wrong length: never masked.
    #[error("data integrity error for record {id}: {reason}")]
    DataIntegrity {
        /// The offending record ID.
        id: String,
        /// What went wrong.
        reason: String,
    },
    /// Underlying persistence (redb) failure.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// I/O failure opening or creating the database file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, VectorStoreError>;
