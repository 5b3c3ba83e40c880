//! Record and metadata types shared by both collections (spec §3 `EmbeddingRecord`).

use std::collections::BTreeMap;

/// Which of the two collections a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Rendered page images, embedded for visual (late-interaction) search.
    Visual,
    /// Text chunks, embedded for text search.
    Text,
}

impl Collection {
    /// The `type` metadata tag spec §3 expects on every record.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Text => "text",
        }
    }
}

/// Numeric precision a record's `full_embeddings` blob was compressed at (spec §6
/// `EMBEDDING_PRECISION`). Carried per-record rather than per-store so a precision change takes
/// effect on the next write without orphaning already-stored blobs: [`crate::VectorStore::get_full`]
/// reads this field to pick the matching codec path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum EmbeddingPrecision {
    /// Bit-exact `float32` (the vector store's own default; not a config-selectable value).
    #[default]
    Fp32,
    /// Half precision (`binary16`), spec default.
    Fp16,
    /// 8-bit linear quantization.
    Int8,
}

/// A bounding box, carried opaquely (the vector store does not interpret bbox semantics; see
/// `docmind-docparse::BBox` for the authoritative `(left, bottom, right, top)` contract).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    /// Left edge.
    pub left: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Right edge.
    pub right: f32,
    /// Top edge.
    pub top: f32,
}

/// Metadata stored alongside a record's CLS vector. `full_embeddings` is the codec-compressed
/// blob of the entire `(L, D)` sequence; callers needing it should use [`crate::VectorStore::get_full`]
/// rather than this field directly once it has been stripped from a search response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecordMetadata {
    /// Deterministic content-hash document identifier (spec §3).
    pub doc_id: String,
    /// Originating filename.
    pub filename: String,
    /// 1-based page number this record is anchored to.
    pub page: usize,
    /// Which collection this record lives in.
    #[serde(with = "collection_serde")]
    pub kind: Collection,
    /// Codec-compressed full `(L, D)` sequence (spec §4.1).
    pub full_embeddings: String,
    /// Numeric precision `full_embeddings` was packed at; selects the codec path on read.
    #[serde(default)]
    pub precision: EmbeddingPrecision,
    /// `L`: sequence length of the full embedding.
    pub seq_length: usize,
    /// `D`: vector dimension (768 for the reference model).
    pub embedding_dim: usize,
    /// Bounding box, when the source item carried provenance.
    pub bbox: Option<BBox>,
    /// Codec-compressed serialized structural context (tables/pictures near this page), if any.
    pub structure_compressed: Option<String>,
    /// Freeform page-level context string (e.g. section path at the top of the page).
    pub page_context: Option<String>,
    /// ISO-8601 UTC insertion timestamp.
    pub timestamp: String,
    /// Path to the source file this record was derived from.
    pub source_path: String,
    /// Text-only: stable chunk identifier within the document.
    pub chunk_id: Option<u32>,
    /// Text-only: truncated preview of the chunk text, at most 200 characters.
    pub text_preview: Option<String>,
    /// Text-only: word count of the full chunk text.
    pub word_count: Option<usize>,
    /// Text-only: codec-compressed serialized [`docmind_docparse::ChunkContext`].
    pub context_compressed: Option<String>,
}

impl RecordMetadata {
    /// The stable ID format for this record: `"{doc_id}-page{page:03}"` for visual,
    /// `"{doc_id}-chunk{chunk_id:04}"` for text (spec §3).
    ///
    /// # Panics
    /// Panics if `kind` is `Text` and `chunk_id` is `None` — callers must always set `chunk_id`
    /// for text records.
    #[must_use]
    pub fn record_id(&self) -> String {
        match self.kind {
            Collection::Visual => format!("{}-page{:03}", self.doc_id, self.page),
            Collection::Text => format!(
                "{}-chunk{:04}",
                self.doc_id,
                self.chunk_id.expect("text record must carry chunk_id")
            ),
        }
    }

    /// Returns a copy with `full_embeddings` cleared, matching spec §4.5's search response
    /// contract ("metadata (minus `full_embeddings`)").
    #[must_use]
    pub fn without_full_embeddings(&self) -> Self {
        Self {
            full_embeddings: String::new(),
            ..self.clone()
        }
    }

    /// Exact-match filter fields this record exposes (spec §4.7 "any metadata key is
    /// filterable").
    #[must_use]
    pub fn filter_map(&self) -> BTreeMap<&'static str, String> {
        let mut map = BTreeMap::new();
        map.insert("doc_id", self.doc_id.clone());
        map.insert("filename", self.filename.clone());
        map.insert("type", self.kind.tag().to_string());
        map.insert("page", self.page.to_string());
        map
    }
}

mod collection_serde {
    use super::Collection;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Collection, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.tag())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Collection, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.as_str() {
            "visual" => Ok(Collection::Visual),
            "text" => Ok(Collection::Text),
            other => Err(serde::de::Error::custom(format!(
                "unknown collection tag {other:?}"
            ))),
        }
    }
}

/// Exact-match metadata filters, applied at ANN search time (spec §4.7).
pub type Filters = BTreeMap<String, String>;

/// One stage-1 ANN search hit: CLS-similarity score plus metadata with the full embedding
/// blob stripped.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The record's stable ID.
    pub id: String,
    /// Cosine similarity of the query CLS vector against this record's CLS vector, in `[0,1]`.
    pub score: f32,
    /// Metadata, with `full_embeddings` cleared.
    pub metadata: RecordMetadata,
}

/// Aggregate store statistics (spec §4.5).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct Stats {
    /// Row count in the visual collection.
    pub visual_count: usize,
    /// Row count in the text collection.
    pub text_count: usize,
    /// Distinct `doc_id`s across both collections.
    pub distinct_docs: usize,
    /// Approximate on-disk storage size, in megabytes.
    pub approx_storage_mb: f64,
}

/// Per-document summary aggregated across both collections (spec §6 `GET /documents`,
/// `GET /documents/{doc_id}`).
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentSummary {
    /// Content-hash document identifier.
    pub doc_id: String,
    /// Originating filename.
    pub filename: String,
    /// Visual (page image) records stored for this document.
    pub visual_pages: usize,
    /// Text chunk records stored for this document.
    pub text_chunks: usize,
    /// Source file path recorded at insertion time.
    pub source_path: String,
    /// Most recent ISO-8601 UTC timestamp among this document's records.
    pub timestamp: String,
}
