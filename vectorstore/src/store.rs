//! Two-collection vector store adapter (spec §4.5): `visual_collection` and `text_collection`,
//! each an [`AnnCollection`], backed by a shared [`VectorStorePersistence`] database.

use aither_core::MultiVector;

use crate::collection::AnnCollection;
use crate::error::{Result, VectorStoreError};
use crate::persistence::VectorStorePersistence;
use crate::types::{
    BBox, Collection, DocumentSummary, EmbeddingPrecision, Filters, RecordMetadata, SearchHit,
    Stats,
};

/// Reference embedding dimension (spec §3); validated on every insert.
pub const EMBEDDING_DIM: usize = 768;

/// Fields shared by visual and text inserts that the caller supplies per record.
#[derive(Debug, Clone, Default)]
pub struct RecordContext {
    /// Bounding box, if the source item carried provenance.
    pub bbox: Option<BBox>,
    /// Codec-compressed serialized structure near this page.
    pub structure_compressed: Option<String>,
    /// Freeform page-level context.
    pub page_context: Option<String>,
    /// ISO-8601 UTC insertion timestamp.
    pub timestamp: String,
    /// Source file path.
    pub source_path: String,
}

/// Two-collection multi-vector store: visual (page images) and text (chunks), each ANN-indexed
/// by CLS token with the full sequence compressed into metadata.
pub struct VectorStore {
    dim: usize,
    visual: AnnCollection,
    text: AnnCollection,
    persistence: Option<VectorStorePersistence>,
    precision: EmbeddingPrecision,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("dim", &self.dim)
            .field("visual", &self.visual)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl VectorStore {
    /// Creates an in-memory store with the reference embedding dimension ([`EMBEDDING_DIM`]).
    #[must_use]
    pub fn new() -> Self {
        Self::with_dim(EMBEDDING_DIM)
    }

    /// Creates an in-memory store with a custom dimension (primarily for tests against
    /// non-reference embedders).
    #[must_use]
    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim,
            visual: AnnCollection::new(dim),
            text: AnnCollection::new(dim),
            persistence: None,
            precision: EmbeddingPrecision::default(),
        }
    }

    /// Opens a store backed by an on-disk redb database, loading any existing records.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        let persistence = VectorStorePersistence::open(path)?;
        let visual = AnnCollection::new(EMBEDDING_DIM);
        let text = AnnCollection::new(EMBEDDING_DIM);
        visual.load(persistence.load(Collection::Visual)?)?;
        text.load(persistence.load(Collection::Text)?)?;
        Ok(Self {
            dim: EMBEDDING_DIM,
            visual,
            text,
            persistence: Some(persistence),
            precision: EmbeddingPrecision::default(),
        })
    }

    /// Sets the precision new records are compressed at (spec §6 `EMBEDDING_PRECISION`).
    /// Existing records keep whichever precision they were written with — each carries its own
    /// [`EmbeddingPrecision`] tag, so changing this never invalidates already-stored blobs.
    #[must_use]
    pub fn with_precision(mut self, precision: EmbeddingPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Flushes both collections to the backing database, if one is configured.
    pub fn flush(&self) -> Result<()> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };
        persistence.save(Collection::Visual, &self.visual.snapshot())?;
        persistence.save(Collection::Text, &self.text.snapshot())?;
        Ok(())
    }

    fn validate(&self, multivec: &MultiVector) -> Result<()> {
        if multivec.is_empty() {
            return Err(VectorStoreError::EmbeddingValidation(
                "sequence length L must be > 0".to_string(),
            ));
        }
        if multivec.dim() != self.dim {
            return Err(VectorStoreError::EmbeddingValidation(format!(
                "embedding dim {} does not match store dim {}",
                multivec.dim(),
                self.dim
            )));
        }
        if !multivec.all_finite() {
            return Err(VectorStoreError::EmbeddingValidation(
                "embedding contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    fn compress_sequence(&self, multivec: &MultiVector) -> Result<String> {
        let flat: Vec<f32> = multivec.rows().iter().flatten().copied().collect();
        Ok(match self.precision {
            EmbeddingPrecision::Fp32 => docmind_codec::compress_f32(&flat)?,
            EmbeddingPrecision::Fp16 => docmind_codec::compress_f16(&flat)?,
            EmbeddingPrecision::Int8 => docmind_codec::compress_i8(&flat)?,
        })
    }

    /// Inserts (or replaces) a visual record for `doc_id`/`page`. Returns the record's stable ID.
    pub fn add_visual(
        &self,
        doc_id: &str,
        filename: &str,
        page: usize,
        multivec: &MultiVector,
        ctx: RecordContext,
    ) -> Result<String> {
        self.validate(multivec)?;
        let full_embeddings = self.compress_sequence(multivec)?;
        let metadata = RecordMetadata {
            doc_id: doc_id.to_string(),
            filename: filename.to_string(),
            page,
            kind: Collection::Visual,
            full_embeddings,
            precision: self.precision,
            seq_length: multivec.len(),
            embedding_dim: multivec.dim(),
            bbox: ctx.bbox,
            structure_compressed: ctx.structure_compressed,
            page_context: ctx.page_context,
            timestamp: ctx.timestamp,
            source_path: ctx.source_path,
            chunk_id: None,
            text_preview: None,
            word_count: None,
            context_compressed: None,
        };
        let cls = multivec.cls().to_vec();
        let id = metadata.record_id();
        self.visual.upsert(cls, metadata)?;
        Ok(id)
    }

    /// Inserts (or replaces) a text-chunk record. Returns the record's stable ID.
    #[allow(clippy::too_many_arguments)]
    pub fn add_text(
        &self,
        doc_id: &str,
        filename: &str,
        chunk_id: u32,
        page: usize,
        multivec: &MultiVector,
        text_preview: &str,
        word_count: usize,
        context_compressed: Option<String>,
        ctx: RecordContext,
    ) -> Result<String> {
        self.validate(multivec)?;
        let full_embeddings = self.compress_sequence(multivec)?;
        let preview: String = text_preview.chars().take(200).collect();
        let metadata = RecordMetadata {
            doc_id: doc_id.to_string(),
            filename: filename.to_string(),
            page,
            kind: Collection::Text,
            full_embeddings,
            precision: self.precision,
            seq_length: multivec.len(),
            embedding_dim: multivec.dim(),
            bbox: ctx.bbox,
            structure_compressed: ctx.structure_compressed,
            page_context: ctx.page_context,
            timestamp: ctx.timestamp,
            source_path: ctx.source_path,
            chunk_id: Some(chunk_id),
            text_preview: Some(preview),
            word_count: Some(word_count),
            context_compressed,
        };
        let cls = multivec.cls().to_vec();
        let id = metadata.record_id();
        self.text.upsert(cls, metadata)?;
        Ok(id)
    }

    fn collection(&self, which: Collection) -> &AnnCollection {
        match which {
            Collection::Visual => &self.visual,
            Collection::Text => &self.text,
        }
    }

    /// Stage-1 ANN search against one collection (spec §4.5/§4.7).
    pub fn search(
        &self,
        which: Collection,
        query_cls: &[f32],
        k: usize,
        filters: &Filters,
    ) -> Result<Vec<SearchHit>> {
        self.collection(which).search(query_cls, k, filters)
    }

    /// Retrieves and decompresses the full `(L, D)` sequence for a record, flattened row-major.
    /// Fails with [`VectorStoreError::NotFound`] if the ID does not exist, or
    /// [`VectorStoreError::DataIntegrity`] if the blob is corrupt — decompression failure is
    /// never masked with zero-fill (spec §4.5).
    pub fn get_full(&self, which: Collection, id: &str) -> Result<Vec<f32>> {
        let metadata = self
            .collection(which)
            .get_full_metadata(id)
            .ok_or_else(|| VectorStoreError::NotFound(id.to_string()))?;
        let expected_len = metadata.seq_length * metadata.embedding_dim;
        let decoded = match metadata.precision {
            EmbeddingPrecision::Fp32 => {
                docmind_codec::decompress_f32(&metadata.full_embeddings, expected_len)
            }
            EmbeddingPrecision::Fp16 => {
                docmind_codec::decompress_f16(&metadata.full_embeddings, expected_len)
            }
            EmbeddingPrecision::Int8 => {
                docmind_codec::decompress_i8(&metadata.full_embeddings, expected_len)
            }
        };
        decoded.map_err(|e| VectorStoreError::DataIntegrity {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Retrieves full metadata (including the compressed blob) for a record.
    pub fn get_metadata(&self, which: Collection, id: &str) -> Result<RecordMetadata> {
        self.collection(which)
            .get_full_metadata(id)
            .ok_or_else(|| VectorStoreError::NotFound(id.to_string()))
    }

    /// Deletes every record for `doc_id` across both collections. Returns
    /// `(visual_count, text_count)` removed.
    pub fn delete(&self, doc_id: &str) -> (usize, usize) {
        (
            self.visual.delete_doc(doc_id),
            self.text.delete_doc(doc_id),
        )
    }

    /// Removes `doc_id`'s records left over from a prior run (spec §5 forced-reprocess cleanup).
    /// `keep_visual_ids`/`keep_text_ids` are the record IDs the current run just wrote; anything
    /// else under `doc_id` predates this run and is deleted. Call this only after the current
    /// run's writes have landed, so a document never has a window where valid records are
    /// missing. Returns `(visual_pruned, text_pruned)`.
    pub fn prune_stale(
        &self,
        doc_id: &str,
        keep_visual_ids: &std::collections::HashSet<String>,
        keep_text_ids: &std::collections::HashSet<String>,
    ) -> (usize, usize) {
        (
            self.visual.prune_doc_except(doc_id, keep_visual_ids),
            self.text.prune_doc_except(doc_id, keep_text_ids),
        )
    }

    /// Aggregate statistics across both collections (spec §4.5).
    #[must_use]
    pub fn stats(&self) -> Stats {
        let mut distinct = std::collections::HashSet::new();
        for (_, metadata) in self.visual.snapshot() {
            distinct.insert(metadata.doc_id);
        }
        for (_, metadata) in self.text.snapshot() {
            distinct.insert(metadata.doc_id);
        }
        let approx_storage_mb = self
            .persistence
            .as_ref()
            .and_then(|p| std::fs::metadata(p.path()).ok())
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);
        Stats {
            visual_count: self.visual.len(),
            text_count: self.text.len(),
            distinct_docs: distinct.len(),
            approx_storage_mb,
        }
    }

    /// Lists every distinct document, newest-first by last-touched timestamp (spec §6
    /// `GET /documents`).
    #[must_use]
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        let mut by_doc: std::collections::HashMap<String, DocumentSummary> =
            std::collections::HashMap::new();

        for (_, metadata) in self.visual.snapshot() {
            let entry = by_doc
                .entry(metadata.doc_id.clone())
                .or_insert_with(|| DocumentSummary {
                    doc_id: metadata.doc_id.clone(),
                    filename: metadata.filename.clone(),
                    visual_pages: 0,
                    text_chunks: 0,
                    source_path: metadata.source_path.clone(),
                    timestamp: metadata.timestamp.clone(),
                });
            entry.visual_pages += 1;
            if metadata.timestamp > entry.timestamp {
                entry.timestamp = metadata.timestamp;
            }
        }
        for (_, metadata) in self.text.snapshot() {
            let entry = by_doc
                .entry(metadata.doc_id.clone())
                .or_insert_with(|| DocumentSummary {
                    doc_id: metadata.doc_id.clone(),
                    filename: metadata.filename.clone(),
                    visual_pages: 0,
                    text_chunks: 0,
                    source_path: metadata.source_path.clone(),
                    timestamp: metadata.timestamp.clone(),
                });
            entry.text_chunks += 1;
            if metadata.timestamp > entry.timestamp {
                entry.timestamp = metadata.timestamp;
            }
        }

        let mut docs: Vec<DocumentSummary> = by_doc.into_values().collect();
        docs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        docs
    }

    /// Looks up one document's summary by ID (spec §6 `GET /documents/{doc_id}`).
    #[must_use]
    pub fn document(&self, doc_id: &str) -> Option<DocumentSummary> {
        self.list_documents().into_iter().find(|doc| doc.doc_id == doc_id)
    }
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(dim: usize, len: usize) -> MultiVector {
        MultiVector::new(
            (0..len)
                .map(|i| (0..dim).map(|j| (i * dim + j) as f32 * 0.01).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn insert_get_full_round_trips() {
        let store = VectorStore::with_dim(8);
        let vector = mv(8, 5);
        let id = store
            .add_visual("doc1", "report.pdf", 1, &vector, RecordContext::default())
            .unwrap();
        assert_eq!(id, "doc1-page001");

        let full = store.get_full(Collection::Visual, &id).unwrap();
        let expected: Vec<f32> = vector.rows().iter().flatten().copied().collect();
        assert_eq!(full, expected);
    }

    #[test]
    fn fp16_precision_round_trips_within_epsilon() {
        let store = VectorStore::with_dim(8).with_precision(EmbeddingPrecision::Fp16);
        let vector = mv(8, 5);
        let id = store
            .add_visual("doc1", "report.pdf", 1, &vector, RecordContext::default())
            .unwrap();
        let full = store.get_full(Collection::Visual, &id).unwrap();
        let expected: Vec<f32> = vector.rows().iter().flatten().copied().collect();
        for (a, b) in full.iter().zip(expected.iter()) {
            assert!((a - b).abs() <= 1e-3);
        }
    }

    #[test]
    fn rejects_wrong_dimension() {
        let store = VectorStore::with_dim(8);
        let vector = mv(4, 5);
        let err = store
            .add_visual("doc1", "report.pdf", 1, &vector, RecordContext::default())
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::EmbeddingValidation(_)));
    }

    #[test]
    fn delete_cascades_and_search_returns_empty() {
        let store = VectorStore::with_dim(8);
        let vector = mv(8, 5);
        store
            .add_visual("doc1", "report.pdf", 1, &vector, RecordContext::default())
            .unwrap();
        store
            .add_text(
                "doc1",
                "report.pdf",
                1,
                1,
                &vector,
                "preview",
                10,
                None,
                RecordContext::default(),
            )
            .unwrap();

        let (v, t) = store.delete("doc1");
        assert_eq!((v, t), (1, 1));

        let hits = store
            .search(Collection::Visual, vector.cls(), 10, &Filters::new())
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn stats_counts_distinct_docs() {
        let store = VectorStore::with_dim(8);
        let vector = mv(8, 3);
        store
            .add_visual("doc1", "a.pdf", 1, &vector, RecordContext::default())
            .unwrap();
        store
            .add_visual("doc1", "a.pdf", 2, &vector, RecordContext::default())
            .unwrap();
        store
            .add_visual("doc2", "b.pdf", 1, &vector, RecordContext::default())
            .unwrap();

        let stats = store.stats();
        assert_eq!(stats.visual_count, 3);
        assert_eq!(stats.distinct_docs, 2);
    }

    #[test]
    fn list_documents_aggregates_both_collections_per_doc() {
        let store = VectorStore::with_dim(8);
        let vector = mv(8, 3);
        store
            .add_visual("doc1", "a.pdf", 1, &vector, RecordContext::default())
            .unwrap();
        store
            .add_text(
                "doc1",
                "a.pdf",
                1,
                1,
                &vector,
                "preview",
                1,
                None,
                RecordContext::default(),
            )
            .unwrap();
        store
            .add_visual("doc2", "b.pdf", 1, &vector, RecordContext::default())
            .unwrap();

        let docs = store.list_documents();
        assert_eq!(docs.len(), 2);
        let doc1 = docs.iter().find(|d| d.doc_id == "doc1").unwrap();
        assert_eq!(doc1.visual_pages, 1);
        assert_eq!(doc1.text_chunks, 1);
        assert!(store.document("doc2").is_some());
        assert!(store.document("doc3").is_none());
    }

    #[test]
    fn text_preview_truncates_at_200_chars() {
        let store = VectorStore::with_dim(8);
        let vector = mv(8, 3);
        let long_text = "a".repeat(500);
        let id = store
            .add_text(
                "doc1",
                "a.pdf",
                1,
                1,
                &vector,
                &long_text,
                500,
                None,
                RecordContext::default(),
            )
            .unwrap();
        let metadata = store.get_metadata(Collection::Text, &id).unwrap();
        assert_eq!(metadata.text_preview.unwrap().len(), 200);
    }
}
