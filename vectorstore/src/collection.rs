//! A single ANN collection: CLS-token index plus full metadata, per spec §4.5.
//!
//! Grounded on `aither-rag`'s `HnswIndex` (`rag/src/index/hnsw.rs`): same `instant-distance`
//! HNSW graph, cosine distance, rebuild-on-dirty strategy. Generalized to store
//! [`RecordMetadata`] instead of RAG `Chunk`s and to key entries by the spec's stable record ID
//! rather than a caller-supplied chunk ID.

use std::collections::HashMap;

use instant_distance::{Builder, HnswMap, Point, Search};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;

use crate::error::{Result, VectorStoreError};
use crate::types::{Filters, RecordMetadata, SearchHit};

#[derive(Clone, Debug)]
struct ClsPoint {
    cls: Vec<f32>,
}

impl Point for ClsPoint {
    fn distance(&self, other: &Self) -> f32 {
        1.0 - cosine_similarity(&self.cls, &other.cls)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

struct Entry {
    cls: Vec<f32>,
    metadata: RecordMetadata,
}

struct State {
    entries: Vec<Entry>,
    id_to_index: HashMap<String, usize>,
    hnsw: Option<HnswMap<ClsPoint, usize>>,
    dirty: bool,
}

impl State {
    fn rebuild(&mut self) {
        if self.entries.is_empty() {
            self.hnsw = None;
            self.dirty = false;
            return;
        }
        let points: Vec<ClsPoint> = self
            .entries
            .iter()
            .map(|e| ClsPoint { cls: e.cls.clone() })
            .collect();
        let indices: Vec<usize> = (0..self.entries.len()).collect();
        self.hnsw = Some(Builder::default().build(points, indices));
        self.dirty = false;
    }
}

/// One ANN-indexed collection (visual or text). CLS vectors are the index key; the full
/// sequence lives only in `metadata.full_embeddings`, fetched via [`Self::get_full_metadata`].
pub struct AnnCollection {
    dim: usize,
    state: RwLock<State>,
}

impl std::fmt::Debug for AnnCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("AnnCollection")
            .field("dim", &self.dim)
            .field("len", &state.entries.len())
            .finish()
    }
}

impl AnnCollection {
    /// Creates an empty collection with the given CLS vector dimension.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            state: RwLock::new(State {
                entries: Vec::new(),
                id_to_index: HashMap::new(),
                hnsw: None,
                dirty: false,
            }),
        }
    }

    /// Inserts or replaces a record, keyed by `metadata.record_id()`.
    pub fn upsert(&self, cls: Vec<f32>, metadata: RecordMetadata) -> Result<()> {
        if cls.len() != self.dim {
            return Err(VectorStoreError::EmbeddingValidation(format!(
                "CLS vector has dimension {}, expected {}",
                cls.len(),
                self.dim
            )));
        }
        let id = metadata.record_id();
        let mut state = self.state.write();
        if let Some(&idx) = state.id_to_index.get(&id) {
            state.entries[idx] = Entry { cls, metadata };
        } else {
            let idx = state.entries.len();
            state.id_to_index.insert(id, idx);
            state.entries.push(Entry { cls, metadata });
        }
        state.dirty = true;
        Ok(())
    }

    /// Removes every record for `doc_id`. Returns the number of records removed.
    pub fn delete_doc(&self, doc_id: &str) -> usize {
        let mut state = self.state.write();
        let ids_to_remove: Vec<String> = state
            .entries
            .iter()
            .filter(|e| e.metadata.doc_id == doc_id)
            .map(|e| e.metadata.record_id())
            .collect();
        for id in &ids_to_remove {
            if let Some(&idx) = state.id_to_index.get(id) {
                let removed_id = state.entries[idx].metadata.record_id();
                state.entries.swap_remove(idx);
                state.id_to_index.remove(&removed_id);
                if idx < state.entries.len() {
                    let swapped_id = state.entries[idx].metadata.record_id();
                    state.id_to_index.insert(swapped_id, idx);
                }
            }
        }
        if !ids_to_remove.is_empty() {
            state.dirty = true;
        }
        ids_to_remove.len()
    }

    /// Removes `doc_id`'s records whose ID is not in `keep_ids` (spec §5 forced-reprocess
    /// cleanup). Called after a reprocess has already written its new records, so this only ever
    /// removes records the new run superseded, never ones it just wrote.
    pub fn prune_doc_except(&self, doc_id: &str, keep_ids: &std::collections::HashSet<String>) -> usize {
        let mut state = self.state.write();
        let ids_to_remove: Vec<String> = state
            .entries
            .iter()
            .filter(|e| e.metadata.doc_id == doc_id && !keep_ids.contains(&e.metadata.record_id()))
            .map(|e| e.metadata.record_id())
            .collect();
        for id in &ids_to_remove {
            if let Some(&idx) = state.id_to_index.get(id) {
                let removed_id = state.entries[idx].metadata.record_id();
                state.entries.swap_remove(idx);
                state.id_to_index.remove(&removed_id);
                if idx < state.entries.len() {
                    let swapped_id = state.entries[idx].metadata.record_id();
                    state.id_to_index.insert(swapped_id, idx);
                }
            }
        }
        if !ids_to_remove.is_empty() {
            state.dirty = true;
        }
        ids_to_remove.len()
    }

    /// Stage-1 ANN search: top-`k` candidates by CLS cosine similarity, with exact-match
    /// metadata filters applied (spec §4.7). Filters are checked post-search against the
    /// full candidate set the index returns, which is sufficient because `k` is itself an
    /// over-fetch relative to the reranked top-N the retrieval engine actually keeps.
    pub fn search(&self, query_cls: &[f32], k: usize, filters: &Filters) -> Result<Vec<SearchHit>> {
        if query_cls.len() != self.dim {
            return Err(VectorStoreError::EmbeddingValidation(format!(
                "query CLS vector has dimension {}, expected {}",
                query_cls.len(),
                self.dim
            )));
        }
        let mut state = self.state.write();
        if state.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if state.dirty || state.hnsw.is_none() {
            state.rebuild();
        }
        let Some(ref hnsw) = state.hnsw else {
            return Ok(Vec::new());
        };

        let query_point = ClsPoint {
            cls: query_cls.to_vec(),
        };
        let mut search = Search::default();
        let mut hits = Vec::new();
        for candidate in hnsw.search(&query_point, &mut search) {
            let idx = *candidate.value;
            let entry = &state.entries[idx];
            if !matches_filters(&entry.metadata, filters) {
                continue;
            }
            hits.push(SearchHit {
                id: entry.metadata.record_id(),
                score: (1.0 - candidate.distance).clamp(0.0, 1.0),
                metadata: entry.metadata.without_full_embeddings(),
            });
            if hits.len() >= k {
                break;
            }
        }
        Ok(hits)
    }

    /// Full metadata (including the compressed `full_embeddings` blob) for a given record ID.
    #[must_use]
    pub fn get_full_metadata(&self, id: &str) -> Option<RecordMetadata> {
        let state = self.state.read();
        let &idx = state.id_to_index.get(id)?;
        Some(state.entries[idx].metadata.clone())
    }

    /// Row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored record, for persistence.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(Vec<f32>, RecordMetadata)> {
        self.state
            .read()
            .entries
            .iter()
            .map(|e| (e.cls.clone(), e.metadata.clone()))
            .collect()
    }

    /// Replaces the collection's contents wholesale (used when loading from persistence).
    pub fn load(&self, records: Vec<(Vec<f32>, RecordMetadata)>) -> Result<()> {
        let mut state = self.state.write();
        state.entries.clear();
        state.id_to_index.clear();
        for (cls, metadata) in records {
            if cls.len() != self.dim {
                return Err(VectorStoreError::EmbeddingValidation(format!(
                    "persisted CLS vector has dimension {}, expected {}",
                    cls.len(),
                    self.dim
                )));
            }
            let idx = state.entries.len();
            let id = metadata.record_id();
            state.id_to_index.insert(id, idx);
            state.entries.push(Entry { cls, metadata });
        }
        state.dirty = true;
        Ok(())
    }
}

fn matches_filters(metadata: &RecordMetadata, filters: &Filters) -> bool {
    if filters.is_empty() {
        return true;
    }
    let map = metadata.filter_map();
    filters
        .iter()
        .all(|(key, value)| map.get(key.as_str()).is_some_and(|v| v == value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(doc_id: &str, page: usize) -> RecordMetadata {
        RecordMetadata {
            doc_id: doc_id.to_string(),
            filename: format!("{doc_id}.pdf"),
            page,
            kind: crate::types::Collection::Visual,
            full_embeddings: "blob".to_string(),
            seq_length: 4,
            embedding_dim: 4,
            bbox: None,
            structure_compressed: None,
            page_context: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            source_path: format!("/data/{doc_id}.pdf"),
            chunk_id: None,
            text_preview: None,
            word_count: None,
            context_compressed: None,
        }
    }

    #[test]
    fn insert_and_search_returns_without_full_embeddings() {
        let col = AnnCollection::new(4);
        col.upsert(vec![1.0, 0.0, 0.0, 0.0], meta("doc1", 1)).unwrap();
        col.upsert(vec![0.0, 1.0, 0.0, 0.0], meta("doc2", 1)).unwrap();

        let hits = col.search(&[1.0, 0.0, 0.0, 0.0], 5, &Filters::new()).unwrap();
        assert_eq!(hits[0].id, "doc1-page001");
        assert!(hits[0].metadata.full_embeddings.is_empty());
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn filters_restrict_results() {
        let col = AnnCollection::new(4);
        col.upsert(vec![1.0, 0.0, 0.0, 0.0], meta("doc1", 1)).unwrap();
        col.upsert(vec![0.9, 0.1, 0.0, 0.0], meta("doc2", 1)).unwrap();

        let mut filters = Filters::new();
        filters.insert("doc_id".to_string(), "doc2".to_string());
        let hits = col.search(&[1.0, 0.0, 0.0, 0.0], 5, &filters).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.doc_id, "doc2");
    }

    #[test]
    fn delete_doc_cascades_within_collection() {
        let col = AnnCollection::new(4);
        col.upsert(vec![1.0, 0.0, 0.0, 0.0], meta("doc1", 1)).unwrap();
        col.upsert(vec![1.0, 0.0, 0.0, 0.0], meta("doc1", 2)).unwrap();
        col.upsert(vec![0.0, 1.0, 0.0, 0.0], meta("doc2", 1)).unwrap();

        assert_eq!(col.delete_doc("doc1"), 2);
        assert_eq!(col.len(), 1);
        let hits = col.search(&[1.0, 0.0, 0.0, 0.0], 10, &Filters::new()).unwrap();
        assert!(hits.iter().all(|h| h.metadata.doc_id != "doc1"));
    }

    #[test]
    fn prune_doc_except_removes_only_unkept_records() {
        let col = AnnCollection::new(4);
        col.upsert(vec![1.0, 0.0, 0.0, 0.0], meta("doc1", 1)).unwrap();
        col.upsert(vec![1.0, 0.0, 0.0, 0.0], meta("doc1", 2)).unwrap();
        col.upsert(vec![0.0, 1.0, 0.0, 0.0], meta("doc2", 1)).unwrap();

        let keep: std::collections::HashSet<String> = ["doc1-page001".to_string()].into_iter().collect();
        assert_eq!(col.prune_doc_except("doc1", &keep), 1);
        assert_eq!(col.len(), 2);
        let hits = col.search(&[1.0, 0.0, 0.0, 0.0], 10, &Filters::new()).unwrap();
        assert!(hits.iter().any(|h| h.id == "doc1-page001"));
        assert!(hits.iter().all(|h| h.id != "doc1-page002"));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let col = AnnCollection::new(4);
        let err = col.upsert(vec![1.0, 0.0], meta("doc1", 1)).unwrap_err();
        assert!(matches!(err, VectorStoreError::EmbeddingValidation(_)));
    }
}
