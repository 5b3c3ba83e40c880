//! Two-stage retrieval engine (spec §4.7): ANN candidate fetch, MaxSim late-interaction
//! rerank, hybrid fusion, with a stable tie-break order.

use std::cmp::Ordering;

use aither_core::MultiVectorEmbedder;
use docmind_vectorstore::{Collection, Filters, RecordMetadata, SearchHit, VectorStore};

use crate::config::{RetrievalConfig, SearchMode};
use crate::error::Result;
use crate::maxsim::{maxsim_score, unflatten};

/// One reranked, citeable retrieval result.
#[derive(Debug, Clone)]
pub struct RankedHit {
    /// The record's stable ID (spec §3 ID format).
    pub id: String,
    /// `true` if this hit came from the visual collection.
    pub is_visual: bool,
    /// Final score after MaxSim rerank (and hybrid fusion weighting, if applicable), in
    /// `[0, 1]`.
    pub score: f32,
    /// Full metadata (blob stripped) for formatting/citation.
    pub metadata: RecordMetadata,
}

/// Runs the two-stage search described in spec §4.7 against a single collection and returns
/// the stage-2 MaxSim-reranked, tie-broken top `rerank_top_n` hits (not yet truncated to
/// `num_sources` — callers combine/truncate after fusion).
fn search_collection(
    store: &VectorStore,
    which: Collection,
    query_rows: &[Vec<f32>],
    query_cls: &[f32],
    filters: &Filters,
    config: &RetrievalConfig,
) -> Result<Vec<RankedHit>> {
    let mut candidates = store.search(which, query_cls, config.ann_candidates, filters)?;
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates.truncate(config.rerank_top_n);

    let mut hits = Vec::with_capacity(candidates.len());
    for SearchHit { id, metadata, .. } in candidates {
        let flat = store.get_full(which, &id)?;
        let doc_rows = unflatten(&flat, metadata.embedding_dim);
        let score = maxsim_score(query_rows, &doc_rows);
        hits.push(RankedHit {
            id,
            is_visual: matches!(which, Collection::Visual),
            score,
            metadata,
        });
    }

    hits.sort_by(tie_broken_cmp);
    Ok(hits)
}

/// Stable ordering required by spec §4.7: score desc, then shorter filename, then lower page,
/// then lexicographic `doc_id`.
fn tie_broken_cmp(a: &RankedHit, b: &RankedHit) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.metadata.filename.len().cmp(&b.metadata.filename.len()))
        .then_with(|| a.metadata.page.cmp(&b.metadata.page))
        .then_with(|| a.metadata.doc_id.cmp(&b.metadata.doc_id))
}

/// Runs spec §4.7's full flow: embed the query once, search the requested collection(s),
/// MaxSim-rerank, fuse (in hybrid mode), and return the top `num_sources` hits.
///
/// An empty result is a normal outcome (spec §4.7 "Empty result is a normal outcome, not an
/// error"), e.g. when the store holds no matching documents.
pub async fn search<E: MultiVectorEmbedder>(
    embedder: &E,
    store: &VectorStore,
    query: &str,
    mode: SearchMode,
    num_sources: usize,
    filters: &Filters,
    config: &RetrievalConfig,
) -> Result<Vec<RankedHit>> {
    let query_multivec = embedder
        .embed_query(query)
        .await
        .map_err(crate::error::RetrievalError::Embedding)?;
    let query_rows = query_multivec.rows();
    let query_cls = query_multivec.cls();

    let hits = match mode {
        SearchMode::Visual => {
            search_collection(store, Collection::Visual, query_rows, query_cls, filters, config)?
        }
        SearchMode::Text => {
            search_collection(store, Collection::Text, query_rows, query_cls, filters, config)?
        }
        SearchMode::Hybrid => {
            let visual =
                search_collection(store, Collection::Visual, query_rows, query_cls, filters, config)?;
            let text =
                search_collection(store, Collection::Text, query_rows, query_cls, filters, config)?;
            fuse_hybrid(visual, text, config)
        }
    };

    Ok(hits.into_iter().take(num_sources).collect())
}

/// Merges visual + text reranked lists by weighted score, dedupes by `(doc_id, page)` keeping
/// the highest-scoring entry (spec §4.7 "Hybrid fusion").
fn fuse_hybrid(
    visual: Vec<RankedHit>,
    text: Vec<RankedHit>,
    config: &RetrievalConfig,
) -> Vec<RankedHit> {
    let mut fused: Vec<RankedHit> = visual
        .into_iter()
        .map(|mut h| {
            h.score *= config.hybrid_visual_weight;
            h
        })
        .chain(text.into_iter().map(|mut h| {
            h.score *= config.hybrid_text_weight;
            h
        }))
        .collect();

    fused.sort_by(tie_broken_cmp);

    let mut seen = std::collections::HashSet::new();
    fused.retain(|hit| seen.insert((hit.metadata.doc_id.clone(), hit.metadata.page)));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use aither_core::MultiVector;
    use docmind_vectorstore::RecordContext;

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

        async fn embed_query(&self, query: &str) -> aither_core::Result<MultiVector> {
            let seed = query.len() as f32;
            Ok(MultiVector::new(vec![vec![1.0, 0.0, 0.0, 0.0]; 2 + (seed as usize % 3)]).unwrap())
        }
    }

    fn store_with_docs() -> VectorStore {
        let store = VectorStore::with_dim(4);
        let vector = MultiVector::new(vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]]).unwrap();
        let orthogonal = MultiVector::new(vec![vec![0.0, 0.0, 1.0, 0.0]; 2]).unwrap();

        store
            .add_visual("doc1", "report.pdf", 5, &vector, RecordContext::default())
            .unwrap();
        store
            .add_visual("doc2", "other.pdf", 1, &orthogonal, RecordContext::default())
            .unwrap();
        store
    }

    #[tokio::test]
    async fn search_finds_closest_document() {
        let store = store_with_docs();
        let hits = search(
            &MockEmbedder,
            &store,
            "bar chart",
            SearchMode::Visual,
            10,
            &Filters::new(),
            &RetrievalConfig::default(),
        )
        .await
        .unwrap();

        assert!(!hits.is_empty());
        assert_eq!(hits[0].metadata.doc_id, "doc1");
        assert!(hits[0].score >= hits.last().unwrap().score);
    }

    #[tokio::test]
    async fn empty_store_returns_empty_not_error() {
        let store = VectorStore::with_dim(4);
        let hits = search(
            &MockEmbedder,
            &store,
            "anything",
            SearchMode::Hybrid,
            10,
            &Filters::new(),
            &RetrievalConfig::default(),
        )
        .await
        .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn hybrid_fusion_dedupes_by_doc_and_page() {
        let meta = |doc_id: &str, page: usize| RecordMetadata {
            doc_id: doc_id.to_string(),
            filename: "f.pdf".to_string(),
            page,
            kind: Collection::Visual,
            full_embeddings: String::new(),
            seq_length: 1,
            embedding_dim: 4,
            bbox: None,
            structure_compressed: None,
            page_context: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            source_path: "/f.pdf".to_string(),
            chunk_id: None,
            text_preview: None,
            word_count: None,
            context_compressed: None,
        };

        let visual = vec![RankedHit {
            id: "doc1-page001".to_string(),
            is_visual: true,
            score: 0.9,
            metadata: meta("doc1", 1),
        }];
        let text = vec![RankedHit {
            id: "doc1-chunk0001".to_string(),
            is_visual: false,
            score: 0.95,
            metadata: meta("doc1", 1),
        }];

        let fused = fuse_hybrid(visual, text, &RetrievalConfig::default());
        assert_eq!(fused.len(), 1);
    }
}
