//! # Multi-vector embedding module
//!
//! Late-interaction retrieval models do not collapse a document down to one vector. Instead
//! they emit a *sequence* of per-token vectors `(L, D)`: one for every image patch or text
//! token, plus a leading `CLS` vector that stands in for the whole sequence during fast ANN
//! search. The full sequence is kept around for a second, more expensive re-ranking pass
//! (`MaxSim`, see the `retrieval` crate).
//!
//! This module defines [`MultiVector`] (the `(L, D)` sequence type) and [`MultiVectorEmbedder`],
//! the capability-set trait every embedding backend implements, whether it is a real model
//! server, a mock, or a quantized variant (see Design Note 9's tagged-variant selector).
//!
//! [`MultiVectorEmbedder::dim`] must equal every row's length; `embed_images`/`embed_texts`
//! batch so a backend can batch device calls efficiently, while `embed_query` handles the
//! single-string retrieval-time case.

use alloc::vec::Vec;
use core::future::Future;

/// One embedding vector, i.e. a single row of a [`MultiVector`].
pub type Vector = Vec<f32>;

/// A `(L, D)` sequence of per-token embedding vectors.
///
/// `vectors[0]` is the CLS (summary) vector used as the ANN index key; the full sequence is
/// used for MaxSim late-interaction re-ranking. All vectors share the same dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiVector {
    vectors: Vec<Vector>,
}

impl MultiVector {
    /// Builds a multi-vector sequence from its rows.
    ///
    /// Returns `None` if the sequence is empty or rows have mismatched lengths.
    #[must_use]
    pub fn new(vectors: Vec<Vector>) -> Option<Self> {
        let dim = vectors.first()?.len();
        if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
            return None;
        }
        Some(Self { vectors })
    }

    /// Sequence length `L`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always false: [`Self::new`] rejects empty sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector dimension `D`.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.vectors[0].len()
    }

    /// The CLS token, `vectors[0]`: the ANN-indexed summary vector.
    #[must_use]
    pub fn cls(&self) -> &[f32] {
        &self.vectors[0]
    }

    /// All rows of the sequence.
    #[must_use]
    pub fn rows(&self) -> &[Vector] {
        &self.vectors
    }

    /// Consumes the sequence, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vector> {
        self.vectors
    }

    /// True if every component of every vector is finite (no NaN/inf), per spec invariant.
    #[must_use]
    pub fn all_finite(&self) -> bool {
        self.vectors.iter().all(|v| v.iter().all(|x| x.is_finite()))
    }
}

/// Converts images and text into multi-vector late-interaction embeddings.
///
/// This is the capability-set abstraction for the embedding model: a real implementation talks
/// to a model server or local runtime; a mock returns deterministic vectors for tests. The
/// trait never exposes provider-specific configuration — only the shape contract the rest of
/// the system depends on.
///
/// # Implementation requirements
///
/// - Every [`MultiVector`] returned must have `dim() == Self::dim()`.
/// - `embed_images`/`embed_texts` batch in the order given; a batch failure is attributed to
///   the offending item only (see the pipeline crate's per-page/per-chunk fault isolation).
pub trait MultiVectorEmbedder: Send + Sync {
    /// The vector dimension `D` this backend produces (768 for the reference model).
    fn dim(&self) -> usize;

    /// Embeds rendered page images (one multi-vector sequence per image).
    fn embed_images(
        &self,
        images: Vec<Vec<u8>>,
    ) -> impl Future<Output = crate::Result<Vec<MultiVector>>> + Send;

    /// Embeds text chunks (one multi-vector sequence per chunk).
    fn embed_texts(
        &self,
        texts: Vec<alloc::string::String>,
    ) -> impl Future<Output = crate::Result<Vec<MultiVector>>> + Send;

    /// Embeds a single query string at retrieval time.
    fn embed_query(
        &self,
        query: &str,
    ) -> impl Future<Output = crate::Result<MultiVector>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec};

    struct MockEmbedder {
        dim: usize,
    }

    fn mock_vector(dim: usize, seed: usize) -> Vector {
        (0..dim).map(|i| (seed + i) as f32 * 0.01).collect()
    }

    impl MultiVectorEmbedder for MockEmbedder {
        fn dim(&self) -> usize {
            self.dim
        }

        async fn embed_images(&self, images: Vec<Vec<u8>>) -> crate::Result<Vec<MultiVector>> {
            Ok(images
                .iter()
                .map(|img| {
                    MultiVector::new(vec![mock_vector(self.dim, img.len()); 4]).unwrap()
                })
                .collect())
        }

        async fn embed_texts(
            &self,
            texts: Vec<alloc::string::String>,
        ) -> crate::Result<Vec<MultiVector>> {
            Ok(texts
                .iter()
                .map(|t| MultiVector::new(vec![mock_vector(self.dim, t.len()); 3]).unwrap())
                .collect())
        }

        async fn embed_query(&self, query: &str) -> crate::Result<MultiVector> {
            MultiVector::new(vec![mock_vector(self.dim, query.len()); 2])
                .ok_or_else(|| anyhow::anyhow!("empty query"))
        }
    }

    #[test]
    fn multi_vector_rejects_empty() {
        assert!(MultiVector::new(vec![]).is_none());
    }

    #[test]
    fn multi_vector_rejects_mismatched_dims() {
        assert!(MultiVector::new(vec![vec![0.0; 3], vec![0.0; 4]]).is_none());
    }

    #[test]
    fn multi_vector_exposes_cls_and_shape() {
        let mv = MultiVector::new(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(mv.len(), 3);
        assert_eq!(mv.dim(), 2);
        assert_eq!(mv.cls(), &[1.0, 2.0]);
        assert!(mv.all_finite());
    }

    #[test]
    fn multi_vector_detects_non_finite() {
        let mv = MultiVector::new(vec![vec![f32::NAN, 0.0]]).unwrap();
        assert!(!mv.all_finite());
    }

    #[tokio::test]
    async fn embedder_dim_matches_output() {
        let model = MockEmbedder { dim: 8 };
        let texts = vec!["hello".to_string(), "world".to_string()];
        let out = model.embed_texts(texts).await.unwrap();
        assert_eq!(out.len(), 2);
        for mv in &out {
            assert_eq!(mv.dim(), 8);
        }
    }

    #[tokio::test]
    async fn query_embedding_has_cls() {
        let model = MockEmbedder { dim: 4 };
        let mv = model.embed_query("quarterly revenue").await.unwrap();
        assert_eq!(mv.dim(), 4);
        assert!(mv.len() >= 1);
    }
}
