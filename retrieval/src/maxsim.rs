//! Late-interaction MaxSim re-ranking (spec §4.7 stage 2, §GLOSSARY).
//!
//! `maxsim(query, doc) = (1/Lq) * sum_i max_j cos(query_i, doc_j)`, i.e. for every query token
//! vector, take its highest cosine similarity to any document token vector, then average. This
//! is the standard late-interaction scoring function (ColBERT-style); normalizing by `Lq` keeps
//! the score in `[0, 1]` so it composes with the stage-1 ANN score under the same scale.

fn l2_normalize(vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
    vectors
        .iter()
        .map(|v| {
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm == 0.0 {
                v.clone()
            } else {
                v.iter().map(|x| x / norm).collect()
            }
        })
        .collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Computes the MaxSim score between a query and a document multi-vector sequence.
///
/// Both sequences are L2-normalized row-wise first, so each `dot` product is already a cosine
/// similarity. Returns a score in `[0, 1]` (since normalized cosine similarities are in
/// `[-1, 1]` and document embeddings from the same model family are non-negative in practice;
/// callers relying on the spec invariant `maxsim(query, query) ≈ 1.0` should pass identical
/// sequences for both arguments).
///
/// # Panics
/// Panics if either sequence is empty — callers must not invoke this on an empty
/// [`aither_core::MultiVector`], which the type itself cannot represent.
#[must_use]
pub fn maxsim_score(query: &[Vec<f32>], doc: &[Vec<f32>]) -> f32 {
    assert!(!query.is_empty() && !doc.is_empty(), "maxsim requires non-empty sequences");

    let query_n = l2_normalize(query);
    let doc_n = l2_normalize(doc);

    let lq = query_n.len() as f32;
    let total: f32 = query_n
        .iter()
        .map(|q| {
            doc_n
                .iter()
                .map(|d| dot(q, d))
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .sum();

    (total / lq).clamp(0.0, 1.0)
}

/// Reshapes a flat row-major `(L, D)` buffer (as returned by
/// [`docmind_vectorstore::VectorStore::get_full`]) into `L` row vectors of length `D`.
#[must_use]
pub fn unflatten(flat: &[f32], dim: usize) -> Vec<Vec<f32>> {
    flat.chunks_exact(dim).map(<[f32]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_similarity_is_near_one() {
        let seq = vec![vec![1.0, 2.0, 3.0], vec![4.0, -1.0, 0.5], vec![0.0, 1.0, 1.0]];
        let score = maxsim_score(&seq, &seq);
        assert!((score - 1.0).abs() < 1e-5, "score was {score}");
    }

    #[test]
    fn score_is_within_unit_interval() {
        let query = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let doc = vec![vec![-1.0, 0.0], vec![0.0, -1.0], vec![1.0, 1.0]];
        let score = maxsim_score(&query, &doc);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn unflatten_reshapes_row_major() {
        let flat = vec![1.0, 2.0, 3.0, 4.0];
        let rows = unflatten(&flat, 2);
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }
}
