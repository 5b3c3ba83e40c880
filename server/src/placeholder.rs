//! Stand-ins for the embedding backend, foundation LLM, and audio transcriber, so this binary
//! links and serves locally without a real ColPali/ColBERT-style embedder or provider API key
//! wired in. Mirrors `docmind_pipeline::NoRenderer`'s pattern of a trivial, documented
//! placeholder satisfying a capability-set trait: the embedding model's numerics and the
//! concrete LLM provider are external collaborators, out of scope here (spec §1).
//!
//! A deployment wires real implementations instead — an ONNX Runtime multi-vector model behind
//! [`aither_core::MultiVectorEmbedder`], and a provider crate (e.g. `aither-openai`) behind
//! [`aither_core::llm::LanguageModel`] — by swapping the type parameters chosen in `main`.

use aither_core::llm::model::Profile;
use aither_core::llm::{Event, LLMRequest, LanguageModel};
use aither_core::{AudioTranscriber, MultiVector, MultiVectorEmbedder};
use futures_lite::Stream;

/// Produces a deterministic, content-derived [`MultiVector`] instead of running a real model.
/// Searches against it are directionally meaningless but exercise the full ANN/MaxSim path.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// Builds a placeholder embedder producing vectors of `dim` dimensions.
    #[must_use]
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, content: &[u8]) -> MultiVector {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        let seed = hasher.finish();
        let row: Vec<f32> = (0..self.dim)
            .map(|i| {
                let bits = seed.wrapping_add(i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                ((bits >> 40) as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect();
        MultiVector::new(vec![row]).expect("single non-empty row is always valid")
    }
}

impl MultiVectorEmbedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_images(&self, images: Vec<Vec<u8>>) -> aither_core::Result<Vec<MultiVector>> {
        Ok(images.iter().map(|img| self.embed_one(img)).collect())
    }

    async fn embed_texts(&self, texts: Vec<String>) -> aither_core::Result<Vec<MultiVector>> {
        Ok(texts.iter().map(|t| self.embed_one(t.as_bytes())).collect())
    }

    async fn embed_query(&self, query: &str) -> aither_core::Result<MultiVector> {
        Ok(self.embed_one(query.as_bytes()))
    }
}

/// A transcriber that always yields no text, for deployments with no audio ingestion configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranscriber;

impl AudioTranscriber for NoTranscriber {
    fn transcribe(&self, _audio: &[u8]) -> impl Stream<Item = String> + Send {
        futures_lite::stream::iter(Vec::new())
    }
}

/// A language model that returns a fixed refusal instead of calling out to a real provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredModel;

const UNCONFIGURED_ANSWER: &str =
    "No language model provider is configured for this deployment (LLM_MODEL unset).";

impl LanguageModel for UnconfiguredModel {
    type Error = std::convert::Infallible;

    fn respond(
        &self,
        _request: LLMRequest,
    ) -> impl Stream<Item = Result<Event, Self::Error>> + Send {
        futures_lite::stream::iter(vec![Ok(Event::Text(UNCONFIGURED_ANSWER.to_string()))])
    }

    async fn profile(&self) -> Profile {
        Profile::new(
            "unconfigured",
            "docmind",
            "unconfigured",
            "placeholder model; no provider configured",
            0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(8);
        let a = embedder.embed_query("hello").await.unwrap();
        let b = embedder.embed_query("hello").await.unwrap();
        assert_eq!(a.cls(), b.cls());
    }

    #[tokio::test]
    async fn hash_embedder_distinguishes_distinct_content() {
        let embedder = HashEmbedder::new(8);
        let a = embedder.embed_query("hello").await.unwrap();
        let b = embedder.embed_query("goodbye").await.unwrap();
        assert_ne!(a.cls(), b.cls());
    }
}
