/// Tuning knobs for [`crate::engine::search`] (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    /// `k` for the stage-1 ANN candidate fetch per collection (spec default 100).
    pub ann_candidates: usize,
    /// `N` — how many of each modality's ANN candidates get the stage-2 MaxSim rerank
    /// (spec default 20).
    pub rerank_top_n: usize,
    /// Per-modality weight applied when fusing visual + text lists in hybrid mode. Must sum to
    /// 1.0 for the fused score to stay in `[0, 1]`; spec §9 leaves the split configurable but
    /// defaults to 0.5/0.5.
    pub hybrid_visual_weight: f32,
    /// See [`Self::hybrid_visual_weight`].
    pub hybrid_text_weight: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            ann_candidates: 100,
            rerank_top_n: 20,
            hybrid_visual_weight: 0.5,
            hybrid_text_weight: 0.5,
        }
    }
}

/// Which collection(s) a query searches (spec §4.7 `mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Visual collection only.
    Visual,
    /// Text collection only.
    Text,
    /// Both collections, fused per [`RetrievalConfig::hybrid_visual_weight`].
    Hybrid,
}
