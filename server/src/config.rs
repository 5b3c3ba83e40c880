//! Layered configuration (spec §6 "Configuration (enumerated)"): built-in defaults →
//! optional `docmind.toml` → `DOCMIND_*` environment variables, following the `config` crate
//! (layered sources) convention grounded in `ravituringworks-generic-ai-agent`'s `Cargo.toml`
//! (the teacher workspace has no configuration layer of its own — every provider crate takes
//! explicit constructor arguments — so this is new relative to the teacher).

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Chunking strategy selector (spec §6 `CHUNKING_STRATEGY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Structure-aware hybrid chunker (spec §4.3 default).
    Hybrid,
    /// Legacy fixed-size, word-overlap chunker.
    Legacy,
}

/// Embedding device selector (spec §6 `EMBEDDING_DEVICE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingDevice {
    /// Apple Metal Performance Shaders.
    Mps,
    /// NVIDIA CUDA.
    Cuda,
    /// CPU fallback.
    Cpu,
}

/// Embedding numeric precision (spec §6 `EMBEDDING_PRECISION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingPrecision {
    /// Half precision.
    Fp16,
    /// 8-bit quantized.
    Int8,
}

/// Every configuration variable enumerated in spec §6, loaded into one struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DocmindConfig {
    /// Host/port the HTTP+WS server binds to. Not itself a spec §6 variable; an ambient
    /// addition every server binary needs.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Root directory for `data/page_images/...` and the vector store's own files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    pub enable_table_structure: bool,
    pub enable_picture_classification: bool,
    pub enable_code_enrichment: bool,
    pub enable_formula_enrichment: bool,

    pub chunking_strategy: ChunkingStrategy,
    pub max_chunk_tokens: usize,
    pub min_chunk_tokens: usize,
    pub merge_peer_chunks: bool,

    pub page_render_dpi: u32,
    pub images_scale: f32,
    pub visual_batch_size: usize,
    pub text_batch_size: usize,

    pub embedding_device: EmbeddingDevice,
    pub embedding_precision: EmbeddingPrecision,

    pub research_vision_enabled: bool,
    pub research_max_images: usize,
    pub research_image_base_url: Option<String>,

    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub processing_timeout: u64,
    pub max_workers: usize,
    pub max_queue: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl DocmindConfig {
    /// Loads configuration: built-in defaults (each variable's parenthesized default per spec
    /// §6), then an optional `docmind.toml` in the current directory, then `DOCMIND_*`
    /// environment variables (highest precedence).
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if `docmind.toml` exists but fails to parse, or if any
    /// variable fails to deserialize into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("bind_addr", default_bind_addr())?
            .set_default("data_dir", default_data_dir().to_string_lossy().to_string())?
            .set_default("enable_table_structure", true)?
            .set_default("enable_picture_classification", true)?
            .set_default("enable_code_enrichment", false)?
            .set_default("enable_formula_enrichment", false)?
            .set_default("chunking_strategy", "hybrid")?
            .set_default("max_chunk_tokens", 512)?
            .set_default("min_chunk_tokens", 100)?
            .set_default("merge_peer_chunks", true)?
            .set_default("page_render_dpi", 150)?
            .set_default("images_scale", 2.0)?
            .set_default("visual_batch_size", 4)?
            .set_default("text_batch_size", 8)?
            .set_default("embedding_device", "cpu")?
            .set_default("embedding_precision", "fp16")?
            .set_default("research_vision_enabled", false)?
            .set_default("research_max_images", 10)?
            .set_default("llm_model", "")?
            .set_default("llm_temperature", 0.3)?
            .set_default("llm_max_tokens", 1024)?
            .set_default("processing_timeout", 300)?
            .set_default("max_workers", 1)?
            .set_default("max_queue", 16)?
            .add_source(File::with_name("docmind.toml").required(false))
            .add_source(Environment::with_prefix("DOCMIND"))
            .build()?;
        config.try_deserialize()
    }
}
