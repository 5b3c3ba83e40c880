//! Context builder (spec §4.8): formats ranked hits into numbered, citeable blocks, enforces a
//! token budget, and collects image URLs for vision-mode requests.
//!
//! Grounded on `core/src/llm/mod.rs`'s `oneshot`/`collect_text` pattern for the optional
//! local-LLM preprocessing pass, and on `rag/src/chunking/fixed.rs`'s `words * 1.3` token
//! estimator (the same heuristic the smart chunker uses for chunk bounds).

use aither_core::llm::{LanguageModel, collect_text, oneshot};
use docmind_retrieval::RankedHit;

use crate::error::{ResearchError, Result};

/// Inputs controlling how a context is assembled (spec §4.8 "Inputs").
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// How many of the ranked hits to include as sources.
    pub num_sources: usize,
    /// Whether the requesting client supports image parts.
    pub vision_enabled: bool,
    /// Cap on how many visual hits get an image URL.
    pub max_images: usize,
    /// Public base URL images are served from. Required for vision mode; never a loopback
    /// address reachable only from this host (spec §4.8 "never emit loopback URLs to remote
    /// providers").
    pub image_base_url: Option<String>,
    /// Approximate token budget for the formatted context (estimated via `words * 1.3`).
    pub token_budget: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            num_sources: 5,
            vision_enabled: false,
            max_images: 10,
            image_base_url: None,
            token_budget: 4000,
        }
    }
}

/// Strategy for the optional local-LLM context preprocessing pass (spec §4.8 "Optional
/// preprocessing").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessStrategy {
    /// Extract discrete facts, dropping connective prose.
    ExtractFacts,
    /// Compress the context while preserving meaning and citation markers.
    Compress,
}

impl PreprocessStrategy {
    const fn instruction(self) -> &'static str {
        match self {
            Self::ExtractFacts => {
                "Rewrite the following context as a dense list of discrete facts. Preserve \
                 every `[N]` citation marker exactly as written, attached to the fact it \
                 supports. Do not add facts not present in the context."
            }
            Self::Compress => {
                "Compress the following context, keeping every claim's meaning and every `[N]` \
                 citation marker exactly as written. Remove redundant or connective prose only."
            }
        }
    }
}

/// Built context ready to go into the user-facing prompt.
#[derive(Debug, Clone, Default)]
pub struct BuiltContext {
    /// The formatted, numbered-block context text.
    pub text: String,
    /// `true` if the last included source had to be truncated to fit the token budget.
    pub context_truncated: bool,
    /// Absolute image URLs for vision-mode requests, in ranked order.
    pub image_urls: Vec<String>,
}

/// Stats returned alongside preprocessed context (spec §4.9 `preprocessing_*` metadata).
#[derive(Debug, Clone)]
pub struct PreprocessStats {
    /// Character count before preprocessing.
    pub input_chars: usize,
    /// Character count after preprocessing.
    pub output_chars: usize,
}

const MAX_PREVIEW_CHARS: usize = 1000;

/// Truncates `text` at the last sentence boundary (`.`, `!`, `?`) at or before `max_chars`,
/// falling back to a hard cut if no boundary is found (spec §4.8 "truncate at sentence
/// boundary").
fn truncate_at_sentence_boundary(text: &str, max_chars: usize) -> (String, bool) {
    if text.chars().count() <= max_chars {
        return (text.to_string(), false);
    }

    let cut: String = text.chars().take(max_chars).collect();
    let boundary = cut
        .rfind(['.', '!', '?'])
        .map_or(cut.len(), |index| index + 1);
    (cut[..boundary].trim_end().to_string(), true)
}

/// Rough token estimate matching the smart chunker's `words * 1.3` heuristic.
fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    ((words as f32) * 1.3).ceil() as usize
}

fn source_body(hit: &RankedHit) -> &str {
    if hit.is_visual {
        hit.metadata
            .page_context
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("(no caption available)")
    } else {
        hit.metadata
            .text_preview
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("(no preview available)")
    }
}

fn image_url(base: &str, doc_id: &str, page: usize) -> String {
    format!(
        "{}/images/{}/page{:03}.png",
        base.trim_end_matches('/'),
        doc_id,
        page
    )
}

/// Returns `true` if `base` is a loopback/local address that must never be handed to a remote
/// provider (spec §4.8).
fn is_loopback(base: &str) -> bool {
    let host = base
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split(['/', ':'])
        .next()
        .unwrap_or("");
    host == "localhost" || host == "127.0.0.1" || host == "::1"
}

/// Builds the numbered, budgeted context described by spec §4.8.
#[must_use]
pub fn build_context(hits: &[RankedHit], options: &ContextOptions) -> BuiltContext {
    let sources: Vec<&RankedHit> = hits.iter().take(options.num_sources).collect();

    let mut blocks = Vec::with_capacity(sources.len());
    let mut used_tokens = 0usize;
    let mut context_truncated = false;

    for (index, hit) in sources.iter().enumerate() {
        let (preview, _) = truncate_at_sentence_boundary(source_body(hit), MAX_PREVIEW_CHARS);
        let kind = if hit.is_visual { "Visual" } else { "Text" };
        let header = format!(
            "[{}] [{} Match] {}, Page {}",
            index + 1,
            kind,
            hit.metadata.filename,
            hit.metadata.page
        );
        let mut block = format!("{header}\n{preview}");
        let block_tokens = estimate_tokens(&block);

        if used_tokens + block_tokens > options.token_budget {
            let remaining_chars = options
                .token_budget
                .saturating_sub(used_tokens)
                .saturating_mul(4); // ~4 chars/token at the budget boundary, rough but safe
            let (truncated_preview, _) = truncate_at_sentence_boundary(
                &preview,
                remaining_chars.saturating_sub(header.len() + 1),
            );
            block = format!("{header}\n{truncated_preview}");
            context_truncated = true;
            blocks.push(block);
            break;
        }

        used_tokens += block_tokens;
        blocks.push(block);
    }

    let image_urls = if options.vision_enabled {
        collect_image_urls(&sources, options)
    } else {
        Vec::new()
    };

    BuiltContext {
        text: blocks.join("\n\n"),
        context_truncated,
        image_urls,
    }
}

fn collect_image_urls(sources: &[&RankedHit], options: &ContextOptions) -> Vec<String> {
    let Some(base) = options.image_base_url.as_deref() else {
        return Vec::new();
    };
    if is_loopback(base) {
        tracing::warn!("image_base_url is a loopback address; refusing to emit image URLs");
        return Vec::new();
    }

    sources
        .iter()
        .filter(|hit| hit.is_visual)
        .take(options.max_images)
        .map(|hit| image_url(base, &hit.metadata.doc_id, hit.metadata.page))
        .collect()
}

/// Runs the optional local-LLM preprocessing pass over a built context, preserving `[N]`
/// markers (spec §4.8 "Optional preprocessing").
///
/// # Errors
/// Returns [`ResearchError::Llm`] if the preprocessing model call fails.
pub async fn preprocess_context<M: LanguageModel>(
    model: &M,
    text: &str,
    strategy: PreprocessStrategy,
) -> Result<(String, PreprocessStats)> {
    let request = oneshot(strategy.instruction(), text);
    let stream = model.respond(request);
    let compressed = collect_text(stream)
        .await
        .map_err(|err| ResearchError::Llm(anyhow::anyhow!(err.to_string())))?;

    let stats = PreprocessStats {
        input_chars: text.chars().count(),
        output_chars: compressed.chars().count(),
    };
    Ok((compressed, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmind_vectorstore::{Collection, RecordMetadata};

    fn hit(is_visual: bool, filename: &str, page: usize, preview: Option<&str>) -> RankedHit {
        RankedHit {
            id: format!("{filename}-{page}"),
            is_visual,
            score: 0.9,
            metadata: RecordMetadata {
                doc_id: "doc1".to_string(),
                filename: filename.to_string(),
                page,
                kind: if is_visual {
                    Collection::Visual
                } else {
                    Collection::Text
                },
                full_embeddings: String::new(),
                seq_length: 1,
                embedding_dim: 4,
                bbox: None,
                structure_compressed: None,
                page_context: preview.filter(|_| is_visual).map(str::to_string),
                timestamp: "2026-01-01T00:00:00Z".to_string(),
                source_path: filename.to_string(),
                chunk_id: if is_visual { None } else { Some(1) },
                text_preview: preview.filter(|_| !is_visual).map(str::to_string),
                word_count: Some(10),
                context_compressed: None,
            },
        }
    }

    #[test]
    fn numbers_blocks_one_based_and_keeps_order() {
        let hits = vec![
            hit(false, "a.pdf", 1, Some("First chunk.")),
            hit(true, "b.pdf", 2, Some("A bar chart.")),
        ];
        let built = build_context(&hits, &ContextOptions::default());
        assert!(built.text.starts_with("[1] [Text Match] a.pdf, Page 1"));
        assert!(built.text.contains("[2] [Visual Match] b.pdf, Page 2"));
        assert!(!built.context_truncated);
    }

    #[test]
    fn truncates_at_sentence_boundary_under_budget() {
        let long = "One sentence here. ".repeat(200);
        let hits = vec![hit(false, "a.pdf", 1, Some(&long))];
        let options = ContextOptions {
            token_budget: 20,
            ..ContextOptions::default()
        };
        let built = build_context(&hits, &options);
        assert!(built.context_truncated);
        assert!(built.text.ends_with('.'));
    }

    #[test]
    fn vision_mode_collects_only_visual_image_urls() {
        let hits = vec![
            hit(true, "b.pdf", 2, Some("chart")),
            hit(false, "a.pdf", 1, Some("text")),
        ];
        let options = ContextOptions {
            vision_enabled: true,
            image_base_url: Some("https://tunnel.example.com".to_string()),
            ..ContextOptions::default()
        };
        let built = build_context(&hits, &options);
        assert_eq!(built.image_urls, vec!["https://tunnel.example.com/images/doc1/page002.png"]);
    }

    #[test]
    fn refuses_loopback_image_base_url() {
        let hits = vec![hit(true, "b.pdf", 2, Some("chart"))];
        let options = ContextOptions {
            vision_enabled: true,
            image_base_url: Some("http://127.0.0.1:8080".to_string()),
            ..ContextOptions::default()
        };
        let built = build_context(&hits, &options);
        assert!(built.image_urls.is_empty());
    }
}
