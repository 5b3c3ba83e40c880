//! Smart chunker (spec component 4.3): hybrid structure-aware chunking with a legacy
//! word-count fallback.

use crate::model::{ChunkContext, DocumentStructure, Page, ParseOptions, TextChunk};

/// Estimates token count the way spec §4.3 mandates when no tokenizer is available: `words *
/// 1.3`, rounded up.
fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    ((words as f32) * 1.3).ceil() as usize
}

struct ChunkBuilder {
    lines: Vec<String>,
    first_page: Option<usize>,
    last_page: usize,
}

impl ChunkBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            first_page: None,
            last_page: 0,
        }
    }

    fn push_line(&mut self, line: &str, page_number: usize) {
        self.first_page.get_or_insert(page_number);
        self.last_page = page_number;
        self.lines.push(line.to_string());
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn token_count(&self) -> usize {
        estimate_tokens(&self.text())
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn finish(self, chunk_id: u32, context: ChunkContext) -> TextChunk {
        let text = self.text();
        let token_count = estimate_tokens(&text);
        TextChunk {
            chunk_id,
            text,
            page_number: self.first_page,
            token_count,
            context,
            start_time: None,
            end_time: None,
            word_timestamps: Vec::new(),
        }
    }
}

/// Finds caption-style references (`"Table N"`, `"Figure N"`) for 1-based-indexed elements of a
/// page, returning the ids whose caption text is mentioned in `text`.
fn referenced_elements<'a>(
    text: &str,
    label: &str,
    ids_on_page: impl Iterator<Item = &'a str>,
) -> Vec<String> {
    let lower = text.to_ascii_lowercase();
    ids_on_page
        .enumerate()
        .filter_map(|(idx, id)| {
            let pattern = format!("{label} {}", idx + 1).to_ascii_lowercase();
            lower.contains(&pattern).then(|| id.to_string())
        })
        .collect()
}

fn context_for_page(
    structure: &DocumentStructure,
    page_number: usize,
    text: &str,
    section_path: &str,
    parent_headings: &[String],
) -> ChunkContext {
    let table_ids: Vec<&str> = structure
        .tables
        .iter()
        .filter(|t| t.page_num == page_number)
        .map(|t| t.table_id.as_str())
        .collect();
    let picture_ids: Vec<&str> = structure
        .pictures
        .iter()
        .filter(|p| p.page_num == page_number)
        .map(|p| p.picture_id.as_str())
        .collect();

    let mut related = referenced_elements(text, "table", table_ids.into_iter());
    related.extend(referenced_elements(text, "figure", picture_ids.into_iter()));

    let mut element_types = Vec::new();
    if related.iter().any(|id| {
        structure
            .tables
            .iter()
            .any(|t| &t.table_id == id)
    }) {
        element_types.push("table".to_string());
    }
    if related.iter().any(|id| {
        structure
            .pictures
            .iter()
            .any(|p| &p.picture_id == id)
    }) {
        element_types.push("picture".to_string());
    }

    ChunkContext {
        section_path: section_path.to_string(),
        parent_headings: parent_headings.to_vec(),
        element_types,
        related_elements: related,
    }
}

/// Hybrid chunking: breaks on section/subsection headings, on page breaks once the running
/// chunk is at least `MIN_CHUNK_TOKENS`, and on exceeding `MAX_CHUNK_TOKENS`. A trailing
/// fragment that would otherwise fall under the minimum may be merged into the previous chunk
/// when the combination stays under `1.5 * MAX_CHUNK_TOKENS` (`MERGE_PEER_CHUNKS`).
pub(crate) fn chunk_hybrid(
    pages: &[Page],
    structure: &DocumentStructure,
    options: &ParseOptions,
) -> Vec<TextChunk> {
    let mut chunks: Vec<TextChunk> = Vec::new();
    let mut current = ChunkBuilder::new();
    let mut section_path = String::new();
    let mut parent_headings: Vec<String> = Vec::new();
    let mut next_id = 1u32;

    fn flush_chunk(
        current: &mut ChunkBuilder,
        chunks: &mut Vec<TextChunk>,
        next_id: &mut u32,
        structure: &DocumentStructure,
        section_path: &str,
        parent_headings: &[String],
    ) {
        if current.is_empty() {
            return;
        }
        let page = current.last_page;
        let text = current.text();
        let ctx = context_for_page(structure, page, &text, section_path, parent_headings);
        let built = std::mem::replace(current, ChunkBuilder::new()).finish(*next_id, ctx);
        *next_id += 1;
        chunks.push(built);
    }

    for page in pages {
        let page_headings: Vec<_> = structure
            .headings
            .iter()
            .filter(|h| h.page_num == page.page_number)
            .collect();
        let mut heading_idx = 0;

        for line in page.text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if heading_idx < page_headings.len()
                && page_headings[heading_idx].text.trim() == trimmed
                && matches!(
                    page_headings[heading_idx].level,
                    crate::model::HeadingLevel::SectionHeader | crate::model::HeadingLevel::Subsection
                )
            {
                let heading = page_headings[heading_idx];
                heading_idx += 1;
                if current.token_count() >= options.min_chunk_tokens {
                    flush_chunk(
                        &mut current,
                        &mut chunks,
                        &mut next_id,
                        structure,
                        &section_path,
                        &parent_headings,
                    );
                }
                section_path = heading.section_path.clone();
                parent_headings = section_path
                    .split(" > ")
                    .map(str::to_string)
                    .collect();
                current.push_line(trimmed, page.page_number);
                continue;
            }

            current.push_line(trimmed, page.page_number);
            if current.token_count() > options.max_chunk_tokens {
                flush_chunk(
                    &mut current,
                    &mut chunks,
                    &mut next_id,
                    structure,
                    &section_path,
                    &parent_headings,
                );
            }
        }

        if current.token_count() >= options.min_chunk_tokens {
            flush_chunk(
                &mut current,
                &mut chunks,
                &mut next_id,
                structure,
                &section_path,
                &parent_headings,
            );
        }
    }

    if !current.is_empty() {
        let merge_with_prev = options.merge_peer_chunks
            && chunks
                .last()
                .is_some_and(|prev| {
                    prev.token_count + current.token_count()
                        <= (options.max_chunk_tokens as f32 * 1.5) as usize
                });

        if merge_with_prev {
            let prev = chunks.pop().expect("checked above");
            let mut merged_text = prev.text.clone();
            merged_text.push('\n');
            merged_text.push_str(&current.text());
            let token_count = estimate_tokens(&merged_text);
            chunks.push(TextChunk {
                text: merged_text,
                token_count,
                ..prev
            });
        } else {
            flush_chunk(
                &mut current,
                &mut chunks,
                &mut next_id,
                structure,
                &section_path,
                &parent_headings,
            );
        }
    }

    chunks
}

/// Legacy chunker: fixed word-count windows with overlap, used when the hybrid path fails.
/// Word-boundary-aware, grounded on the same overlap/step discipline as a classic fixed-size
/// chunker, but bounded in tokens rather than characters per spec §4.3.
pub(crate) fn chunk_legacy(pages: &[Page], options: &ParseOptions) -> Vec<TextChunk> {
    let words_per_chunk = ((options.max_chunk_tokens as f32) / 1.3).max(1.0) as usize;
    let overlap = (words_per_chunk / 5).max(1);
    let step = words_per_chunk.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut next_id = 1u32;

    for page in pages {
        let words: Vec<&str> = page.text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let mut start = 0;
        while start < words.len() {
            let end = (start + words_per_chunk).min(words.len());
            let text = words[start..end].join(" ");
            let token_count = estimate_tokens(&text);
            chunks.push(TextChunk {
                chunk_id: next_id,
                text,
                page_number: Some(page.page_number),
                token_count,
                context: ChunkContext {
                    section_path: String::new(),
                    parent_headings: Vec::new(),
                    element_types: Vec::new(),
                    related_elements: Vec::new(),
                },
                start_time: None,
                end_time: None,
                word_timestamps: Vec::new(),
            });
            next_id += 1;
            if end == words.len() {
                break;
            }
            start += step;
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeadingLevel;

    fn page(number: usize, text: &str) -> Page {
        Page {
            page_number: number,
            text: text.to_string(),
        }
    }

    #[test]
    fn hybrid_breaks_on_section_heading() {
        let pages = vec![page(
            1,
            "Intro\nSome opening text that runs on for a while to pad the chunk.\nMethods\nDescribes the method in detail across several words to pad it out nicely.",
        )];
        let mut structure = DocumentStructure::default();
        structure.headings.push(crate::model::HeadingInfo {
            text: "Intro".into(),
            level: HeadingLevel::SectionHeader,
            page_num: 1,
            bbox: None,
            section_path: "Intro".into(),
        });
        structure.headings.push(crate::model::HeadingInfo {
            text: "Methods".into(),
            level: HeadingLevel::SectionHeader,
            page_num: 1,
            bbox: None,
            section_path: "Methods".into(),
        });
        let options = ParseOptions {
            min_chunk_tokens: 1,
            ..ParseOptions::default()
        };
        let chunks = chunk_hybrid(&pages, &structure, &options);
        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0].context.section_path, "Intro");
    }

    #[test]
    fn legacy_chunker_respects_word_windows() {
        let text = (0..200)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let pages = vec![page(1, &text)];
        let options = ParseOptions::default();
        let chunks = chunk_legacy(&pages, &options);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
    }

    #[test]
    fn token_estimate_uses_words_times_1_3() {
        assert_eq!(estimate_tokens("one two three four"), 6);
    }
}
