//! PDF adapter: text extraction via `lopdf` plus best-effort structural heuristics.
//!
//! `lopdf` exposes raw content streams, not a layout-aware document model, so headings/tables
//! are recovered from line-shape heuristics rather than true provenance. Bounding boxes are
//! never fabricated: every [`crate::structure::RawItem`] this module emits carries `bbox: None`.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{DocparseError, Result};
use crate::model::{HeadingLevel, ParseOptions, PictureClassification};
use crate::structure::RawItem;

use crate::model::Page;

pub(crate) fn parse_from_bytes(bytes: &[u8], options: &ParseOptions) -> Result<(Vec<Page>, Vec<RawItem>)> {
    let doc = Document::load_mem(bytes).map_err(|e| DocparseError::Parse {
        format: "pdf",
        reason: e.to_string(),
    })?;
    parse_document(&doc, options)
}

fn parse_document(doc: &Document, options: &ParseOptions) -> Result<(Vec<Page>, Vec<RawItem>)> {
    let page_map = doc.get_pages();
    let mut page_numbers: Vec<u32> = page_map.keys().copied().collect();
    page_numbers.sort_unstable();

    let selected = select_pages(&page_numbers, options.page_range.clone());

    let mut pages = Vec::with_capacity(selected.len());
    let mut items = Vec::new();
    let mut saw_first_line = false;

    for page_number in selected {
        let text_raw = doc
            .extract_text(&[page_number])
            .unwrap_or_else(|_| String::new());
        let text = normalize_text(&text_raw);

        items.extend(heading_items(&text, page_number as usize, &mut saw_first_line));

        if options.enable_table_structure {
            items.extend(detect_tables(&text, page_number as usize));
        }
        if options.enable_code_enrichment {
            items.extend(detect_code_blocks(&text, page_number as usize));
        }
        if options.enable_formula_enrichment {
            items.extend(detect_formulas(&text, page_number as usize));
        }

        if let Some(id) = page_map.get(&page_number) {
            items.extend(detect_pictures(doc, *id, page_number as usize));
        }

        pages.push(Page {
            page_number: page_number as usize,
            text,
        });
    }

    Ok((pages, items))
}

fn select_pages(pages: &[u32], range: Option<std::ops::RangeInclusive<usize>>) -> Vec<u32> {
    match range {
        None => pages.to_vec(),
        Some(range) => pages
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| range.contains(&(idx + 1)).then_some(*p))
            .collect(),
    }
}

fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Walks a block of text line by line, promoting heading-shaped lines to [`RawItem::Heading`].
/// `saw_first_line` is threaded across calls (pages, slides) so the title is only ever claimed
/// once, on the very first non-empty line of the whole document.
pub(crate) fn heading_items(text: &str, page_num: usize, saw_first_line: &mut bool) -> Vec<RawItem> {
    let mut items = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let is_title = !*saw_first_line && line_idx == 0;
        if let Some(level) = classify_heading(line, is_title) {
            items.push(RawItem::Heading {
                text: line.trim().to_string(),
                level,
                page_num,
                bbox: None,
            });
            *saw_first_line = true;
        } else if !line.trim().is_empty() {
            *saw_first_line = true;
        }
    }
    items
}

/// Heuristic heading classifier: short, unpunctuated lines that look numbered or
/// all-caps are promoted to headings. Never claims certainty a layout parser would have.
fn classify_heading(line: &str, is_title_candidate: bool) -> Option<HeadingLevel> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 80 {
        return None;
    }
    if trimmed.ends_with(['.', ',', ';']) {
        return None;
    }
    let word_count = trimmed.split_whitespace().count();
    if word_count == 0 || word_count > 12 {
        return None;
    }

    if is_title_candidate {
        return Some(HeadingLevel::Title);
    }

    let first_token = trimmed.split_whitespace().next().unwrap_or("");
    let is_numbered = !first_token.is_empty()
        && first_token
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
        && first_token.chars().any(|c| c.is_ascii_digit());
    if is_numbered {
        let depth = first_token.matches('.').count();
        return Some(if depth >= 1 {
            HeadingLevel::Subsection
        } else {
            HeadingLevel::SectionHeader
        });
    }

    let alphabetic: String = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if alphabetic.chars().count() >= 3 && alphabetic.chars().all(char::is_uppercase) {
        return Some(HeadingLevel::SectionHeader);
    }

    if trimmed.chars().next().is_some_and(char::is_uppercase) && word_count <= 8 {
        return Some(HeadingLevel::ParagraphHeader);
    }

    None
}

/// Heuristic table detection: runs of lines where fields are separated by two or more spaces.
fn detect_tables(text: &str, page_num: usize) -> Vec<RawItem> {
    let lines: Vec<&str> = text.lines().collect();
    let mut items = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut max_cols = 0usize;
    let mut table_idx = 0usize;

    let mut flush = |items: &mut Vec<RawItem>,
                     run_start: &mut Option<usize>,
                     end: usize,
                     max_cols: &mut usize,
                     table_idx: &mut usize| {
        if let Some(start) = run_start.take() {
            let num_rows = end - start;
            if num_rows >= 2 && *max_cols >= 2 {
                items.push(RawItem::Table {
                    table_id: format!("t{page_num}-{table_idx}"),
                    page_num,
                    bbox: None,
                    num_rows,
                    num_cols: *max_cols,
                    has_header: false,
                });
                *table_idx += 1;
            }
        }
        *max_cols = 0;
    };

    for (idx, line) in lines.iter().enumerate() {
        let cols = column_count(line);
        if cols >= 2 {
            run_start.get_or_insert(idx);
            max_cols = max_cols.max(cols);
        } else {
            flush(&mut items, &mut run_start, idx, &mut max_cols, &mut table_idx);
        }
    }
    flush(&mut items, &mut run_start, lines.len(), &mut max_cols, &mut table_idx);

    items
}

fn column_count(line: &str) -> usize {
    line.split("  ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .count()
}

/// Heuristic code-block detection: runs of lines with code-ish punctuation density.
fn detect_code_blocks(text: &str, page_num: usize) -> Vec<RawItem> {
    let lines: Vec<&str> = text.lines().collect();
    let mut items = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut block_idx = 0usize;

    let mut flush = |items: &mut Vec<RawItem>, run_start: &mut Option<usize>, end: usize, block_idx: &mut usize| {
        if let Some(start) = run_start.take() {
            if end - start >= 2 {
                items.push(RawItem::CodeBlock {
                    block_id: format!("c{page_num}-{block_idx}"),
                    page_num,
                    bbox: None,
                    language: None,
                });
                *block_idx += 1;
            }
        }
    };

    for (idx, line) in lines.iter().enumerate() {
        if looks_like_code(line) {
            run_start.get_or_insert(idx);
        } else {
            flush(&mut items, &mut run_start, idx, &mut block_idx);
        }
    }
    flush(&mut items, &mut run_start, lines.len(), &mut block_idx);

    items
}

fn looks_like_code(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let markers = ['{', '}', ';', '='];
    let marker_hits = trimmed.chars().filter(|c| markers.contains(c)).count();
    let keyword_hit = ["fn ", "def ", "class ", "let ", "const ", "function "]
        .iter()
        .any(|kw| trimmed.starts_with(kw) || trimmed.contains(kw));
    keyword_hit || marker_hits >= 2
}

/// Heuristic formula detection: short lines dominated by math symbols or LaTeX delimiters.
fn detect_formulas(text: &str, page_num: usize) -> Vec<RawItem> {
    let mut items = Vec::new();
    let mut idx = 0usize;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if looks_like_formula(trimmed) {
            items.push(RawItem::Formula {
                formula_id: format!("f{page_num}-{idx}"),
                page_num,
                bbox: None,
                latex: Some(trimmed.to_string()),
            });
            idx += 1;
        }
    }
    items
}

fn looks_like_formula(line: &str) -> bool {
    if line.starts_with("\\(") || line.starts_with("\\[") || line.starts_with("$$") {
        return true;
    }
    let symbol_count = line
        .chars()
        .filter(|c| "=+-^_\\*/<>".contains(*c))
        .count();
    let len = line.chars().count();
    len > 0 && (symbol_count as f32 / len as f32) > 0.25 && line.split_whitespace().count() <= 20
}

fn resolve_dict(doc: &Document, object: &Object) -> Option<Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

/// Enumerates image XObjects referenced by a page's resource dictionary. Best-effort: pages
/// whose resources can't be resolved simply contribute no pictures rather than erroring.
///
/// Classification always comes back `Unknown`: no on-device image classifier is wired into this
/// adapter, so `ENABLE_PICTURE_CLASSIFICATION` currently gates nothing here.
fn detect_pictures(doc: &Document, page_id: ObjectId, page_num: usize) -> Vec<RawItem> {
    let Ok(page_dict) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Some(resources) = page_dict
        .get(b"Resources")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return Vec::new();
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(name, value)| {
            let dict = resolve_dict(doc, value)?;
            let is_image = dict
                .get(b"Subtype")
                .ok()
                .and_then(|s| s.as_name().ok())
                .is_some_and(|n| n == b"Image");
            if !is_image {
                return None;
            }
            Some(RawItem::Picture {
                picture_id: format!("p{page_num}-{}", String::from_utf8_lossy(name)),
                page_num,
                bbox: None,
                classification: PictureClassification::Unknown,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_corrupt_bytes() {
        let err = parse_from_bytes(b"not a pdf", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DocparseError::Parse { format: "pdf", .. }));
    }

    #[test]
    fn classifies_numbered_subsection() {
        assert_eq!(
            classify_heading("2.1 Background", false),
            Some(HeadingLevel::Subsection)
        );
    }

    #[test]
    fn classifies_all_caps_section() {
        assert_eq!(
            classify_heading("RESULTS AND DISCUSSION", false),
            Some(HeadingLevel::SectionHeader)
        );
    }

    #[test]
    fn rejects_sentence_lines() {
        assert_eq!(
            classify_heading("This is a normal sentence that ends with punctuation.", false),
            None
        );
    }

    #[test]
    fn detects_two_column_table_run() {
        let text = "Name  Score\nAlice  90\nBob  85\nDone talking now.";
        let items = detect_tables(text, 1);
        assert_eq!(items.len(), 1);
    }
}
