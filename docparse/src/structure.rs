//! Structure extraction (spec component 4.2): turns per-item provenance emitted by a format
//! adapter into a [`DocumentStructure`], degrading gracefully when the result would exceed the
//! per-document size cap.

use crate::model::{
    BBox, CodeBlockInfo, DocumentStructure, FormulaInfo, HeadingInfo, HeadingLevel, PictureInfo,
    PictureClassification, TableInfo,
};

/// One structural item as reported by a format adapter, before section-path resolution.
///
/// Format adapters (pdf/office) emit these in document order with whatever provenance they can
/// recover; this module never fabricates a field an adapter didn't supply.
#[derive(Debug, Clone)]
pub(crate) enum RawItem {
    Heading {
        text: String,
        level: HeadingLevel,
        page_num: usize,
        bbox: Option<BBox>,
    },
    Table {
        table_id: String,
        page_num: usize,
        bbox: Option<BBox>,
        num_rows: usize,
        num_cols: usize,
        has_header: bool,
    },
    Picture {
        picture_id: String,
        page_num: usize,
        bbox: Option<BBox>,
        classification: PictureClassification,
    },
    CodeBlock {
        block_id: String,
        page_num: usize,
        bbox: Option<BBox>,
        language: Option<String>,
    },
    Formula {
        formula_id: String,
        page_num: usize,
        bbox: Option<BBox>,
        latex: Option<String>,
    },
}

/// Builds a [`DocumentStructure`] from extracted items, applying the §4.2 size guard.
///
/// Extraction is item-granular: a caller that could only recover some items from the source
/// (e.g. a corrupted page) simply omits the rest rather than failing the whole document.
pub(crate) fn build(items: Vec<RawItem>, size_cap_bytes: usize) -> DocumentStructure {
    let mut structure = DocumentStructure::default();
    let mut heading_stack: Vec<(HeadingLevel, String)> = Vec::new();

    for item in items {
        match item {
            RawItem::Heading {
                text,
                level,
                page_num,
                bbox,
            } => {
                while heading_stack
                    .last()
                    .is_some_and(|(stack_level, _)| level_depth(*stack_level) >= level_depth(level))
                {
                    heading_stack.pop();
                }
                heading_stack.push((level, text.clone()));
                let section_path = heading_stack
                    .iter()
                    .map(|(_, t)| t.as_str())
                    .collect::<Vec<_>>()
                    .join(" > ");
                structure.headings.push(HeadingInfo {
                    text,
                    level,
                    page_num,
                    bbox,
                    section_path,
                });
            }
            RawItem::Table {
                table_id,
                page_num,
                bbox,
                num_rows,
                num_cols,
                has_header,
            } => structure.tables.push(TableInfo {
                table_id,
                page_num,
                bbox,
                num_rows,
                num_cols,
                has_header,
            }),
            RawItem::Picture {
                picture_id,
                page_num,
                bbox,
                classification,
            } => structure.pictures.push(PictureInfo {
                picture_id,
                page_num,
                bbox,
                classification,
            }),
            RawItem::CodeBlock {
                block_id,
                page_num,
                bbox,
                language,
            } => structure.code_blocks.push(CodeBlockInfo {
                block_id,
                page_num,
                bbox,
                language,
            }),
            RawItem::Formula {
                formula_id,
                page_num,
                bbox,
                latex,
            } => structure.formulas.push(FormulaInfo {
                formula_id,
                page_num,
                bbox,
                latex,
            }),
        }
    }

    degrade_to_budget(structure, size_cap_bytes)
}

const fn level_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::Title => 0,
        HeadingLevel::SectionHeader => 1,
        HeadingLevel::Subsection => 2,
        HeadingLevel::ParagraphHeader => 3,
    }
}

/// Rough serialized-size estimate, cheap enough to call repeatedly during degradation.
fn estimate_size(structure: &DocumentStructure) -> usize {
    let heading_bytes: usize = structure
        .headings
        .iter()
        .map(|h| h.text.len() + h.section_path.len() + 48)
        .sum();
    let table_bytes = structure.tables.len() * 64;
    let picture_bytes = structure.pictures.len() * 64;
    let code_bytes: usize = structure
        .code_blocks
        .iter()
        .map(|c| c.language.as_deref().map_or(0, str::len) + 48)
        .sum();
    let formula_bytes: usize = structure
        .formulas
        .iter()
        .map(|f| f.latex.as_deref().map_or(0, str::len) + 48)
        .sum();
    heading_bytes + table_bytes + picture_bytes + code_bytes + formula_bytes
}

/// Degrades a structure under the size cap by dropping, in order: paragraph headers and
/// formulas, then pictures, then tables. Headings above paragraph level are always preserved.
fn degrade_to_budget(mut structure: DocumentStructure, size_cap_bytes: usize) -> DocumentStructure {
    if estimate_size(&structure) <= size_cap_bytes {
        return structure;
    }

    if !structure.formulas.is_empty() {
        tracing::warn!(
            dropped = structure.formulas.len(),
            "structure size guard: dropping formulas"
        );
        structure.formulas.clear();
    }
    let before = structure.headings.len();
    structure
        .headings
        .retain(|h| h.level != HeadingLevel::ParagraphHeader);
    if structure.headings.len() != before {
        tracing::warn!(
            dropped = before - structure.headings.len(),
            "structure size guard: dropping paragraph headers"
        );
    }
    if estimate_size(&structure) <= size_cap_bytes {
        return structure;
    }

    if !structure.pictures.is_empty() {
        tracing::warn!(
            dropped = structure.pictures.len(),
            "structure size guard: dropping pictures"
        );
        structure.pictures.clear();
    }
    if estimate_size(&structure) <= size_cap_bytes {
        return structure;
    }

    if !structure.tables.is_empty() {
        tracing::warn!(
            dropped = structure.tables.len(),
            "structure size guard: dropping tables"
        );
        structure.tables.clear();
    }

    structure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_path_pushes_and_pops() {
        let items = vec![
            RawItem::Heading {
                text: "Intro".into(),
                level: HeadingLevel::SectionHeader,
                page_num: 1,
                bbox: None,
            },
            RawItem::Heading {
                text: "Methods".into(),
                level: HeadingLevel::Subsection,
                page_num: 1,
                bbox: None,
            },
            RawItem::Heading {
                text: "Results".into(),
                level: HeadingLevel::SectionHeader,
                page_num: 2,
                bbox: None,
            },
        ];
        let structure = build(items, 80 * 1024);
        assert_eq!(structure.headings[1].section_path, "Intro > Methods");
        assert_eq!(structure.headings[2].section_path, "Results");
    }

    #[test]
    fn size_guard_drops_pictures_before_headings() {
        let mut items = Vec::new();
        for i in 0..5000 {
            items.push(RawItem::Picture {
                picture_id: format!("pic{i}"),
                page_num: 1,
                bbox: None,
                classification: PictureClassification::Unknown,
            });
        }
        items.push(RawItem::Heading {
            text: "Title".into(),
            level: HeadingLevel::Title,
            page_num: 1,
            bbox: None,
        });
        let structure = build(items, 4096);
        assert!(structure.pictures.is_empty());
        assert_eq!(structure.headings.len(), 1);
    }

    #[test]
    fn empty_items_yield_empty_structure() {
        let structure = build(Vec::new(), 80 * 1024);
        assert_eq!(structure, DocumentStructure::default());
    }
}
