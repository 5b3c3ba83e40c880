//! Parsed-document data model shared by every format adapter.
//!
//! A [`ParsedDocument`] is the contract the document processor consumes regardless of whether
//! the bytes came from a PDF, a DOCX, a PPTX, or an audio transcript: an ordered sequence of
//! [`Page`]s (empty for audio and for formats without a stable page model) plus an ordered
//! sequence of [`TextChunk`]s.

use std::ops::RangeInclusive;

/// Bounding box in PDF points, bottom-left origin: `(left, bottom, right, top)`.
///
/// Invariant: `left < right`, `bottom < top`, and all four edges are non-negative. Consumers
/// rendering onto a top-left-origin raster image must flip Y:
/// `y_img = page_height_px - y_pdf * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    /// Left edge, in PDF points.
    pub left: f32,
    /// Bottom edge, in PDF points (bottom-left origin).
    pub bottom: f32,
    /// Right edge, in PDF points.
    pub right: f32,
    /// Top edge, in PDF points.
    pub top: f32,
}

impl BBox {
    /// Builds a bbox, returning `None` if it violates `left<right` / `bottom<top`, or if any
    /// edge is negative.
    #[must_use]
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Option<Self> {
        if left >= 0.0 && bottom >= 0.0 && left < right && bottom < top {
            Some(Self {
                left,
                bottom,
                right,
                top,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod bbox_tests {
    use super::BBox;

    #[test]
    fn rejects_negative_edges() {
        assert!(BBox::new(-10.0, -5.0, 10.0, 5.0).is_none());
        assert!(BBox::new(0.0, -1.0, 10.0, 5.0).is_none());
    }

    #[test]
    fn rejects_degenerate_box() {
        assert!(BBox::new(10.0, 0.0, 5.0, 10.0).is_none());
        assert!(BBox::new(0.0, 10.0, 10.0, 5.0).is_none());
    }

    #[test]
    fn accepts_valid_box() {
        assert!(BBox::new(0.0, 0.0, 10.0, 20.0).is_some());
    }
}

/// Heading level in the document's outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// Document title.
    Title,
    /// Top-level section.
    SectionHeader,
    /// Nested subsection.
    Subsection,
    /// Paragraph-level header (lowest level, dropped first under the size guard).
    ParagraphHeader,
}

/// A heading extracted from the document, with its running section path.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingInfo {
    /// Heading text.
    pub text: String,
    /// Heading level.
    pub level: HeadingLevel,
    /// 1-based page number this heading appears on.
    pub page_num: usize,
    /// Bounding box, if the parser supplied provenance; never fabricated.
    pub bbox: Option<BBox>,
    /// Running path built by pushing onto a heading-level stack, e.g. "Intro > Methods".
    pub section_path: String,
}

/// A table extracted from the document.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    /// Stable table identifier within the document.
    pub table_id: String,
    /// 1-based page number.
    pub page_num: usize,
    /// Bounding box, if available.
    pub bbox: Option<BBox>,
    /// Row count.
    pub num_rows: usize,
    /// Column count.
    pub num_cols: usize,
    /// Whether the first row is marked as a distinct header row.
    pub has_header: bool,
}

/// Classification assigned to an extracted picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureClassification {
    /// A chart or graph.
    Chart,
    /// A diagram or schematic.
    Diagram,
    /// A photograph.
    Photo,
    /// A logo or brand mark.
    Logo,
    /// Classifier disabled or inconclusive.
    Unknown,
}

/// A picture extracted from the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PictureInfo {
    /// Stable picture identifier within the document.
    pub picture_id: String,
    /// 1-based page number.
    pub page_num: usize,
    /// Bounding box, if available.
    pub bbox: Option<BBox>,
    /// Classification (or `Unknown` when the classifier is disabled).
    pub classification: PictureClassification,
}

/// A code block, emitted only when code enrichment is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlockInfo {
    /// Stable identifier within the document.
    pub block_id: String,
    /// 1-based page number.
    pub page_num: usize,
    /// Bounding box, if available.
    pub bbox: Option<BBox>,
    /// Detected (or guessed) language, if any.
    pub language: Option<String>,
}

/// A formula, emitted only when formula enrichment is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaInfo {
    /// Stable identifier within the document.
    pub formula_id: String,
    /// 1-based page number.
    pub page_num: usize,
    /// Bounding box, if available.
    pub bbox: Option<BBox>,
    /// LaTeX (or best-effort textual) rendering of the formula.
    pub latex: Option<String>,
}

/// Hierarchical structural metadata extracted from a parsed document.
///
/// An empty `DocumentStructure` (all fields empty) is a valid, expected outcome when
/// extraction fails wholesale; the processor continues regardless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStructure {
    /// Headings, in document order.
    pub headings: Vec<HeadingInfo>,
    /// Tables, in document order.
    pub tables: Vec<TableInfo>,
    /// Pictures, in document order.
    pub pictures: Vec<PictureInfo>,
    /// Code blocks (empty unless code enrichment is enabled).
    pub code_blocks: Vec<CodeBlockInfo>,
    /// Formulas (empty unless formula enrichment is enabled).
    pub formulas: Vec<FormulaInfo>,
}

/// A rendered page, for visual formats (PDF, PPTX). Empty for audio and for DOCX, which has no
/// stable page model without full layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub page_number: usize,
    /// Canonical text extracted for this page.
    pub text: String,
}

/// Ancestry/context attached to a [`TextChunk`] so it is useful as an isolated retrieval unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkContext {
    /// Running section path at the point this chunk starts.
    pub section_path: String,
    /// Ordered list of ancestor heading texts.
    pub parent_headings: Vec<String>,
    /// Element type tags this chunk overlaps with (e.g. "table", "picture").
    pub element_types: Vec<String>,
    /// IDs of tables/figures whose caption text is referenced within the chunk.
    pub related_elements: Vec<String>,
}

/// A token-bounded, context-annotated text chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Stable chunk identifier (1-based index within the document).
    pub chunk_id: u32,
    /// Chunk text.
    pub text: String,
    /// 1-based page number this chunk is anchored to (`None` only for audio chunks).
    pub page_number: Option<usize>,
    /// Token count, per the embedding model's tokenizer or the `words * 1.3` fallback.
    pub token_count: usize,
    /// Structural context.
    pub context: ChunkContext,
    /// Audio-only: start time in seconds.
    pub start_time: Option<f64>,
    /// Audio-only: end time in seconds.
    pub end_time: Option<f64>,
    /// Audio-only: per-word timestamps `(word, start_s, end_s)`.
    pub word_timestamps: Vec<(String, f64, f64)>,
}

impl TextChunk {
    /// True if this is an audio chunk (has a time interval instead of a page number).
    #[must_use]
    pub fn is_audio(&self) -> bool {
        self.start_time.is_some()
    }
}

/// A fully parsed document: pages (empty for audio/DOCX) plus chunk-ready text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Source filename, as provided by the caller.
    pub filename: String,
    /// Ordered pages (empty for audio, empty for formats without a stable page model).
    pub pages: Vec<Page>,
    /// Extracted structure (empty `DocumentStructure` on extraction failure).
    pub structure: DocumentStructure,
    /// Final chunk sequence.
    pub chunks: Vec<TextChunk>,
}

/// File type accepted by the parser, used to pick the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Portable Document Format.
    Pdf,
    /// Word Open XML document.
    Docx,
    /// PowerPoint Open XML presentation.
    Pptx,
    /// MPEG-1 Audio Layer III.
    Mp3,
    /// Waveform Audio File Format.
    Wav,
}

impl FileType {
    /// Infers a file type from a lowercase extension (without the leading dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }

    /// True for formats that render to page images (PDF, PPTX).
    #[must_use]
    pub const fn is_visual(self) -> bool {
        matches!(self, Self::Pdf | Self::Pptx)
    }

    /// True for audio formats.
    #[must_use]
    pub const fn is_audio(self) -> bool {
        matches!(self, Self::Mp3 | Self::Wav)
    }
}

/// Enrichment and chunking options for a parse run.
///
/// Field defaults mirror the enumerated configuration variables (see `SPEC_FULL.md` §6).
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Optional inclusive 1-based page range (visual formats only).
    pub page_range: Option<RangeInclusive<usize>>,
    /// `ENABLE_TABLE_STRUCTURE`.
    pub enable_table_structure: bool,
    /// `ENABLE_PICTURE_CLASSIFICATION`.
    pub enable_picture_classification: bool,
    /// `ENABLE_CODE_ENRICHMENT`.
    pub enable_code_enrichment: bool,
    /// `ENABLE_FORMULA_ENRICHMENT`.
    pub enable_formula_enrichment: bool,
    /// `CHUNKING_STRATEGY`.
    pub chunking_strategy: ChunkingStrategy,
    /// `MAX_CHUNK_TOKENS`.
    pub max_chunk_tokens: usize,
    /// `MIN_CHUNK_TOKENS`.
    pub min_chunk_tokens: usize,
    /// `MERGE_PEER_CHUNKS`.
    pub merge_peer_chunks: bool,
    /// Soft cap on serialized `DocumentStructure` size, in bytes (~80 KB).
    pub structure_size_cap_bytes: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            page_range: None,
            enable_table_structure: true,
            enable_picture_classification: true,
            enable_code_enrichment: false,
            enable_formula_enrichment: false,
            chunking_strategy: ChunkingStrategy::Hybrid,
            max_chunk_tokens: 512,
            min_chunk_tokens: 100,
            merge_peer_chunks: true,
            structure_size_cap_bytes: 80 * 1024,
        }
    }
}

/// Chunking strategy selector (`CHUNKING_STRATEGY` config var).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    /// Structure-aware chunking (headings, page breaks, token budget).
    Hybrid,
    /// Fixed word-count windows with overlap.
    Legacy,
}

/// Page-image rendering options, used only by visual formats (PDF, PPTX) behind the `render`
/// feature. Kept separate from [`ParseOptions`] because rendering is a persistence/embedding
/// concern, not a parsing one.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Path to the pdfium dynamic library. Required; see `DocparseError::MissingPdfiumLibraryPath`.
    pub pdfium_library_path: Option<std::path::PathBuf>,
    /// `PAGE_RENDER_DPI`: resolution used for the full-page image embedded for visual search.
    pub page_render_dpi: u32,
    /// `IMAGES_SCALE`: multiplier applied on top of `page_render_dpi` when rendering the image
    /// handed to a vision-capable foundation model, so citations can show higher-resolution
    /// crops than the embedding input.
    pub images_scale: f32,
    /// Target width, in pixels, for the `pageNNN_thumb.jpg` companion thumbnail.
    pub thumbnail_width: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pdfium_library_path: None,
            page_render_dpi: 150,
            images_scale: 2.0,
            thumbnail_width: 256,
        }
    }
}
