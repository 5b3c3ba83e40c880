//! Parses PDF, DOCX, PPTX, MP3, and WAV input into a [`ParsedDocument`]: pages, structural
//! metadata, and token-bounded text chunks ready for dual-modality embedding.
//!
//! Each format adapter degrades gracefully rather than failing the whole document: structure
//! extraction that recovers nothing still yields an (empty) [`DocumentStructure`], and a hybrid
//! chunking failure automatically retries with the legacy word-window chunker (`parse_bytes`
//! catches the unwind rather than failing the document outright).

mod audio;
mod chunking;
mod error;
mod model;
mod office;
mod pdf;
#[cfg(feature = "render")]
mod pdfium;
#[cfg(feature = "render")]
mod render;
mod structure;

pub use error::{DocparseError, Result};
pub use model::{
    BBox, ChunkContext, ChunkingStrategy, CodeBlockInfo, DocumentStructure, FileType, FormulaInfo,
    HeadingInfo, HeadingLevel, ParseOptions, ParsedDocument, Page, PictureClassification,
    PictureInfo, TableInfo, TextChunk,
};
#[cfg(feature = "render")]
pub use model::RenderOptions;

use std::path::{Path, PathBuf};

use aither_core::AudioTranscriber;

/// Parses documents into [`ParsedDocument`]s, dispatching on [`FileType`].
///
/// Generic over the audio transcriber implementation so callers can plug in whichever
/// [`AudioTranscriber`] they've wired up; parsing non-audio formats never touches it.
#[derive(Debug, Default)]
pub struct DocumentParser<A> {
    transcriber: Option<A>,
}

impl<A> DocumentParser<A> {
    /// Builds a parser with no audio support; parsing an MP3/WAV returns
    /// [`DocparseError::MissingTranscriber`].
    #[must_use]
    pub fn new() -> Self {
        Self { transcriber: None }
    }

    /// Builds a parser that can also transcribe audio.
    #[must_use]
    pub fn with_transcriber(transcriber: A) -> Self {
        Self {
            transcriber: Some(transcriber),
        }
    }
}

impl<A: AudioTranscriber> DocumentParser<A> {
    /// Parses a document from a file on disk, inferring [`FileType`] from its extension.
    pub async fn parse_path(&self, path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParsedDocument> {
        let path = path.as_ref();
        let bytes = async_fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.parse_bytes(&filename, &bytes, options).await
    }

    /// Parses a document already in memory, inferring [`FileType`] from `filename`'s extension.
    pub async fn parse_bytes(
        &self,
        filename: &str,
        bytes: &[u8],
        options: &ParseOptions,
    ) -> Result<ParsedDocument> {
        let file_type = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileType::from_extension)
            .ok_or_else(|| DocparseError::UnsupportedType(PathBuf::from(filename)))?;

        if file_type.is_audio() {
            let transcriber = self
                .transcriber
                .as_ref()
                .ok_or(DocparseError::MissingTranscriber)?;
            let chunks = audio::parse(transcriber, bytes, options).await;
            return Ok(ParsedDocument {
                filename: filename.to_string(),
                pages: Vec::new(),
                structure: DocumentStructure::default(),
                chunks,
            });
        }

        let owned_bytes = bytes.to_vec();
        let owned_options = options.clone();
        let (mut pages, items) = blocking::unblock(move || match file_type {
            FileType::Pdf => pdf::parse_from_bytes(&owned_bytes, &owned_options),
            FileType::Docx => office::parse_docx(&owned_bytes),
            FileType::Pptx => office::parse_pptx(&owned_bytes),
            FileType::Mp3 | FileType::Wav => unreachable!("audio handled above"),
        })
        .await?;

        let structure = structure::build(items, options.structure_size_cap_bytes);
        let chunks = match options.chunking_strategy {
            ChunkingStrategy::Hybrid => chunk_hybrid_with_fallback(&pages, &structure, options),
            ChunkingStrategy::Legacy => chunking::chunk_legacy(&pages, options),
        };

        if !file_type.is_visual() {
            pages.clear();
        }

        Ok(ParsedDocument {
            filename: filename.to_string(),
            pages,
            structure,
            chunks,
        })
    }
}

/// Runs the hybrid chunker, retrying with the legacy word-window chunker if it panics (spec
/// §4.3 "if smart chunking fails, legacy chunker runs"). The hybrid chunker does not otherwise
/// return a `Result` — its failure mode in practice is a panic from malformed structure data
/// (e.g. a heading whose `section_path` splits unexpectedly), not an ordinary error.
fn chunk_hybrid_with_fallback(
    pages: &[Page],
    structure: &DocumentStructure,
    options: &ParseOptions,
) -> Vec<TextChunk> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        chunking::chunk_hybrid(pages, structure, options)
    })) {
        Ok(chunks) => chunks,
        Err(_) => {
            tracing::warn!("hybrid chunking failed, falling back to legacy chunker");
            chunking::chunk_legacy(pages, options)
        }
    }
}

/// Renders PDF pages to on-disk images for visual embedding and UI display. Behind the
/// `render` feature because it pulls in the pdfium native library.
#[cfg(feature = "render")]
pub fn render_pages_from_path(
    source_pdf: impl AsRef<Path>,
    pages: &[Page],
    output_dir: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<()> {
    render::render_pages_from_path(source_pdf.as_ref(), pages, output_dir.as_ref(), options)
}

/// Renders PDF pages (from in-memory bytes) to on-disk images. See
/// [`render_pages_from_path`].
#[cfg(feature = "render")]
pub fn render_pages_from_bytes(
    source_pdf: &[u8],
    pages: &[Page],
    output_dir: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<()> {
    render::render_pages_from_bytes(source_pdf, pages, output_dir.as_ref(), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::stream::{self, Stream};

    struct NoopTranscriber;

    impl AudioTranscriber for NoopTranscriber {
        fn transcribe(&self, _audio: &[u8]) -> impl Stream<Item = String> + Send {
            stream::iter(Vec::<String>::new())
        }
    }

    #[tokio::test]
    async fn unsupported_extension_errors() {
        let parser = DocumentParser::<NoopTranscriber>::new();
        let result = parser
            .parse_bytes("notes.txt", b"hello", &ParseOptions::default())
            .await;
        assert!(matches!(result, Err(DocparseError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn audio_without_transcriber_errors() {
        let parser = DocumentParser::<NoopTranscriber>::new();
        let result = parser
            .parse_bytes("clip.mp3", b"ignored", &ParseOptions::default())
            .await;
        assert!(matches!(result, Err(DocparseError::MissingTranscriber)));
    }

    #[tokio::test]
    async fn corrupt_pdf_surfaces_parse_error() {
        let parser = DocumentParser::<NoopTranscriber>::new();
        let result = parser
            .parse_bytes("doc.pdf", b"not a pdf", &ParseOptions::default())
            .await;
        assert!(matches!(result, Err(DocparseError::Parse { format: "pdf", .. })));
    }

    #[test]
    fn hybrid_fallback_is_transparent_on_the_happy_path() {
        let pages = vec![Page {
            page_number: 1,
            text: "some ordinary body text with no headings at all".to_string(),
        }];
        let structure = DocumentStructure::default();
        let options = ParseOptions::default();
        let direct = chunking::chunk_hybrid(&pages, &structure, &options);
        let wrapped = chunk_hybrid_with_fallback(&pages, &structure, &options);
        assert_eq!(direct, wrapped);
    }

    #[test]
    fn hybrid_fallback_never_panics_even_on_empty_input() {
        let chunks = chunk_hybrid_with_fallback(
            &[],
            &DocumentStructure::default(),
            &ParseOptions::default(),
        );
        assert!(chunks.is_empty());
    }
}
