use thiserror::Error;

/// Errors emitted while parsing a document into a [`crate::ParsedDocument`].
#[derive(Debug, Error)]
pub enum DocparseError {
    /// The input bytes do not decode as a valid document of the claimed format.
    #[error("failed to parse {format}: {reason}")]
    Parse {
        /// Format that failed to parse (e.g. "pdf", "docx").
        format: &'static str,
        /// Underlying reason.
        reason: String,
    },
    /// The source file could not be read from the filesystem.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// The filename extension does not match any supported [`crate::FileType`].
    #[error("unsupported file type for {0:?}")]
    UnsupportedType(std::path::PathBuf),
    /// Pdfium dynamic library path must be configured to render page images.
    #[error("pdfium library path is required; set ParseOptions.pdfium_library_path")]
    MissingPdfiumLibraryPath,
    /// Pdfium dynamic library could not be loaded.
    #[error("failed to load pdfium library: {0}")]
    PdfiumLoad(String),
    /// No transcriber was configured for an audio source.
    #[error("audio parsing requires an AudioTranscriber")]
    MissingTranscriber,
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, DocparseError>;
