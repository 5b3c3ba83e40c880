use std::path::PathBuf;

use pdfium_render::prelude::{Pdfium, PdfiumError};

use crate::error::{DocparseError, Result};
use crate::model::RenderOptions;

pub(crate) fn bind_pdfium(options: &RenderOptions) -> Result<Pdfium> {
    let path = options
        .pdfium_library_path
        .clone()
        .ok_or(DocparseError::MissingPdfiumLibraryPath)?;

    let bindings = Pdfium::bind_to_library(path).map_err(map_pdfium_load_error)?;
    Ok(Pdfium::new(bindings))
}

fn map_pdfium_load_error(error: PdfiumError) -> DocparseError {
    DocparseError::PdfiumLoad(error.to_string())
}
