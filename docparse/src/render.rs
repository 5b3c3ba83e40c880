use std::path::Path;

use image::imageops::FilterType;
use pdfium_render::prelude::*;

use crate::error::{DocparseError, Result};
use crate::model::{Page, RenderOptions};
use crate::pdfium::bind_pdfium;

/// Renders each page to `page{NNN}.png` (full resolution, for embedding) and
/// `page{NNN}_thumb.jpg` (downscaled, for the gallery/citation UI) under `output_dir`, matching
/// the `^page\d{3}(_thumb\.jpg|\.png)$` filename contract. `output_dir` is the caller's concern
/// (typically `data/page_images/{doc_id}`); this module never invents a doc_id.
pub(crate) fn render_pages_from_path(
    source_pdf: &Path,
    pages: &[Page],
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<()> {
    let pdfium = bind_pdfium(options)?;
    let doc = pdfium
        .load_pdf_from_file(source_pdf, None)
        .map_err(|e| DocparseError::Parse {
            format: "pdf",
            reason: e.to_string(),
        })?;
    render_pages_impl(&doc, pages, output_dir, options)
}

pub(crate) fn render_pages_from_bytes(
    source_pdf: &[u8],
    pages: &[Page],
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<()> {
    let pdfium = bind_pdfium(options)?;
    let doc = pdfium
        .load_pdf_from_byte_vec(source_pdf.to_vec(), None)
        .map_err(|e| DocparseError::Parse {
            format: "pdf",
            reason: e.to_string(),
        })?;
    render_pages_impl(&doc, pages, output_dir, options)
}

fn render_pages_impl(
    doc: &PdfDocument<'_>,
    pages: &[Page],
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    for page in pages {
        let src_index = page.page_number.saturating_sub(1) as u16;
        let pdf_page = doc.pages().get(src_index).map_err(|e| DocparseError::Parse {
            format: "pdf",
            reason: e.to_string(),
        })?;

        let width_pt = pdf_page.width().value.max(1.0);
        let target_width = ((width_pt / 72.0) * options.page_render_dpi as f32)
            .round()
            .max(256.0) as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .rotate_if_landscape(PdfPageRenderRotation::None, true);

        let rgb = pdf_page
            .render_with_config(&render_config)
            .map_err(|e| DocparseError::Parse {
                format: "pdf",
                reason: e.to_string(),
            })?
            .as_image()
            .into_rgb8();

        let full_name = format!("page{:03}.png", page.page_number);
        rgb.save(output_dir.join(&full_name))
            .map_err(|e| DocparseError::Parse {
                format: "pdf",
                reason: e.to_string(),
            })?;

        let thumb_width = options.thumbnail_width.max(1);
        let thumb_height = ((rgb.height() as f32) * (thumb_width as f32 / rgb.width() as f32))
            .round()
            .max(1.0) as u32;
        let thumb = image::imageops::resize(&rgb, thumb_width, thumb_height, FilterType::Triangle);
        let thumb_name = format!("page{:03}_thumb.jpg", page.page_number);
        thumb
            .save(output_dir.join(&thumb_name))
            .map_err(|e| DocparseError::Parse {
                format: "pdf",
                reason: e.to_string(),
            })?;
    }

    Ok(())
}
