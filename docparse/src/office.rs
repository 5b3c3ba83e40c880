//! DOCX/PPTX adapter: unzips the OOXML package and pulls run text out of the relevant part(s)
//! with a streaming XML reader. Like [`crate::pdf`], this never fabricates a bounding box —
//! OOXML doesn't carry absolute layout coordinates in its text runs, so every [`RawItem`] here
//! has `bbox: None`.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::error::{DocparseError, Result};
use crate::model::Page;
use crate::pdf::heading_items;
use crate::structure::RawItem;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open_zip(bytes: &[u8], format: &'static str) -> Result<Archive<'_>> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| DocparseError::Parse {
        format,
        reason: e.to_string(),
    })
}

fn read_entry(archive: &mut Archive<'_>, path: &str, format: &'static str) -> Result<String> {
    let mut file = archive.by_name(path).map_err(|e| DocparseError::Parse {
        format,
        reason: format!("missing {path}: {e}"),
    })?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)
        .map_err(|e| DocparseError::Parse {
            format,
            reason: e.to_string(),
        })?;
    Ok(buf)
}

/// Streams a part's XML, concatenating the content of every `text_tag` element and inserting a
/// newline at the close of every `para_tag` element.
fn extract_text(xml: &str, text_tag: &[u8], para_tag: &[u8]) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == text_tag => in_text = true,
            Ok(Event::End(e)) if e.name().as_ref() == text_tag => in_text = false,
            Ok(Event::End(e)) if e.name().as_ref() == para_tag => out.push('\n'),
            Ok(Event::Text(e)) if in_text => {
                if let Ok(text) = e.unescape() {
                    out.push_str(&text);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    out
}

/// Parses a `.docx` package. DOCX has no stable page model without full layout, so this
/// returns a single internal page (`page_number: 1`) purely as the chunker's input; the facade
/// clears `ParsedDocument::pages` for this format before returning it to the caller.
pub(crate) fn parse_docx(bytes: &[u8]) -> Result<(Vec<Page>, Vec<RawItem>)> {
    let mut archive = open_zip(bytes, "docx")?;
    let xml = read_entry(&mut archive, "word/document.xml", "docx")?;
    let text = extract_text(&xml, b"w:t", b"w:p");

    let mut saw_first_line = false;
    let items = heading_items(&text, 1, &mut saw_first_line);

    Ok((vec![Page { page_number: 1, text }], items))
}

/// Parses a `.pptx` package, one [`Page`] per slide in slide-number order.
pub(crate) fn parse_pptx(bytes: &[u8]) -> Result<(Vec<Page>, Vec<RawItem>)> {
    let mut archive = open_zip(bytes, "pptx")?;

    let mut slide_names: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let rest = name.strip_prefix("ppt/slides/slide")?;
            let number = rest.strip_suffix(".xml")?;
            number.parse::<usize>().ok().map(|n| (n, name.to_string()))
        })
        .collect();
    slide_names.sort_unstable_by_key(|(n, _)| *n);

    let mut pages = Vec::with_capacity(slide_names.len());
    let mut items = Vec::new();
    let mut saw_first_line = false;

    for (slide_num, name) in slide_names {
        let xml = read_entry(&mut archive, &name, "pptx")?;
        let text = extract_text(&xml, b"a:t", b"a:p");
        items.extend(heading_items(&text, slide_num, &mut saw_first_line));
        pages.push(Page {
            page_number: slide_num,
            text,
        });
    }

    Ok((pages, items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_zip_bytes() {
        let err = parse_docx(b"not a zip").unwrap_err();
        assert!(matches!(err, DocparseError::Parse { format: "docx", .. }));
    }

    #[test]
    fn extracts_paragraph_breaks() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Hello</w:t></w:r></w:p>
            <w:p><w:r><w:t>World</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_text(xml, b"w:t", b"w:p");
        assert_eq!(text.trim(), "Hello\nWorld");
    }
}
