//! Minimal WordprocessingML writer for pdf-to-word.
//!
//! The package holds the three parts Word needs to open a document:
//! `[Content_Types].xml`, `_rels/.rels` and `word/document.xml`. Each line
//! of extracted text becomes a paragraph; pages are separated by explicit
//! page breaks so the page structure of the source survives.

use crate::error::ConvertError;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Characters XML 1.0 cannot carry, even escaped. pdfium emits some of them
/// (form feeds, stray control codes) for odd encodings.
static XML_INVALID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x{FFFE}\x{FFFF}]").expect("static regex")
});

/// Write `pages` as a `.docx` at `output`.
pub fn write_docx(pages: &[String], output: &Path) -> Result<(), ConvertError> {
    let document = document_xml(pages)?;

    let file = File::create(output).map_err(ConvertError::workspace)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/document.xml", document.as_slice()),
    ] {
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(body).map_err(ConvertError::workspace)?;
    }
    zip.finish()
        .map_err(zip_error)?
        .flush()
        .map_err(ConvertError::workspace)?;
    Ok(())
}

fn zip_error(e: zip::result::ZipError) -> ConvertError {
    ConvertError::Encode(format!("DOCX packaging failed: {e}"))
}

/// Build `word/document.xml` for the given page texts.
fn document_xml(pages: &[String]) -> Result<Vec<u8>, ConvertError> {
    let mut writer = Writer::new(Vec::new());
    let mut emit = |event: Event<'_>| {
        writer
            .write_event(event)
            .map_err(|e| ConvertError::Encode(format!("document.xml: {e}")))
    };

    emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    emit(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)]),
    ))?;
    emit(Event::Start(BytesStart::new("w:body")))?;

    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            emit(Event::Start(BytesStart::new("w:p")))?;
            emit(Event::Start(BytesStart::new("w:r")))?;
            emit(Event::Empty(
                BytesStart::new("w:br").with_attributes([("w:type", "page")]),
            ))?;
            emit(Event::End(BytesEnd::new("w:r")))?;
            emit(Event::End(BytesEnd::new("w:p")))?;
        }
        let clean = XML_INVALID.replace_all(page, "");
        for line in clean.lines() {
            let line = line.trim_end();
            emit(Event::Start(BytesStart::new("w:p")))?;
            if !line.is_empty() {
                emit(Event::Start(BytesStart::new("w:r")))?;
                emit(Event::Start(
                    BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
                ))?;
                emit(Event::Text(BytesText::new(line)))?;
                emit(Event::End(BytesEnd::new("w:t")))?;
                emit(Event::End(BytesEnd::new("w:r")))?;
            }
            emit(Event::End(BytesEnd::new("w:p")))?;
        }
    }

    emit(Event::End(BytesEnd::new("w:body")))?;
    emit(Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}
