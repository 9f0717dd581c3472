//! Minimal OOXML word-processing package: one paragraph holding the
//! heading `Resume`, a break, then the exported text one line per break.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;

pub const DOCX_HEADING: &str = "Resume";

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Font settings applied through the `Normal` style.
#[derive(Debug, Clone, PartialEq)]
pub struct DocxStyle {
    pub font: String,
    pub font_size_pt: f32,
}

impl DocxStyle {
    /// Size in half-points, the unit of `w:sz`.
    pub fn half_points(&self) -> u32 {
        (self.font_size_pt * 2.0).round().max(1.0) as u32
    }
}

/// Build the package bytes. The output is deterministic for equal inputs:
/// entry order is fixed and timestamps are pinned.
pub fn build_docx(text: &str, style: &DocxStyle) -> Result<Vec<u8>, ExportError> {
    let document = document_xml(text)?;
    let styles = styles_xml(style)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("word/document.xml", &document),
        ("word/styles.xml", &styles),
    ];
    for (name, bytes) in parts {
        zip.start_file(name, options).map_err(encode_err)?;
        zip.write_all(bytes)?;
    }
    let cursor = zip.finish().map_err(encode_err)?;
    Ok(cursor.into_inner())
}

fn encode_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Encode(e.to_string())
}

fn xml_writer() -> Result<Writer<Vec<u8>>, ExportError> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(encode_err)?;
    Ok(w)
}

fn document_xml(text: &str) -> Result<Vec<u8>, ExportError> {
    let mut w = xml_writer()?;
    let ev = |w: &mut Writer<Vec<u8>>, e: Event<'_>| w.write_event(e).map_err(encode_err);

    ev(&mut w, Event::Start(BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)])))?;
    ev(&mut w, Event::Start(BytesStart::new("w:body")))?;
    ev(&mut w, Event::Start(BytesStart::new("w:p")))?;

    // Heading run followed by a break.
    ev(&mut w, Event::Start(BytesStart::new("w:r")))?;
    ev(&mut w, Event::Start(BytesStart::new("w:t")))?;
    ev(&mut w, Event::Text(BytesText::new(DOCX_HEADING)))?;
    ev(&mut w, Event::End(BytesEnd::new("w:t")))?;
    ev(&mut w, Event::Empty(BytesStart::new("w:br")))?;
    ev(&mut w, Event::End(BytesEnd::new("w:r")))?;

    // Body run: one text element per line, separated by breaks.
    ev(&mut w, Event::Start(BytesStart::new("w:r")))?;
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            ev(&mut w, Event::Empty(BytesStart::new("w:br")))?;
        }
        ev(&mut w, Event::Start(BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])))?;
        ev(&mut w, Event::Text(BytesText::new(line)))?;
        ev(&mut w, Event::End(BytesEnd::new("w:t")))?;
    }
    ev(&mut w, Event::End(BytesEnd::new("w:r")))?;

    ev(&mut w, Event::End(BytesEnd::new("w:p")))?;
    ev(&mut w, Event::End(BytesEnd::new("w:body")))?;
    ev(&mut w, Event::End(BytesEnd::new("w:document")))?;
    Ok(w.into_inner())
}

fn styles_xml(style: &DocxStyle) -> Result<Vec<u8>, ExportError> {
    let mut w = xml_writer()?;
    let ev = |w: &mut Writer<Vec<u8>>, e: Event<'_>| w.write_event(e).map_err(encode_err);
    let size = style.half_points().to_string();

    ev(&mut w, Event::Start(BytesStart::new("w:styles").with_attributes([("xmlns:w", WORDML_NS)])))?;
    ev(
        &mut w,
        Event::Start(BytesStart::new("w:style").with_attributes([
            ("w:type", "paragraph"),
            ("w:default", "1"),
            ("w:styleId", "Normal"),
        ])),
    )?;
    ev(&mut w, Event::Empty(BytesStart::new("w:name").with_attributes([("w:val", "Normal")])))?;
    ev(&mut w, Event::Start(BytesStart::new("w:rPr")))?;
    ev(
        &mut w,
        Event::Empty(BytesStart::new("w:rFonts").with_attributes([
            ("w:ascii", style.font.as_str()),
            ("w:hAnsi", style.font.as_str()),
            ("w:cs", style.font.as_str()),
        ])),
    )?;
    ev(&mut w, Event::Empty(BytesStart::new("w:sz").with_attributes([("w:val", size.as_str())])))?;
    ev(&mut w, Event::Empty(BytesStart::new("w:szCs").with_attributes([("w:val", size.as_str())])))?;
    ev(&mut w, Event::End(BytesEnd::new("w:rPr")))?;
    ev(&mut w, Event::End(BytesEnd::new("w:style")))?;
    ev(&mut w, Event::End(BytesEnd::new("w:styles")))?;
    Ok(w.into_inner())
}
