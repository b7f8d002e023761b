//! A minimal WordprocessingML writer.
//!
//! The package holds the parts Word needs to open a document: content
//! types, the package relationships, the main document and a style sheet
//! defining the `Title` heading.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DOCUMENT_HEADING: &str =
    "Healthcare Diagnosis and Treatment Recommendations";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="300"/><w:contextualSpacing/></w:pPr><w:rPr><w:color w:val="17365D"/><w:spacing w:val="5"/><w:kern w:val="28"/><w:sz w:val="52"/></w:rPr></w:style></w:styles>"#;

const SECTION_XML: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("failed to build document package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to write document part: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds a `.docx` with the report heading and `text` as its only
/// paragraph.
///
/// Line breaks and tabs in `text` are kept as Word breaks and tabs.
/// Characters XML cannot carry (NUL and most other C0 controls) are dropped.
pub fn generate_docx(text: &str) -> Result<Vec<u8>, DocxError> {
    let document = document_xml(text);
    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", PACKAGE_RELS_XML),
        ("word/document.xml", &document),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
        ("word/styles.xml", STYLES_XML),
    ];

    let options =
        FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer.start_file(name, options)?;
        writer.write_all(content.as_bytes())?;
    }
    let bytes = writer.finish()?.into_inner();
    debug!("generated document of {} bytes", bytes.len());
    Ok(bytes)
}

fn document_xml(text: &str) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r>"#);
    push_text(&mut xml, DOCUMENT_HEADING);
    xml.push_str("</w:r></w:p><w:p><w:r>");
    for (line_no, line) in text.split('\n').enumerate() {
        if line_no > 0 {
            xml.push_str("<w:br/>");
        }
        for (tab_no, piece) in line.split('\t').enumerate() {
            if tab_no > 0 {
                xml.push_str("<w:tab/>");
            }
            if !piece.is_empty() {
                push_text(&mut xml, piece);
            }
        }
    }
    xml.push_str("</w:r></w:p>");
    xml.push_str(SECTION_XML);
    xml.push_str("</w:body></w:document>");
    xml
}

fn push_text(xml: &mut String, text: &str) {
    xml.push_str(r#"<w:t xml:space="preserve">"#);
    for ch in text.chars() {
        match ch {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' => xml.push_str("&quot;"),
            // Parsers turn a literal CR into LF.
            '\r' => xml.push_str("&#xD;"),
            ch if is_xml_char(ch) => xml.push(ch),
            _ => {}
        }
    }
    xml.push_str("</w:t>");
}

fn is_xml_char(ch: char) -> bool {
    !matches!(ch, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Reads back `(style, text)` for every paragraph of a generated document.
#[cfg(test)]
pub(crate) fn read_paragraphs(bytes: &[u8]) -> Vec<(Option<String>, String)> {
    use std::io::Read;

    use regex::Regex;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();

    let paragraph = Regex::new(r"(?s)<w:p>(.*?)</w:p>").unwrap();
    let style = Regex::new(r#"<w:pStyle w:val="([^"]+)"/>"#).unwrap();
    let token = Regex::new(
        r#"<w:t xml:space="preserve">([^<]*)</w:t>|<w:br/>|<w:tab/>"#,
    )
    .unwrap();

    paragraph
        .captures_iter(&xml)
        .map(|caps| {
            let body = &caps[1];
            let style = style.captures(body).map(|caps| caps[1].to_owned());
            let mut text = String::new();
            for token in token.captures_iter(body) {
                match token.get(1) {
                    Some(run) => text.push_str(
                        &run.as_str()
                            .replace("&lt;", "<")
                            .replace("&gt;", ">")
                            .replace("&quot;", "\"")
                            .replace("&#xD;", "\r")
                            .replace("&amp;", "&"),
                    ),
                    None if &token[0] == "<w:br/>" => text.push('\n'),
                    None => text.push('\t'),
                }
            }
            (style, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn body_of(text: &str) -> Vec<(Option<String>, String)> {
        read_paragraphs(&generate_docx(text).unwrap())
    }

    #[test]
    fn test_heading_and_paragraph() {
        let paragraphs = body_of("Likely flu. Recommend rest and fluids.");
        assert_eq!(
            paragraphs,
            vec![
                (Some("Title".to_owned()), DOCUMENT_HEADING.to_owned()),
                (None, "Likely flu. Recommend rest and fluids.".to_owned()),
            ]
        );
    }

    #[test]
    fn test_text_survives_exactly() {
        let text = "Diagnosis:\n\t1. Influenza <A> & \"B\"\r\n\n2. Cold  ";
        let paragraphs = body_of(text);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[1].1, text);
    }

    #[test]
    fn test_empty_and_long_text() {
        assert_eq!(body_of("")[1].1, "");

        let long = "rest and fluids. ".repeat(20_000);
        assert_eq!(body_of(&long)[1].1, long);
    }

    #[test]
    fn test_control_characters_are_dropped() {
        assert_eq!(body_of("a\u{0}b\u{1b}c")[1].1, "abc");
    }

    #[test]
    fn test_package_parts() {
        let bytes = generate_docx("x").unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
        let mut styles = String::new();
        archive
            .by_name("word/styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert!(styles.contains(r#"w:styleId="Title""#));
    }
}
