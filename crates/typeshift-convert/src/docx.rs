//! Minimal WordprocessingML (docx) reader and writer.
//!
//! Only the parts the conversion strategies need are modelled: top-level
//! paragraphs, top-level tables, and page breaks, in document order.

use crate::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const DOCUMENT_PART: &str = "word/document.xml";

/// One body-level element of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    Table(Vec<Vec<String>>),
    PageBreak,
}

/// A document as an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxDocument {
    pub blocks: Vec<Block>,
}

impl DocxDocument {
    /// Open a `.docx` package and parse its main document part.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| Error::document("package has no word/document.xml part"))?
            .read_to_string(&mut xml)?;
        Self::parse_xml(&xml)
    }

    /// Parse the XML of `word/document.xml`.
    pub fn parse_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut parser = BodyParser::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => parser.start(&e),
                Event::Empty(e) => {
                    parser.start(&e);
                    parser.end(e.name().as_ref());
                }
                Event::End(e) => parser.end(e.name().as_ref()),
                Event::Text(t) if parser.in_text => {
                    let text = t.unescape()?;
                    parser.push_text(&text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self {
            blocks: parser.blocks,
        })
    }

    /// Top-level paragraph texts in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Top-level tables in order, each as rows of cell text.
    pub fn tables(&self) -> impl Iterator<Item = &Vec<Vec<String>>> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(rows) => Some(rows),
            _ => None,
        })
    }

    /// Write the document as a `.docx` package.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;
        zip.start_file(DOCUMENT_PART, options)?;
        zip.write_all(self.to_xml().as_bytes())?;

        let mut file = zip.finish()?;
        file.flush()?;
        Ok(())
    }

    /// Serialise the blocks as `word/document.xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(DOCUMENT_HEAD);
        for block in &self.blocks {
            match block {
                Block::Paragraph(text) => write_paragraph(&mut xml, text),
                Block::Table(rows) => write_table(&mut xml, rows),
                Block::PageBreak => xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
            }
        }
        xml.push_str(DOCUMENT_TAIL);
        xml
    }
}

/// Body walker: collects top-level paragraphs and tables, ignoring anything
/// nested deeper than the first table level except as cell text.
#[derive(Default)]
struct BodyParser {
    blocks: Vec<Block>,
    table_depth: usize,
    para_depth: usize,
    in_text: bool,
    paragraph: String,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
    cell_span: usize,
}

impl BodyParser {
    fn start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:tbl" => {
                if self.table_depth == 0 {
                    self.rows.clear();
                }
                self.table_depth += 1;
            }
            b"w:tr" if self.table_depth == 1 => self.row.clear(),
            b"w:tc" if self.table_depth == 1 => {
                self.cell.clear();
                self.cell_span = 1;
            }
            b"w:gridSpan" if self.table_depth == 1 => {
                self.cell_span = attr(e, b"w:val")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1)
                    .max(1);
            }
            b"w:p" => {
                if self.table_depth == 0 && self.para_depth == 0 {
                    self.paragraph.clear();
                }
                self.para_depth += 1;
            }
            b"w:t" => self.in_text = true,
            b"w:tab" => self.push_text("\t"),
            b"w:br" | b"w:cr" => self.push_text("\n"),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:p" => {
                self.para_depth = self.para_depth.saturating_sub(1);
                if self.table_depth == 0 && self.para_depth == 0 {
                    self.blocks
                        .push(Block::Paragraph(std::mem::take(&mut self.paragraph)));
                } else if self.table_depth >= 1 && self.para_depth == 0 {
                    self.cell.push('\n');
                }
            }
            b"w:tc" if self.table_depth == 1 => {
                let text = self.cell.trim().to_string();
                for _ in 0..self.cell_span {
                    self.row.push(text.clone());
                }
            }
            b"w:tr" if self.table_depth == 1 => {
                self.rows.push(std::mem::take(&mut self.row));
            }
            b"w:tbl" => {
                self.table_depth = self.table_depth.saturating_sub(1);
                if self.table_depth == 0 {
                    self.blocks.push(Block::Table(std::mem::take(&mut self.rows)));
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.table_depth > 0 {
            self.cell.push_str(text);
        } else if self.para_depth > 0 {
            self.paragraph.push_str(text);
        }
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn write_runs(xml: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:r><w:br/></w:r>");
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                xml.push_str("<w:r><w:tab/></w:r>");
            }
            if !piece.is_empty() {
                xml.push_str(r#"<w:r><w:t xml:space="preserve">"#);
                xml.push_str(&escape(piece));
                xml.push_str("</w:t></w:r>");
            }
        }
    }
}

fn write_paragraph(xml: &mut String, text: &str) {
    xml.push_str("<w:p>");
    write_runs(xml, text);
    xml.push_str("</w:p>");
}

fn write_table(xml: &mut String, rows: &[Vec<String>]) {
    xml.push_str(TABLE_PROPERTIES);
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in row {
            xml.push_str("<w:tc>");
            write_paragraph(xml, cell);
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_TAIL: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

const TABLE_PROPERTIES: &str = r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr>"#;
