//! Word-processor document strategies.

use crate::docx::{Block, DocxDocument};
use crate::pdf::writer::{text_width, A4};
use crate::pdf::{self, find_tables, PageCanvas, PdfWriter, PdfiumLoader};
use crate::{Result, Strategy};
use std::path::Path;
use tracing::debug;

/// Rebuilds a PDF's text as docx paragraphs and tables, one page break
/// between source pages.
pub struct PdfToDocx {
    pdfium: PdfiumLoader,
}

impl PdfToDocx {
    pub fn new(pdfium: PdfiumLoader) -> Self {
        Self { pdfium }
    }
}

/// Lay out the lines of one page as blocks, tables in place.
pub fn page_blocks(lines: &[pdf::TextLine]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut next = 0;
    for region in find_tables(lines) {
        blocks.extend(lines[next..region.start].iter().map(|l| Block::Paragraph(l.text())));
        blocks.push(Block::Table(region.rows(lines)));
        next = region.end;
    }
    blocks.extend(lines[next..].iter().map(|l| Block::Paragraph(l.text())));
    blocks
}

impl Strategy for PdfToDocx {
    fn name(&self) -> &'static str {
        "pdf-to-docx"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let pdfium = self.pdfium.bind()?;
        let pages = pdf::read_pages(&pdfium, input)?;

        let mut document = DocxDocument::default();
        for (index, page) in pages.iter().enumerate() {
            if index > 0 {
                document.blocks.push(Block::PageBreak);
            }
            document.blocks.extend(page_blocks(&page.lines));
        }
        debug!(
            pages = pages.len(),
            blocks = document.blocks.len(),
            "Rebuilt document"
        );
        document.save(output)
    }
}

/// Renders docx paragraphs and tables onto A4 pages in Helvetica.
pub struct DocxToPdf;

impl Strategy for DocxToPdf {
    fn name(&self) -> &'static str {
        "docx-to-pdf"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let document = DocxDocument::open(input)?;
        let mut flow = Flow::new();
        for block in &document.blocks {
            match block {
                Block::Paragraph(text) => flow.paragraph(text)?,
                Block::Table(rows) => flow.table(rows)?,
                Block::PageBreak => flow.new_page()?,
            }
        }
        flow.finish(output)
    }
}

const MARGIN: f32 = 72.0;
const FONT_SIZE: f32 = 11.0;
const LEADING: f32 = 14.0;
const CELL_PADDING: f32 = 4.0;

/// Top-to-bottom text flow across pages.
struct Flow {
    writer: PdfWriter,
    page: PageCanvas,
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            writer: PdfWriter::new(),
            page: PageCanvas::a4(),
            y: MARGIN,
        }
    }

    fn content_width() -> f32 {
        A4.0 - 2.0 * MARGIN
    }

    fn bottom() -> f32 {
        A4.1 - MARGIN
    }

    fn new_page(&mut self) -> Result<()> {
        let page = std::mem::replace(&mut self.page, PageCanvas::a4());
        self.writer.add_page(page)?;
        self.y = MARGIN;
        Ok(())
    }

    /// Start a new page unless `height` still fits. An empty page always
    /// accepts content.
    fn reserve(&mut self, height: f32) -> Result<()> {
        if self.y + height > Self::bottom() && self.y > MARGIN {
            self.new_page()?;
        }
        Ok(())
    }

    fn paragraph(&mut self, text: &str) -> Result<()> {
        for line in wrap(text, Self::content_width(), FONT_SIZE) {
            self.reserve(LEADING)?;
            if !line.is_empty() {
                self.page.text(MARGIN, self.y + FONT_SIZE, FONT_SIZE, &line);
            }
            self.y += LEADING;
        }
        self.y += LEADING / 2.0;
        Ok(())
    }

    fn table(&mut self, rows: &[Vec<String>]) -> Result<()> {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return Ok(());
        }
        let column_width = Self::content_width() / columns as f32;
        let max_lines = ((Self::bottom() - MARGIN - 2.0 * CELL_PADDING) / LEADING).floor() as usize;

        for row in rows {
            let cells: Vec<Vec<String>> = (0..columns)
                .map(|i| {
                    let text = row.get(i).map(String::as_str).unwrap_or("");
                    let mut lines = wrap(text, column_width - 2.0 * CELL_PADDING, FONT_SIZE);
                    lines.truncate(max_lines.max(1));
                    lines
                })
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let row_height = line_count as f32 * LEADING + 2.0 * CELL_PADDING;

            self.reserve(row_height)?;
            for (i, lines) in cells.iter().enumerate() {
                let x = MARGIN + i as f32 * column_width;
                self.page.rect(x, self.y, column_width, row_height);
                for (n, line) in lines.iter().enumerate().filter(|(_, l)| !l.is_empty()) {
                    let baseline = self.y + CELL_PADDING + FONT_SIZE + n as f32 * LEADING;
                    self.page.text(x + CELL_PADDING, baseline, FONT_SIZE, line);
                }
            }
            self.y += row_height;
        }
        self.y += LEADING / 2.0;
        Ok(())
    }

    fn finish(mut self, output: &Path) -> Result<()> {
        self.writer.add_page(self.page)?;
        self.writer.save(output)
    }
}

/// Greedy word wrap to `width` points. Hard line breaks are kept, tabs
/// become four spaces and words wider than a line are split.
pub fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.replace('\t', "    ").split('\n') {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, size) <= width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if text_width(&current, size) > width && current.chars().count() > 1 {
                    current.pop();
                    out.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{TextCell, TextLine};

    fn line(cells: &[(f32, &str)], top: f32) -> TextLine {
        TextLine {
            top,
            bottom: top - 10.0,
            cells: cells
                .iter()
                .map(|(left, text)| TextCell {
                    left: *left,
                    right: left + 20.0,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_page_blocks_keep_tables_in_place() {
        let lines = vec![
            line(&[(72.0, "Title")], 760.0),
            line(&[(30.0, "Name"), (130.0, "Qty")], 700.0),
            line(&[(30.0, "bolt"), (130.0, "4")], 686.0),
            line(&[(72.0, "Footer")], 600.0),
        ];
        let blocks = page_blocks(&lines);
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("Title".into()),
                Block::Table(vec![
                    vec!["Name".into(), "Qty".into()],
                    vec!["bolt".into(), "4".into()],
                ]),
                Block::Paragraph("Footer".into()),
            ]
        );
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(20);
        let lines = wrap(&text, 200.0, 11.0);
        assert!(lines.len() > 5);
        assert!(lines.iter().all(|l| text_width(l, 11.0) <= 200.0));
        assert_eq!(
            lines.join(" ").split_whitespace().count(),
            text.split_whitespace().count()
        );
    }

    #[test]
    fn test_wrap_splits_long_words_and_keeps_breaks() {
        let lines = wrap(&"W".repeat(40), 50.0, 10.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "W".repeat(40));

        assert_eq!(wrap("a\n\nb", 100.0, 10.0), vec!["a", "", "b"]);
        assert_eq!(wrap("", 100.0, 10.0), vec![""]);
    }

    #[test]
    fn test_docx_to_pdf_flows_onto_pages() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.docx");
        let output = dir.path().join("out.pdf");
        let mut blocks: Vec<Block> = (0..80)
            .map(|i| Block::Paragraph(format!("Paragraph number {}", i)))
            .collect();
        blocks.push(Block::Table(vec![
            vec!["a".into(), "b".into()],
            vec!["1".into(), "2".into()],
        ]));
        DocxDocument { blocks }.save(&input).unwrap();

        DocxToPdf.convert(&input, &output).unwrap();
        let doc = lopdf::Document::load(&output).unwrap();
        assert!(doc.get_pages().len() >= 2);
    }
}
