//! Strategies that produce a spreadsheet (XLSX or CSV).

use crate::docx::DocxDocument;
use crate::pdf::{self, find_tables, text_rows, PageText, PdfiumLoader};
use crate::table::{self, Table};
use crate::{Result, Strategy};
use std::path::Path;
use tracing::debug;

/// Spreadsheet output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSink {
    Xlsx,
    Csv,
}

impl TableSink {
    /// Write extracted text cells. Values stay text in XLSX output.
    pub fn write(self, table: &Table, path: &Path) -> Result<()> {
        match self {
            Self::Xlsx => table::write_xlsx(table, path, false),
            Self::Csv => table::write_csv(table, path),
        }
    }
}

/// Tables detected on PDF pages, or the page text split into rows.
pub struct PdfTables {
    pdfium: PdfiumLoader,
    sink: TableSink,
}

impl PdfTables {
    pub fn new(pdfium: PdfiumLoader, sink: TableSink) -> Self {
        Self { pdfium, sink }
    }
}

impl Strategy for PdfTables {
    fn name(&self) -> &'static str {
        "pdf-tables"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let pdfium = self.pdfium.bind()?;
        let pages = pdf::read_pages(&pdfium, input)?;
        let table = tables_from_pages(&pages);
        self.sink.write(&table, output)
    }
}

/// Detected tables concatenated in page order, or every page's plain text
/// split into rows under synthetic headers when no page has a table.
pub fn tables_from_pages(pages: &[PageText]) -> Table {
    let mut tables = Vec::new();
    for page in pages {
        for region in find_tables(&page.lines) {
            tables.push(Table::with_header_row(region.rows(&page.lines)));
        }
    }

    if tables.is_empty() {
        debug!("No tables detected, falling back to text rows");
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Table::headerless(text_rows(&text))
    } else {
        debug!(tables = tables.len(), "Detected tables");
        Table::concat(tables)
    }
}

/// Tables of a docx body, or its paragraphs as a single `Content` column.
pub struct DocxTables {
    sink: TableSink,
}

impl DocxTables {
    pub fn new(sink: TableSink) -> Self {
        Self { sink }
    }
}

/// Build one table per docx table: two or more rows use the first as header.
pub fn docx_table(rows: &[Vec<String>]) -> Table {
    if rows.len() > 1 {
        Table::with_header_row(rows.to_vec())
    } else {
        Table::headerless(rows.to_vec())
    }
}

impl Strategy for DocxTables {
    fn name(&self) -> &'static str {
        "docx-tables"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let document = DocxDocument::open(input)?;
        let tables: Vec<Table> = document
            .tables()
            .filter(|rows| !rows.is_empty())
            .map(|rows| docx_table(rows))
            .collect();

        let table = if tables.is_empty() {
            let text = document
                .paragraphs()
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string)
                .collect();
            Table::single_column("Content", text)
        } else {
            Table::concat(tables)
        };

        self.sink.write(&table, output)
    }
}

/// CSV to a single-sheet workbook; numeric-looking cells become numbers.
pub struct CsvToXlsx;

impl Strategy for CsvToXlsx {
    fn name(&self) -> &'static str {
        "csv-to-xlsx"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let table = table::read_csv(input)?;
        table::write_xlsx(&table, output, true)
    }
}

/// First worksheet to CSV.
pub struct XlsxToCsv;

impl Strategy for XlsxToCsv {
    fn name(&self) -> &'static str {
        "xlsx-to-csv"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let table = table::read_xlsx(input)?;
        table::write_csv(&table, output)
    }
}
