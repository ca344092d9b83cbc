//! Spreadsheet to PDF as a bordered grid of fixed-width cells.

use super::TableSource;
use crate::pdf::writer::truncate_chars;
use crate::pdf::{GridLayout, PdfWriter};
use crate::{GridOptions, Result, Strategy};
use std::path::Path;
use tracing::debug;

/// Header row plus the first `max_rows` data rows, cells cut to
/// `cell_chars` characters. Later rows are dropped.
pub struct TableGrid {
    source: TableSource,
    options: GridOptions,
}

impl TableGrid {
    pub fn new(source: TableSource, options: GridOptions) -> Self {
        Self { source, options }
    }
}

impl Strategy for TableGrid {
    fn name(&self) -> &'static str {
        "table-grid"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let table = self.source.read(input)?;
        let limit = self.options.cell_chars;
        if table.len() > self.options.max_rows {
            debug!(
                rows = table.len(),
                kept = self.options.max_rows,
                "Truncating grid rows"
            );
        }

        let header: Vec<&str> = table.headers.iter().map(|h| truncate_chars(h, limit)).collect();
        let body = table
            .rows
            .iter()
            .take(self.options.max_rows)
            .map(|row| row.iter().map(|c| truncate_chars(c, limit)).collect::<Vec<_>>());

        let mut writer = PdfWriter::new();
        for page in GridLayout::default().draw(std::iter::once(header).chain(body)) {
            writer.add_page(page)?;
        }
        writer.save(output)
    }
}
