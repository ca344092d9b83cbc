//! In-memory tabular data shared by every spreadsheet-producing strategy.
//!
//! A [`Table`] is a header row plus string rows. Tables from several pages or
//! document sections are merged with [`Table::concat`], which aligns columns
//! by header name the way a data-frame concatenation would.

use crate::{Error, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveTime;
use std::collections::HashMap;
use std::path::Path;

/// Header row plus data rows. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding ragged rows and naming any extra columns.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(headers.len());

        let mut headers = headers;
        while headers.len() < width {
            headers.push(String::new());
        }
        let headers = unique_headers(headers);

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Use the first row as the header row and the rest as data.
    pub fn with_header_row(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let headers = rows.remove(0);
        Self::new(headers, rows)
    }

    /// All rows are data; columns are named `0`, `1`, ...
    pub fn headerless(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let headers = (0..width).map(|i| i.to_string()).collect();
        Self::new(headers, rows)
    }

    /// A single named column.
    pub fn single_column(name: &str, values: Vec<String>) -> Self {
        Self::new(
            vec![name.to_string()],
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no columns and no rows.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Concatenate tables in order, aligning columns by header name.
    ///
    /// The result's columns are the union of all headers in first-seen order;
    /// cells a table does not have are left empty.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut headers: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for table in &tables {
            for header in &table.headers {
                if !index.contains_key(header) {
                    index.insert(header.clone(), headers.len());
                    headers.push(header.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let positions: Vec<usize> = table.headers.iter().map(|h| index[h]).collect();
            for row in table.rows {
                let mut merged = vec![String::new(); headers.len()];
                for (cell, &pos) in row.into_iter().zip(&positions) {
                    merged[pos] = cell;
                }
                rows.push(merged);
            }
        }

        Table { headers, rows }
    }
}

/// Blank headers become `Unnamed: <i>`; repeats get `.1`, `.2` suffixes.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header
        };
        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        out.push(name);
    }
    out
}

/// Read a CSV file whose first record is the header row.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|c| String::from_utf8_lossy(c).into_owned())
                .collect(),
        );
    }

    Ok(Table::new(headers, rows))
}

/// Write a table as CSV, header row first. An empty table writes an empty file.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if !table.headers.is_empty() {
        writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the first worksheet of an XLSX workbook; row 0 is the header row.
pub fn read_xlsx(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::spreadsheet("workbook has no worksheets"))??;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(Table::with_header_row(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) if !dt.is_duration() => match dt.as_datetime() {
            Some(value) if value.time() == NaiveTime::MIN => value.format("%Y-%m-%d").to_string(),
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write a table to a single-sheet XLSX workbook.
///
/// With `infer_numbers`, cells that parse as finite numbers are written as
/// numeric cells; otherwise everything is text.
pub fn write_xlsx(table: &Table, path: &Path, infer_numbers: bool) -> Result<()> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string(0, col_index(col)?, header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(r + 1)
            .map_err(|_| Error::spreadsheet("too many rows for a worksheet"))?;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = col_index(col)?;
            match parse_number(value).filter(|_| infer_numbers) {
                Some(number) => sheet.write_number(row_num, col, number)?,
                None => sheet.write_string(row_num, col, value)?,
            };
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn col_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::spreadsheet("too many columns for a worksheet"))
}

fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed != value {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
