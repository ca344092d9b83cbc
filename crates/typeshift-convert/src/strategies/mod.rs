//! Conversion strategies, one type per family of routes.
//!
//! Each type implements [`Strategy`](crate::Strategy) and is bound to its
//! (extension, target) pairs by [`ConversionRouter`](crate::ConversionRouter).

pub mod document;
pub mod grid;
pub mod image;
pub mod raster;
pub mod tabular;

use crate::table::{self, Table};
use crate::Result;
use std::path::Path;

/// Spreadsheet input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Csv,
    Xlsx,
}

impl TableSource {
    pub fn read(self, path: &Path) -> Result<Table> {
        match self {
            Self::Csv => table::read_csv(path),
            Self::Xlsx => table::read_xlsx(path),
        }
    }
}
