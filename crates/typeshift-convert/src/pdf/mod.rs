//! PDF reading (pdfium) and writing (lopdf).
//!
//! Reading goes through a pdfium shared library that must be present at
//! runtime; see [`PdfiumLoader`] for how it is located. Writing is pure Rust.

pub mod layout;
mod reader;
pub mod writer;

pub use layout::{find_tables, group_lines, text_rows, Fragment, TableRegion, TextCell, TextLine};
pub use reader::{read_pages, render_first_page, PageText, PdfiumLoader, PDFIUM_ENV};
pub use writer::{GridLayout, ImageXObject, PageCanvas, PdfWriter};
