//! # typeshift-convert
//!
//! Format routing and scratch-file lifecycle for the typeshift conversion relay.
//!
//! This crate provides:
//! - [`ConversionRouter`]: the dispatch table mapping a (source extension,
//!   target format) pair to exactly one [`Strategy`]
//! - The strategies themselves, thin adapters over third-party readers and
//!   writers (pdfium, lopdf, calamine, rust_xlsxwriter, csv, image, zip)
//! - [`ScratchDir`] and [`ConversionJob`]: collision-free temporary paths
//!   that are removed exactly once
//!
//! ## Example
//!
//! ```no_run
//! use typeshift_convert::{ConversionRouter, ConvertOptions, ScratchDir};
//!
//! let router = ConversionRouter::new(ConvertOptions::default());
//! let scratch = ScratchDir::system();
//!
//! let job = scratch.begin_job("csv", "XLSX");
//! std::fs::write(job.input(), "name,qty\nbolt,4\n")?;
//! router.convert("csv", "XLSX", job.input(), job.output())?;
//! // `job` removes both files when dropped.
//! # Ok::<(), typeshift_convert::Error>(())
//! ```

pub mod docx;
mod error;
pub mod format;
pub mod pdf;
mod router;
pub mod scratch;
pub mod strategies;
pub mod table;

pub use error::{Error, Result};
pub use router::{ConversionRouter, ConvertOptions, GridOptions, Route, Strategy};
pub use scratch::{ConversionJob, ScratchDir};
pub use table::Table;
