//! The conversion dispatch table.
//!
//! A [`ConversionRouter`] holds an ordered list of [`Route`]s, each binding a
//! (source extension, target format) pair to one [`Strategy`]. Lookup is
//! first-match-wins over that list; the router never chooses where output is
//! written.

use crate::pdf::PdfiumLoader;
use crate::strategies::{
    document::{DocxToPdf, PdfToDocx},
    grid::TableGrid,
    image::{ImageToPdf, RasterReencode},
    raster::PdfFirstPage,
    tabular::{CsvToXlsx, DocxTables, PdfTables, TableSink, XlsxToCsv},
    TableSource,
};
use crate::{Error, Result};
use image::ImageFormat;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A conversion routine bound to one (source extension, target format) pair.
///
/// Implementations are synchronous and may block; callers on an async
/// runtime should run them on a blocking thread.
pub trait Strategy: Send + Sync {
    /// Short name for logs and the format listing.
    fn name(&self) -> &'static str;

    /// Read `input` and write the converted file to `output`.
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// One entry of the dispatch table.
#[derive(Clone)]
pub struct Route {
    pub source: &'static str,
    pub target: &'static str,
    pub strategy: Arc<dyn Strategy>,
}

impl Route {
    pub fn new(source: &'static str, target: &'static str, strategy: Arc<dyn Strategy>) -> Self {
        Self {
            source,
            target,
            strategy,
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// Limits for the spreadsheet-to-PDF grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOptions {
    /// Data rows drawn after the header row; the rest are dropped.
    pub max_rows: usize,
    /// Characters kept per cell.
    pub cell_chars: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            max_rows: 100,
            cell_chars: 15,
        }
    }
}

/// Tunables passed to the strategies when the table is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// pdfium library file or directory; see [`PdfiumLoader`].
    pub pdfium_library_path: Option<PathBuf>,
    pub grid: GridOptions,
    /// JPEG quality (1-100) for lossy raster output.
    pub jpeg_quality: u8,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            pdfium_library_path: None,
            grid: GridOptions::default(),
            jpeg_quality: 75,
        }
    }
}

/// Selects and runs exactly one strategy per (extension, target) pair.
#[derive(Debug, Clone)]
pub struct ConversionRouter {
    routes: Vec<Route>,
}

impl ConversionRouter {
    /// Build the standard dispatch table.
    pub fn new(options: ConvertOptions) -> Self {
        let pdfium = PdfiumLoader::new(options.pdfium_library_path.clone());
        let quality = options.jpeg_quality;
        let grid = options.grid;

        let image_to_pdf: Arc<dyn Strategy> = Arc::new(ImageToPdf);
        let jpeg_to_png: Arc<dyn Strategy> = Arc::new(RasterReencode::new(ImageFormat::Png, quality));

        let routes = vec![
            Route::new("pdf", "DOCX", Arc::new(PdfToDocx::new(pdfium.clone()))),
            Route::new("docx", "PDF", Arc::new(DocxToPdf)),
            Route::new("pdf", "XLSX", Arc::new(PdfTables::new(pdfium.clone(), TableSink::Xlsx))),
            Route::new("pdf", "CSV", Arc::new(PdfTables::new(pdfium.clone(), TableSink::Csv))),
            Route::new("docx", "XLSX", Arc::new(DocxTables::new(TableSink::Xlsx))),
            Route::new("docx", "CSV", Arc::new(DocxTables::new(TableSink::Csv))),
            Route::new("csv", "XLSX", Arc::new(CsvToXlsx)),
            Route::new("xlsx", "CSV", Arc::new(XlsxToCsv)),
            Route::new("csv", "PDF", Arc::new(TableGrid::new(TableSource::Csv, grid.clone()))),
            Route::new("xlsx", "PDF", Arc::new(TableGrid::new(TableSource::Xlsx, grid))),
            Route::new("jpg", "PDF", image_to_pdf.clone()),
            Route::new("jpeg", "PDF", image_to_pdf.clone()),
            Route::new("png", "PDF", image_to_pdf),
            Route::new("jpg", "PNG", jpeg_to_png.clone()),
            Route::new("jpeg", "PNG", jpeg_to_png),
            Route::new("png", "JPG", Arc::new(RasterReencode::new(ImageFormat::Jpeg, quality))),
            Route::new("pdf", "PNG", Arc::new(PdfFirstPage::new(pdfium.clone(), ImageFormat::Png, quality))),
            Route::new("pdf", "JPG", Arc::new(PdfFirstPage::new(pdfium, ImageFormat::Jpeg, quality))),
        ];

        Self { routes }
    }

    /// Build a router over a custom table.
    pub fn with_routes(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The table in priority order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the route for a pair. The extension is matched case-insensitively
    /// as lower case and the target as upper case.
    pub fn resolve(&self, extension: &str, target: &str) -> Result<&Route> {
        let extension = extension.trim().to_ascii_lowercase();
        let target = target.trim().to_ascii_uppercase();
        self.routes
            .iter()
            .find(|r| r.source == extension && r.target == target)
            .ok_or_else(|| Error::unsupported(extension, target))
    }

    /// Resolve and run the strategy for a pair.
    pub fn convert(&self, extension: &str, target: &str, input: &Path, output: &Path) -> Result<()> {
        let route = self.resolve(extension, target)?;
        debug!(
            extension = route.source,
            target = route.target,
            strategy = route.strategy.name(),
            "Dispatching conversion"
        );
        route.strategy.convert(input, output)
    }

    /// Targets reachable from an extension, in table order.
    pub fn supported_targets(&self, extension: &str) -> Vec<&'static str> {
        let extension = extension.trim().to_ascii_lowercase();
        let mut targets = Vec::new();
        for route in self.routes.iter().filter(|r| r.source == extension) {
            if !targets.contains(&route.target) {
                targets.push(route.target);
            }
        }
        targets
    }

    /// Every source extension with its targets.
    pub fn formats(&self) -> BTreeMap<&'static str, Vec<&'static str>> {
        let mut formats: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
        for route in &self.routes {
            let targets = formats.entry(route.source).or_default();
            if !targets.contains(&route.target) {
                targets.push(route.target);
            }
        }
        formats
    }
}

impl Default for ConversionRouter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}
