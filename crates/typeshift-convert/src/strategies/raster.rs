//! PDF to raster image.

use super::image::write_raster;
use crate::pdf::{self, PdfiumLoader};
use crate::{Result, Strategy};
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// Rasterises only the first page at 72 dpi; later pages are ignored.
pub struct PdfFirstPage {
    pdfium: PdfiumLoader,
    format: ImageFormat,
    quality: u8,
}

impl PdfFirstPage {
    pub fn new(pdfium: PdfiumLoader, format: ImageFormat, quality: u8) -> Self {
        Self {
            pdfium,
            format,
            quality,
        }
    }
}

impl Strategy for PdfFirstPage {
    fn name(&self) -> &'static str {
        "pdf-first-page"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let pdfium = self.pdfium.bind()?;
        let page = pdf::render_first_page(&pdfium, input)?;
        debug!(
            width = page.width(),
            height = page.height(),
            "Rendered first page"
        );
        write_raster(&page, self.format, self.quality, output)
    }
}
