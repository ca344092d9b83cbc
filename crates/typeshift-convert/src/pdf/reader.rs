//! Text and raster access to existing PDFs through pdfium.

use super::layout::{group_lines, Fragment, TextLine};
use crate::{Error, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the pdfium library file or its directory.
pub const PDFIUM_ENV: &str = "PDFIUM_LIB_PATH";

/// Locates and binds the pdfium shared library.
///
/// Candidates are tried in order: the configured path, `PDFIUM_LIB_PATH`,
/// the working directory, then the system library search path. A path may
/// name the library file itself or the directory holding it.
#[derive(Debug, Clone, Default)]
pub struct PdfiumLoader {
    library_path: Option<PathBuf>,
}

impl PdfiumLoader {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    /// Library files to try, after directory expansion.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = &self.library_path {
            paths.push(path.clone());
        }
        if let Some(path) = std::env::var_os(PDFIUM_ENV).filter(|p| !p.is_empty()) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("."));
        paths
            .into_iter()
            .map(|path| {
                if path.is_dir() {
                    path.join(Pdfium::pdfium_platform_library_name())
                } else {
                    path
                }
            })
            .collect()
    }

    /// Bind pdfium, or fail with [`Error::PdfiumUnavailable`].
    pub fn bind(&self) -> Result<Pdfium> {
        let mut tried = Vec::new();
        for candidate in self.candidates() {
            if !candidate.is_file() {
                continue;
            }
            match Pdfium::bind_to_library(&candidate) {
                Ok(bindings) => {
                    debug!("Bound pdfium from {}", candidate.display());
                    return Ok(Pdfium::new(bindings));
                }
                Err(e) => tried.push(format!("{}: {:?}", candidate.display(), e)),
            }
        }

        match Pdfium::bind_to_system_library() {
            Ok(bindings) => Ok(Pdfium::new(bindings)),
            Err(e) => {
                tried.push(format!("system library: {:?}", e));
                Err(Error::PdfiumUnavailable(tried.join("; ")))
            }
        }
    }

    /// True when a library can be bound. Used to skip pdfium-backed work.
    pub fn is_available(&self) -> bool {
        self.bind().is_ok()
    }
}

/// Text of one page: reconstructed lines and pdfium's plain text.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    pub lines: Vec<TextLine>,
    pub text: String,
}

fn open<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| Error::pdf(format!("cannot open {}: {:?}", path.display(), e)))
}

/// Extract positioned text from every page.
///
/// Each visible character becomes a fragment; line grouping joins them
/// back into words and cells by their spacing.
pub fn read_pages(pdfium: &Pdfium, path: &Path) -> Result<Vec<PageText>> {
    let document = open(pdfium, path)?;
    let mut pages = Vec::new();

    for (index, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| Error::pdf(format!("page {}: {:?}", index + 1, e)))?;

        let fragments: Vec<Fragment> = text
            .chars()
            .iter()
            .filter_map(|ch| {
                let c = ch.unicode_char().filter(|c| !c.is_whitespace())?;
                let bounds = ch.loose_bounds().ok()?;
                Some(Fragment {
                    left: bounds.left().value,
                    right: bounds.right().value,
                    bottom: bounds.bottom().value,
                    top: bounds.top().value,
                    text: c.to_string(),
                })
            })
            .collect();

        let lines = group_lines(fragments);
        debug!("Page {}: {} text lines", index + 1, lines.len());
        pages.push(PageText {
            lines,
            text: text.all(),
        });
    }

    Ok(pages)
}

/// Render the first page at 72 dpi.
pub fn render_first_page(pdfium: &Pdfium, path: &Path) -> Result<DynamicImage> {
    let document = open(pdfium, path)?;
    let pages = document.pages();
    if pages.len() == 0 {
        return Err(Error::Empty("PDF has no pages".to_string()));
    }

    let page = pages
        .get(0)
        .map_err(|e| Error::pdf(format!("page 1: {:?}", e)))?;
    let config = PdfRenderConfig::new().scale_page_by_factor(1.0);
    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| Error::pdf(format!("failed to render page 1: {:?}", e)))?;

    Ok(bitmap.as_image())
}
