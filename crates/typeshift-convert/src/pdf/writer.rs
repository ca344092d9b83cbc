//! Small PDF writer on top of lopdf.
//!
//! Pages are drawn on a [`PageCanvas`] (text in Helvetica, stroked
//! rectangles, placed images) and appended to a [`PdfWriter`], which owns the
//! document object graph and saves it.

use crate::{Error, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::Path;

/// A4 portrait in points.
pub const A4: (f32, f32) = (595.28, 841.89);

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Width of `text` set in Helvetica at `size` points.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize] as u32,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// An image ready to be embedded as an XObject.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// Optional 8-bit alpha channel, already deflated.
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Wrap baseline JPEG bytes without re-encoding.
    pub fn jpeg(width: u32, height: u32, gray: bool, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            color_space: if gray { "DeviceGray" } else { "DeviceRGB" },
            filter: "DCTDecode",
            data,
            soft_mask: None,
        }
    }

    /// Deflate raw 8-bit samples (RGB or gray) and an optional alpha plane.
    pub fn raw(
        width: u32,
        height: u32,
        gray: bool,
        samples: &[u8],
        alpha: Option<&[u8]>,
    ) -> Result<Self> {
        Ok(Self {
            width,
            height,
            color_space: if gray { "DeviceGray" } else { "DeviceRGB" },
            filter: "FlateDecode",
            data: deflate(samples)?,
            soft_mask: alpha.map(deflate).transpose()?,
        })
    }
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Drawing operations for one page, in top-left-origin points.
#[derive(Debug)]
pub struct PageCanvas {
    width: f32,
    height: f32,
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

impl PageCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            operations: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(A4.0, A4.1)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Draw `text` with its baseline at `baseline` points from the top.
    pub fn text(&mut self, x: f32, baseline: f32, size: f32, text: &str) {
        let y = self.height - baseline;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Stroke a rectangle whose top-left corner is `(x, top)`.
    pub fn rect(&mut self, x: f32, top: f32, width: f32, height: f32) {
        let y = self.height - top - height;
        self.operations.extend([
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    /// Paint an embedded image over the whole page.
    pub fn fill_with_image(&mut self, image_id: ObjectId) {
        let name = format!("Im{}", self.images.len());
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    self.width.into(),
                    0.into(),
                    0.into(),
                    self.height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.images.push((name, image_id));
    }
}

/// Encode text for the standard WinAnsi Helvetica; unmappable chars become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Accumulates pages and writes the finished document.
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
        }
    }

    /// Add an image XObject and return its id for [`PageCanvas::fill_with_image`].
    pub fn add_image(&mut self, image: ImageXObject) -> ObjectId {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space,
            "BitsPerComponent" => 8,
            "Filter" => image.filter,
        };
        if let Some(mask) = image.soft_mask {
            let mask_id = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                mask,
            ));
            dict.set("SMask", mask_id);
        }
        self.doc.add_object(Stream::new(dict, image.data))
    }

    /// Append a finished page.
    pub fn add_page(&mut self, canvas: PageCanvas) -> Result<()> {
        let content = Content {
            operations: canvas.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut xobjects = lopdf::Dictionary::new();
        for (name, id) in canvas.images {
            xobjects.set(name.into_bytes(), id);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), canvas.width.into(), canvas.height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => self.font_id },
                "XObject" => xobjects,
            },
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Write the document. A document without pages gets one blank A4 page.
    pub fn save(mut self, path: &Path) -> Result<()> {
        if self.kids.is_empty() {
            self.add_page(PageCanvas::a4())?;
        }

        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();
        self.doc
            .save(path)
            .map_err(|e| Error::pdf(format!("failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }
}

/// Fixed-size cell grid that flows onto new pages, in the manner of a
/// simple report writer: cells left to right, rows top to bottom, a new page
/// when the next row would cross the bottom margin.
pub struct GridLayout {
    pub cell_width: f32,
    pub cell_height: f32,
    pub font_size: f32,
    pub margin: f32,
    pub bottom_margin: f32,
}

impl Default for GridLayout {
    /// 35 × 10 mm cells, 10 pt text, 10 mm margins, 20 mm bottom margin.
    fn default() -> Self {
        Self {
            cell_width: 35.0 * MM,
            cell_height: 10.0 * MM,
            font_size: 10.0,
            margin: 10.0 * MM,
            bottom_margin: 20.0 * MM,
        }
    }
}

impl GridLayout {
    /// Draw all rows, starting a page whenever needed. Returns the pages.
    pub fn draw<'a, I>(&self, rows: I) -> Vec<PageCanvas>
    where
        I: IntoIterator<Item = Vec<&'a str>>,
    {
        let mut pages = Vec::new();
        let mut canvas = PageCanvas::a4();
        let mut y = self.margin;

        for row in rows {
            if y + self.cell_height > canvas.height() - self.bottom_margin {
                pages.push(std::mem::replace(&mut canvas, PageCanvas::a4()));
                y = self.margin;
            }
            self.draw_row(&mut canvas, y, &row, self.cell_width);
            y += self.cell_height;
        }

        pages.push(canvas);
        pages
    }

    /// Draw one row of bordered cells at `top`.
    pub fn draw_row(&self, canvas: &mut PageCanvas, top: f32, cells: &[&str], cell_width: f32) {
        let padding = 1.0 * MM;
        let baseline = top + self.cell_height / 2.0 + 0.3 * self.font_size;
        let mut x = self.margin;
        for cell in cells {
            canvas.rect(x, top, cell_width, self.cell_height);
            if !cell.is_empty() {
                canvas.text(x + padding, baseline, self.font_size, cell);
            }
            x += cell_width;
        }
    }
}
