//! Raster image strategies.

use crate::pdf::{ImageXObject, PageCanvas, PdfWriter};
use crate::{Result, Strategy};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// PDF points per pixel when an image carries no resolution (96 dpi).
const POINTS_PER_PIXEL: f32 = 72.0 / 96.0;

/// Decode an image, trusting its bytes over the file extension.
pub fn load(path: &Path) -> Result<(DynamicImage, ImageFormat, Vec<u8>)> {
    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes)?;
    let decoded = image::load_from_memory_with_format(&bytes, format)?;
    Ok((decoded, format, bytes))
}

/// Composite any alpha channel onto white and drop it.
pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode as baseline JPEG at the given quality.
pub fn write_jpeg(image: &DynamicImage, quality: u8, output: &Path) -> Result<()> {
    let rgb = flatten_on_white(image);
    let mut writer = BufWriter::new(File::create(output)?);
    JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100)).encode_image(&rgb)?;
    writer.flush()?;
    Ok(())
}

/// Number of colour components declared by a JPEG frame header.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 9 < bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        let length = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            return Some(bytes[i + 9]);
        }
        i += 2 + length;
    }
    None
}

/// One page per image, sized to the image.
///
/// Gray and RGB JPEGs are embedded as-is; everything else is stored as
/// deflated samples with alpha kept as a soft mask.
pub struct ImageToPdf;

impl ImageToPdf {
    fn xobject(image: &DynamicImage, format: ImageFormat, bytes: Vec<u8>) -> Result<ImageXObject> {
        let (width, height) = image.dimensions();

        if format == ImageFormat::Jpeg {
            match (jpeg_components(&bytes), image.color()) {
                (Some(3), ColorType::Rgb8) => return Ok(ImageXObject::jpeg(width, height, false, bytes)),
                (Some(1), ColorType::L8) => return Ok(ImageXObject::jpeg(width, height, true, bytes)),
                _ => {}
            }
        }

        let color = image.color();
        if color.has_alpha() {
            let rgba = image.to_rgba8();
            let mut samples = Vec::with_capacity((width * height * 3) as usize);
            let mut alpha = Vec::with_capacity((width * height) as usize);
            for pixel in rgba.pixels() {
                samples.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }
            ImageXObject::raw(width, height, false, &samples, Some(&alpha))
        } else if matches!(color, ColorType::L8 | ColorType::L16) {
            ImageXObject::raw(width, height, true, image.to_luma8().as_raw(), None)
        } else {
            ImageXObject::raw(width, height, false, image.to_rgb8().as_raw(), None)
        }
    }
}

impl Strategy for ImageToPdf {
    fn name(&self) -> &'static str {
        "image-to-pdf"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let (image, format, bytes) = load(input)?;
        let (width, height) = image.dimensions();
        let xobject = Self::xobject(&image, format, bytes)?;

        let mut writer = PdfWriter::new();
        let image_id = writer.add_image(xobject);
        let mut page = PageCanvas::new(
            width as f32 * POINTS_PER_PIXEL,
            height as f32 * POINTS_PER_PIXEL,
        );
        page.fill_with_image(image_id);
        writer.add_page(page)?;
        writer.save(output)
    }
}

/// Decode and re-encode into another raster format.
pub struct RasterReencode {
    format: ImageFormat,
    quality: u8,
}

impl RasterReencode {
    pub fn new(format: ImageFormat, quality: u8) -> Self {
        Self { format, quality }
    }
}

/// Write a decoded image as PNG or JPEG.
pub fn write_raster(image: &DynamicImage, format: ImageFormat, quality: u8, output: &Path) -> Result<()> {
    if format == ImageFormat::Jpeg {
        write_jpeg(image, quality, output)
    } else {
        image.save_with_format(output, format)?;
        Ok(())
    }
}

impl Strategy for RasterReencode {
    fn name(&self) -> &'static str {
        "raster-reencode"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let (image, _, _) = load(input)?;
        write_raster(&image, self.format, self.quality, output)
    }
}
