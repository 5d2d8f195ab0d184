//! Pixel transforms producing replacement artifacts
//!
//! Every transform decodes the input, works on the raster and re-encodes the
//! output as PNG. Nothing here touches a record: installing the output is the
//! store's job, so a failing transform leaves the record as it was.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::types::{CropRect, EncodedImage, OutputBound};

pub const PNG_MIME: &str = "image/png";

/// Rotates 90 degrees clockwise; the output swaps width and height
pub fn rotate_clockwise(bytes: &[u8]) -> Result<EncodedImage> {
    let image = decode(bytes)?;
    encode_png(&image.rotate90())
}

/// Cuts `rect` out of the image and scales it down to fit `bound`
///
/// The rectangle is clamped to the image; one that misses the image entirely
/// is an error. Scaling keeps the aspect ratio.
pub fn crop(bytes: &[u8], rect: CropRect, bound: OutputBound) -> Result<EncodedImage> {
    let image = decode(bytes)?;
    let (width, height) = image.dimensions();

    let x = rect.x.min(width);
    let y = rect.y.min(height);
    let w = rect.width.min(width - x);
    let h = rect.height.min(height - y);
    if w == 0 || h == 0 {
        return Err(Error::Transform(format!(
            "crop rectangle {},{} {}x{} lies outside the {}x{} image",
            rect.x, rect.y, rect.width, rect.height, width, height
        )));
    }

    let cropped = image.crop_imm(x, y, w, h);
    let (out_w, out_h) = fit_within(w, h, bound);
    let output = if (out_w, out_h) == (w, h) {
        cropped
    } else {
        cropped.resize_exact(out_w, out_h, FilterType::Lanczos3)
    };

    encode_png(&output)
}

/// Reads image dimensions without keeping the decoded raster
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    Ok(decode(bytes)?.dimensions())
}

fn fit_within(width: u32, height: u32, bound: OutputBound) -> (u32, u32) {
    let max_w = bound.max_width.max(1);
    let max_h = bound.max_height.max(1);
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let scale = f64::min(
        max_w as f64 / width as f64,
        max_h as f64 / height as f64,
    );
    let scaled_w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
    let scaled_h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
    (scaled_w, scaled_h)
}

fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

fn encode_png(image: &DynamicImage) -> Result<EncodedImage> {
    // PNG has no float channels
    let converted;
    let image = match image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            converted = DynamicImage::ImageRgba16(image.to_rgba16());
            &converted
        }
        other => other,
    };

    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(EncodedImage::png(buffer))
}
