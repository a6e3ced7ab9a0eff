//! Adapters between the `image` crate and the quantizer.
//!
//! Scaling lives here rather than in the printer: callers resize to
//! [`crate::DEVICE_WIDTH`] first, then quantize.

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use log::debug;
use std::path::Path;

use crate::{bitmap::PixelBuffer, error::Error};

/// Decode an image file and fit it to the printer width.
pub fn load_image<P: AsRef<Path>>(path: P, width: u32) -> Result<PixelBuffer, Error> {
    let image = image::open(path)?;
    Ok(PixelBuffer::from(&fit_to_width(&image, width)))
}

/// Scale `image` to exactly `width` pixels wide.
///
/// Height is scaled by the same factor and rounded down.
pub fn fit_to_width(image: &DynamicImage, width: u32) -> DynamicImage {
    let (w, h) = image.dimensions();
    if w == width {
        return image.clone();
    }
    let height = (h as u64 * width as u64 / w.max(1) as u64) as u32;
    debug!("scaling {}x{} to {}x{}", w, h, width, height);
    image.resize_exact(width, height, FilterType::Triangle)
}

impl From<&DynamicImage> for PixelBuffer {
    fn from(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        PixelBuffer::from_fn(rgb.width(), rgb.height(), |x, y| rgb.get_pixel(x, y).0)
    }
}
