//! Image quantizer.
//!
//! Converts an RGB pixel buffer into the packed 1-bit raster the printer
//! expects. A set bit is an ink dot; bits are packed most significant bit
//! first, so the leftmost pixel of each group of eight lands in bit 7.
//!
//! ```text
//! pixels:  ██░░██░░ ██
//! bytes:   0b1100_1100 0b1100_0000
//!                              ^^^^^^ padding, always zero
//! ```

use crate::error::Error;

/// Luminance below this value prints a dot.
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Bayer 8x8 ordered dithering matrix, values 0..=63.
const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Row-major RGB pixels produced by an image decoder or text renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGB data, three bytes per pixel.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, Error> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: rgb.len(),
            });
        }
        Ok(PixelBuffer { width, height, rgb })
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                rgb.extend_from_slice(&f(x, y));
            }
        }
        PixelBuffer { width, height, rgb }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    /// Unweighted mean of R, G and B for every pixel.
    pub fn luminance(&self) -> GrayscaleBuffer {
        let luma = self
            .rgb
            .chunks_exact(3)
            .map(|p| mean(p[0], p[1], p[2]))
            .collect();
        GrayscaleBuffer {
            width: self.width,
            height: self.height,
            luma,
        }
    }
}

/// Per-pixel luminance in `0..=255`, same dimensions as the source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayscaleBuffer {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

impl GrayscaleBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.luma[y as usize * self.width as usize + x as usize]
    }
}

/// Packed monochrome raster.
///
/// `data.len() == height * bytes_per_row` always holds, and the unused low
/// bits of the last byte in each row are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapPlane {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BitmapPlane {
    /// Wrap bytes that are already packed MSB-first, `ceil(width / 8)` per row.
    ///
    /// Padding bits are cleared so the row invariant holds for any input.
    pub fn from_raw(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let bytes_per_row = bytes_per_row(width);
        let expected = bytes_per_row * height as usize;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let used = width % 8;
        if used != 0 {
            let mask = 0xFFu8 << (8 - used);
            for row in data.chunks_exact_mut(bytes_per_row) {
                row[bytes_per_row - 1] &= mask;
            }
        }
        Ok(BitmapPlane {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        bytes_per_row(self.width)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over packed rows.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.bytes_per_row())
    }

    /// `true` when the dot at `(x, y)` is inked.
    pub fn get(&self, x: u32, y: u32) -> bool {
        let byte = self.data[y as usize * self.bytes_per_row() + x as usize / 8];
        byte & (0x80 >> (x % 8)) != 0
    }
}

/// How luminance is turned into ink bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeMode {
    /// Ink wherever luminance is strictly below the given value.
    Threshold(u8),
    /// Ordered dithering with an 8x8 Bayer matrix.
    Dither,
}

impl Default for QuantizeMode {
    fn default() -> Self {
        QuantizeMode::Threshold(DEFAULT_THRESHOLD)
    }
}

impl QuantizeMode {
    fn threshold_at(self, x: u32, y: u32) -> u8 {
        match self {
            QuantizeMode::Threshold(t) => t,
            // spread 0..=63 over 2..=254 so black always prints and white never does
            QuantizeMode::Dither => BAYER8[(y & 7) as usize][(x & 7) as usize] * 4 + 2,
        }
    }
}

/// Desaturate a pixel buffer.
///
/// Each channel is replaced with the Rec. 709 luma mix
/// `0.213 R + 0.715 G + 0.072 B`. Quantization does not depend on this pass;
/// it is exposed for callers that want a gray preview or a perceptual
/// pre-pass before thresholding.
pub fn to_grayscale(pixels: &PixelBuffer) -> PixelBuffer {
    let mut rgb = Vec::with_capacity(pixels.rgb.len());
    for p in pixels.rgb.chunks_exact(3) {
        let luma =
            (213 * p[0] as u32 + 715 * p[1] as u32 + 72 * p[2] as u32 + 500) / 1000;
        let luma = luma as u8;
        rgb.extend_from_slice(&[luma, luma, luma]);
    }
    PixelBuffer {
        width: pixels.width,
        height: pixels.height,
        rgb,
    }
}

/// Quantize with a fixed threshold: ink where `(R + G + B) / 3 < threshold`.
pub fn quantize(pixels: &PixelBuffer, threshold: u8) -> Result<BitmapPlane, Error> {
    quantize_with(pixels, QuantizeMode::Threshold(threshold))
}

/// Quantize with the given mode.
pub fn quantize_with(pixels: &PixelBuffer, mode: QuantizeMode) -> Result<BitmapPlane, Error> {
    let (width, height) = (pixels.width, pixels.height);
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }

    let gray = pixels.luminance();
    let bytes_per_row = bytes_per_row(width);
    let mut data = vec![0u8; bytes_per_row * height as usize];

    for (y, (row, src)) in data
        .chunks_exact_mut(bytes_per_row)
        .zip(gray.luma.chunks_exact(width as usize))
        .enumerate()
    {
        for (x, &luma) in src.iter().enumerate() {
            if luma < mode.threshold_at(x as u32, y as u32) {
                row[x / 8] |= 0x80 >> (x % 8);
            }
        }
    }

    Ok(BitmapPlane {
        width,
        height,
        data,
    })
}

fn bytes_per_row(width: u32) -> usize {
    (width as usize + 7) / 8
}

fn mean(r: u8, g: u8, b: u8) -> u8 {
    ((r as u16 + g as u16 + b as u16) / 3) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |_, _| rgb)
    }

    #[test]
    fn test_output_length_matches_rows() {
        for &(w, h) in &[(1, 1), (7, 3), (8, 2), (9, 5), (384, 4), (385, 1)] {
            let plane = quantize(&solid(w, h, [0, 0, 0]), DEFAULT_THRESHOLD).unwrap();
            assert_eq!(plane.data().len(), h as usize * ((w as usize + 7) / 8));
            assert_eq!(plane.rows().count(), h as usize);
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let dark = solid(1, 1, [127, 127, 127]);
        let light = solid(1, 1, [128, 128, 128]);
        assert_eq!(quantize(&dark, 128).unwrap().data(), &[0x80]);
        assert_eq!(quantize(&light, 128).unwrap().data(), &[0x00]);
    }

    #[test]
    fn test_luminance_truncates() {
        // (128 + 128 + 127) / 3 = 127.67 -> 127, which is ink
        let pixels = solid(1, 1, [128, 128, 127]);
        let gray = pixels.luminance();
        assert_eq!((gray.width(), gray.height()), (1, 1));
        assert_eq!(gray.get(0, 0), 127);
        assert!(quantize(&pixels, 128).unwrap().get(0, 0));
    }

    #[test]
    fn test_all_white_is_blank() {
        let plane = quantize(&solid(50, 3, [255, 255, 255]), 128).unwrap();
        assert!(plane.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_all_black_leaves_padding_clear() {
        let plane = quantize(&solid(12, 2, [0, 0, 0]), 128).unwrap();
        assert_eq!(plane.data(), &[0xFF, 0xF0, 0xFF, 0xF0]);

        let plane = quantize(&solid(16, 1, [0, 0, 0]), 128).unwrap();
        assert_eq!(plane.data(), &[0xFF, 0xFF]);
    }

    #[test]
    fn test_msb_is_leftmost_pixel() {
        let pixels = PixelBuffer::from_fn(10, 1, |x, _| {
            if x == 0 || x == 9 {
                [0, 0, 0]
            } else {
                [255, 255, 255]
            }
        });
        let plane = quantize(&pixels, 128).unwrap();
        assert_eq!(plane.data(), &[0x80, 0x40]);
        assert!(plane.get(0, 0));
        assert!(!plane.get(1, 0));
        assert!(plane.get(9, 0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let pixels = PixelBuffer::new(0, 4, vec![]).unwrap();
        match quantize(&pixels, 128) {
            Err(Error::InvalidDimensions { width: 0, height: 4 }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_pixel_buffer_size_checked() {
        match PixelBuffer::new(2, 2, vec![0; 11]) {
            Err(Error::BufferSizeMismatch {
                expected: 12,
                actual: 11,
            }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_grayscale_is_desaturated() {
        let pixels = PixelBuffer::new(3, 1, vec![255, 0, 0, 0, 255, 0, 255, 255, 255]).unwrap();
        let gray = to_grayscale(&pixels);
        assert_eq!(gray.pixel(0, 0), [54, 54, 54]);
        assert_eq!(gray.pixel(1, 0), [182, 182, 182]);
        assert_eq!(gray.pixel(2, 0), [255, 255, 255]);
    }

    #[test]
    fn test_dither_extremes() {
        let black = quantize_with(&solid(16, 16, [0, 0, 0]), QuantizeMode::Dither).unwrap();
        assert!(black.data().iter().all(|&b| b == 0xFF));

        let white = quantize_with(&solid(16, 16, [255, 255, 255]), QuantizeMode::Dither).unwrap();
        assert!(white.data().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_dither_mid_gray_is_half_ink() {
        let plane = quantize_with(&solid(8, 8, [128, 128, 128]), QuantizeMode::Dither).unwrap();
        let ink: u32 = plane.data().iter().map(|b| b.count_ones()).sum();
        assert_eq!(ink, 32);
    }

    #[test]
    fn test_from_raw_clears_padding() {
        let plane = BitmapPlane::from_raw(4, 2, vec![0xFF, 0xFF]).unwrap();
        assert_eq!(plane.data(), &[0xF0, 0xF0]);
        assert!(BitmapPlane::from_raw(4, 2, vec![0xFF]).is_err());
    }
}
