//! Shared test utilities: synthetic images encoded in memory.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let source = jpeg_bytes(400, 200);
//! let rendered = render_with(&source, None, &["fill-100x100"]);
//! assert_eq!((rendered.width, rendered.height), (100, 100));
//! ```

use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

use crate::filter::{ImageFilter, Rendered};
use crate::geometry::Rect;
use crate::imaging::{EncodeParams, RustBackend};

// =========================================================================
// Pixel sources
// =========================================================================

/// Deterministic RGB gradient, distinct per pixel for small sizes.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Half-transparent RGBA image.
pub fn translucent(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 128])
    })
}

// =========================================================================
// Encoded buffers
// =========================================================================

/// A baseline JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buffer = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buffer
}

/// A PNG holding `img`.
pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .unwrap();
    buffer
}

/// A PNG with an alpha channel.
pub fn rgba_png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .unwrap();
    buffer
}

/// An 8-bit palette PNG alternating between two colors.
pub fn palette_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let indices: Vec<u8> = (0..width * height).map(|i| (i % 2) as u8).collect();
    let mut buffer = Vec::new();
    let mut encoder = png::Encoder::new(&mut buffer, width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(vec![200, 30, 30, 20, 40, 220]);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&indices).unwrap();
    writer.finish().unwrap();
    buffer
}

/// A 1-bit grayscale PNG with 8 pixels per row, stripes alternating per column.
pub fn bilevel_png_bytes(height: u32) -> Vec<u8> {
    let rows = vec![0b1010_1010u8; height as usize];
    let mut buffer = Vec::new();
    let mut encoder = png::Encoder::new(&mut buffer, 8, height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::One);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&rows).unwrap();
    writer.finish().unwrap();
    buffer
}

// =========================================================================
// Pipeline shortcuts
// =========================================================================

/// Parse `specs` and run them through the production backend. Panics on error.
pub fn render_with(source: &[u8], focal_point: Option<Rect>, specs: &[&str]) -> Rendered {
    let filter = ImageFilter::parse(specs).unwrap_or_else(|e| panic!("bad specs {specs:?}: {e}"));
    filter
        .run(
            &RustBackend::new(),
            source,
            focal_point.as_ref(),
            &EncodeParams::default(),
        )
        .unwrap_or_else(|e| panic!("render failed for {specs:?}: {e}"))
}
