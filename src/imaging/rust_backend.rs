//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format guessing |
//! | Palette / 1-bit PNG detection | `png::Decoder::read_info` (header only) |
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with the configured [`Resample`] filter |
//! | Encode → JPEG | `jpeg-encoder` (progressive, optimized Huffman tables) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::backend::{
    BackendError, ColorMode, Decoded, Dimensions, ImageBackend, OutputFormat, SourceFormat,
};
use super::params::{EncodeParams, JpegParams, PngParams, Resample};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// A decoded image plus the color layout it had *before* decoding.
///
/// The `image` crate expands palettes and sub-byte depths while decoding,
/// so the original layout comes from the decoder or the file header.
#[derive(Debug, Clone)]
pub struct Raster {
    pixels: DynamicImage,
    mode: ColorMode,
}

impl Raster {
    pub fn new(pixels: DynamicImage, mode: ColorMode) -> Self {
        Self { pixels, mode }
    }

    /// Wrap an in-memory image, deriving its mode from the pixel layout.
    pub fn from_pixels(pixels: DynamicImage) -> Self {
        let mode = mode_of(&pixels);
        Self { pixels, mode }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend {
    filter: Resample,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: Resample) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> Resample {
        self.filter
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(format!("Failed to read image header: {e}")))
}

fn source_format(format: Option<ImageFormat>) -> SourceFormat {
    match format {
        Some(ImageFormat::Jpeg) => SourceFormat::Jpeg,
        Some(ImageFormat::Png) => SourceFormat::Png,
        Some(other) => SourceFormat::Other(
            other
                .extensions_str()
                .first()
                .copied()
                .unwrap_or("unknown")
                .to_string(),
        ),
        None => SourceFormat::Other("unknown".to_string()),
    }
}

/// Map the decoder's view of the file to a [`ColorMode`].
///
/// Sub-byte color layouts only occur with palettes; sub-byte gray with one
/// bit is bilevel. `Unknown` is what indexed sources report in some codecs.
fn original_mode(color: ExtendedColorType) -> ColorMode {
    use ExtendedColorType as E;
    match color {
        E::L1 | E::La1 => ColorMode::Bilevel,
        E::Rgb1 | E::Rgb2 | E::Rgb4 | E::Rgba1 | E::Rgba2 | E::Rgba4 | E::Unknown(_) => {
            ColorMode::Indexed
        }
        E::L2 | E::L4 | E::L8 | E::L16 => ColorMode::Gray,
        E::La2 | E::La4 | E::La8 | E::La16 => ColorMode::GrayAlpha,
        E::Rgb8 | E::Rgb16 | E::Rgb32F | E::Bgr8 => ColorMode::Rgb,
        E::Rgba8 | E::Rgba16 | E::Rgba32F | E::Bgra8 => ColorMode::Rgba,
        _ => ColorMode::Other,
    }
}

/// Palette and 1-bit gray layouts from a PNG header.
///
/// The `image` PNG decoder reports these as the expanded layout (an 8-bit
/// palette shows up as `Rgb8`), so the header is read directly.
fn png_header_mode(bytes: &[u8]) -> Option<ColorMode> {
    let reader = png::Decoder::new(Cursor::new(bytes)).read_info().ok()?;
    let info = reader.info();
    match (info.color_type, info.bit_depth) {
        (png::ColorType::Indexed, _) => Some(ColorMode::Indexed),
        (png::ColorType::Grayscale, png::BitDepth::One) => Some(ColorMode::Bilevel),
        _ => None,
    }
}

fn mode_of(pixels: &DynamicImage) -> ColorMode {
    match pixels {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => ColorMode::Gray,
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => ColorMode::GrayAlpha,
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
            ColorMode::Rgb
        }
        DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageRgba16(_)
        | DynamicImage::ImageRgba32F(_) => ColorMode::Rgba,
        _ => ColorMode::Other,
    }
}

fn encode_jpeg(image: &DynamicImage, params: &JpegParams) -> Result<Vec<u8>, BackendError> {
    let fail = |reason: String| BackendError::Encode {
        format: OutputFormat::Jpeg,
        reason,
    };

    if image.width() == 0 || image.height() == 0 {
        return Err(fail("image is empty".to_string()));
    }

    // JPEG has no alpha channel; it is dropped, not composited.
    let rgb = image.to_rgb8();
    let width = u16::try_from(rgb.width())
        .map_err(|_| fail(format!("width {} exceeds JPEG limit", rgb.width())))?;
    let height = u16::try_from(rgb.height())
        .map_err(|_| fail(format!("height {} exceeds JPEG limit", rgb.height())))?;

    let mut buffer = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buffer, params.quality.value());
    encoder.set_progressive(params.progressive);
    encoder.set_optimized_huffman_tables(params.optimize_huffman);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e: jpeg_encoder::EncodingError| fail(e.to_string()))?;

    Ok(buffer)
}

fn encode_png(image: &DynamicImage, params: &PngParams) -> Result<Vec<u8>, BackendError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(BackendError::Encode {
            format: OutputFormat::Png,
            reason: "image is empty".to_string(),
        });
    }

    let compression = if params.optimize {
        CompressionType::Best
    } else {
        CompressionType::Default
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, PngFilter::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode {
            format: OutputFormat::Png,
            reason: e.to_string(),
        })?;

    Ok(buffer)
}

impl ImageBackend for RustBackend {
    type Image = Raster;

    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(bytes)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8]) -> Result<Decoded<Raster>, BackendError> {
        let reader = reader(bytes)?;
        let format = source_format(reader.format());

        let decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(format!("Unsupported image: {e}")))?;
        let header_mode = match format {
            SourceFormat::Png => png_header_mode(bytes),
            _ => None,
        };
        let mode = header_mode.unwrap_or_else(|| original_mode(decoder.original_color_type()));
        let pixels = DynamicImage::from_decoder(decoder)
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(Decoded {
            image: Raster::new(pixels, mode),
            format,
        })
    }

    fn dimensions(&self, image: &Raster) -> Dimensions {
        Dimensions {
            width: image.pixels.width(),
            height: image.pixels.height(),
        }
    }

    fn color_mode(&self, image: &Raster) -> ColorMode {
        image.mode
    }

    fn to_full_color(&self, image: &Raster) -> Option<Raster> {
        if !image.mode.needs_full_color() {
            return None;
        }
        let converted = if image.pixels.color().has_alpha() {
            Raster::new(DynamicImage::ImageRgba8(image.pixels.to_rgba8()), ColorMode::Rgba)
        } else {
            Raster::new(DynamicImage::ImageRgb8(image.pixels.to_rgb8()), ColorMode::Rgb)
        };
        Some(converted)
    }

    fn crop(&self, image: &Raster, x: u32, y: u32, width: u32, height: u32) -> Raster {
        Raster::new(image.pixels.crop_imm(x, y, width, height), image.mode)
    }

    fn resize(&self, image: &Raster, width: u32, height: u32) -> Raster {
        let resized = image
            .pixels
            .resize_exact(width, height, self.filter.to_image_filter());
        Raster::new(resized, image.mode)
    }

    fn encode(
        &self,
        image: &Raster,
        format: OutputFormat,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(&image.pixels, &params.jpeg),
            OutputFormat::Png => encode_png(&image.pixels, &params.png),
        }
    }
}
