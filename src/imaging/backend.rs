//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the capability the filter pipeline needs
//! from a codec library: identify, decode, crop, resize, color conversion
//! and encode. Everything operates on in-memory buffers; reading and writing
//! files belongs to the caller.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! recording `MockBackend` in this module so operation geometry can be
//! asserted without touching pixels.

use super::params::EncodeParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode {format}: {reason}")]
    Encode {
        format: OutputFormat,
        reason: String,
    },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Pixel layout of a decoded image, as far as resampling quality cares.
///
/// Only bilevel and palette images need widening before a resize; every
/// other mode is resampled as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// One bit per pixel.
    Bilevel,
    /// Palette-based.
    Indexed,
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
    Other,
}

impl ColorMode {
    pub fn needs_full_color(self) -> bool {
        matches!(self, Self::Bilevel | Self::Indexed)
    }
}

/// Encodings a rendition can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Parse a `format-<token>` argument. Case-insensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("jpeg") {
            Some(Self::Jpeg)
        } else if token.eq_ignore_ascii_case("png") {
            Some(Self::Png)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container format a source buffer was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    /// Readable but not writable, e.g. `"webp"`.
    Other(String),
}

impl SourceFormat {
    /// The output format that keeps this source's encoding, if we can write it.
    pub fn output_format(&self) -> Option<OutputFormat> {
        match self {
            Self::Jpeg => Some(OutputFormat::Jpeg),
            Self::Png => Some(OutputFormat::Png),
            Self::Other(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Other(name) => name,
        }
    }
}

/// A decoded source image together with the format it came from.
#[derive(Debug)]
pub struct Decoded<I> {
    pub image: I,
    pub format: SourceFormat,
}

/// Trait for image processing backends.
///
/// Pixel operations are infallible: geometry is computed and clipped by the
/// caller, so a backend only fails at the decode and encode boundaries.
pub trait ImageBackend: Sync {
    /// In-memory image representation.
    type Image;

    /// Read dimensions without a full decode where the format allows it.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode a whole buffer.
    fn decode(&self, bytes: &[u8]) -> Result<Decoded<Self::Image>, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    fn color_mode(&self, image: &Self::Image) -> ColorMode;

    /// Widen bilevel and palette images to RGB (or RGBA when the source has
    /// transparency). Returns `None` when no conversion is needed.
    fn to_full_color(&self, image: &Self::Image) -> Option<Self::Image>;

    /// Copy out the region at `(x, y)` of size `width × height`.
    ///
    /// The region is already clipped to the image bounds.
    fn crop(&self, image: &Self::Image, x: u32, y: u32, width: u32, height: u32) -> Self::Image;

    /// Resample to exactly `width × height`.
    fn resize(&self, image: &Self::Image, width: u32, height: u32) -> Self::Image;

    /// Encode into `format`. JPEG output drops any alpha channel.
    fn encode(
        &self,
        image: &Self::Image,
        format: OutputFormat,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError>;
}
