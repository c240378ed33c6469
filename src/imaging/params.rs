//! Parameter types for pixel work and encoding.
//!
//! These structs describe *how* the backend should resample and encode, not
//! *what* the filter pipeline wants. The pipeline decides geometry; the
//! backend receives these alongside it.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`Resample`]: Resampling filter used for every resize.
//! - [`JpegParams`]: Quality, progressive layout and Huffman optimization.
//! - [`PngParams`]: Whether to spend time on maximum compression.
//! - [`EncodeParams`]: Both encoder settings, so one value travels through the runner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Resampling filter, ordered from fastest to sharpest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resample {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    /// Closest to the classic "antialias" downscale.
    #[default]
    Lanczos3,
}

impl Resample {
    pub(crate) fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for Resample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("nearest"),
            Self::Triangle => f.write_str("triangle"),
            Self::CatmullRom => f.write_str("catmull-rom"),
            Self::Gaussian => f.write_str("gaussian"),
            Self::Lanczos3 => f.write_str("lanczos3"),
        }
    }
}

/// JPEG encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegParams {
    pub quality: Quality,
    pub progressive: bool,
    pub optimize_huffman: bool,
}

impl Default for JpegParams {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            progressive: true,
            optimize_huffman: true,
        }
    }
}

/// PNG encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PngParams {
    /// Best compression with adaptive row filtering.
    pub optimize: bool,
}

impl Default for PngParams {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Encoder settings for every supported output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    pub jpeg: JpegParams,
    pub png: PngParams,
}
