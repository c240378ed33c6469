//! Image processing in pure Rust, with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify / decode** | `image::ImageReader` with format guessing |
//! | **Crop / resize** | `crop_imm`, `resize_exact` (Lanczos3 by default) |
//! | **Encode → JPEG** | `jpeg-encoder` (progressive, optimized Huffman) |
//! | **Encode → PNG** | `image::codecs::png` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and crop-box math (unit testable)
//! - **Parameters**: Data structures describing resampling and encoding
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{
    BackendError, ColorMode, Decoded, Dimensions, ImageBackend, OutputFormat, SourceFormat,
};
pub use params::{EncodeParams, JpegParams, PngParams, Quality, Resample};
pub use rust_backend::{Raster, RustBackend};
