//! Filter operations.
//!
//! Each [`Operation`] owns its parsed parameters and transforms one image.
//! Geometry comes from [`calculations`](crate::imaging::calculations); pixel
//! work goes through the [`ImageBackend`].

use super::pipeline::Environment;
use crate::geometry::Rect;
use crate::imaging::calculations::{
    Axis, Bound, bound_axis_dimensions, bound_box_dimensions, explicit_crop_box, fill_crop_box,
    scale_dimensions,
};
use crate::imaging::{ImageBackend, OutputFormat};
use log::warn;
use std::fmt;

/// What a `crop` stage cuts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropRegion {
    /// The source's focal point; a no-op when there is none.
    FocalPoint,
    /// `crop-LxTxWxH`.
    Explicit {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    },
}

/// One parsed pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `original`
    Original,
    /// `width-N` / `height-N`: shrink so `axis` is at most `size`.
    WidthHeight { axis: Axis, size: u32 },
    /// `min-WxH` / `max-WxH`
    MinMax { bound: Bound, width: u32, height: u32 },
    /// `fill-WxH[-cN]`; `closeness` is a fraction in `0.0..=1.0`.
    Fill {
        width: u32,
        height: u32,
        closeness: f64,
    },
    Crop(CropRegion),
    /// `scale-P`
    Scale { percent: f64 },
    /// `format-(jpeg|png)`
    Format(OutputFormat),
}

/// Result of applying an operation.
#[derive(Debug, PartialEq)]
pub enum Outcome<I> {
    /// The current image stays as it is.
    Unchanged,
    Replaced(I),
}

impl<I> Outcome<I> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Resize, widening palette and bilevel images first.
fn resize_full_color<B: ImageBackend>(
    backend: &B,
    image: &B::Image,
    width: u32,
    height: u32,
) -> B::Image {
    match backend.to_full_color(image) {
        Some(converted) => backend.resize(&converted, width, height),
        None => backend.resize(image, width, height),
    }
}

/// Round `rect`, clip it to the image and crop.
fn crop_to<B: ImageBackend>(backend: &B, image: &B::Image, rect: &Rect) -> B::Image {
    let dims = backend.dimensions(image);
    let (x, y, width, height) = rect.round().clip_to(dims.width, dims.height);
    if width == 0 || height == 0 {
        warn!(
            "crop box {rect:?} is empty on a {}x{} image",
            dims.width, dims.height
        );
    }
    backend.crop(image, x, y, width, height)
}

impl Operation {
    /// Run this stage against `image`.
    ///
    /// `focal_point` is the source attachment's focal point. Earlier stages
    /// do not rescale it.
    pub fn apply<B: ImageBackend>(
        &self,
        backend: &B,
        image: &B::Image,
        focal_point: Option<&Rect>,
        env: &mut Environment,
    ) -> Outcome<B::Image> {
        let dims = backend.dimensions(image);
        let size = (dims.width, dims.height);

        match *self {
            Self::Original => Outcome::Unchanged,

            Self::WidthHeight { axis, size: target } => {
                match bound_axis_dimensions(size, axis, target) {
                    Some((w, h)) => Outcome::Replaced(resize_full_color(backend, image, w, h)),
                    None => Outcome::Unchanged,
                }
            }

            Self::MinMax {
                bound,
                width,
                height,
            } => match bound_box_dimensions(size, bound, (width, height)) {
                Some((w, h)) => Outcome::Replaced(resize_full_color(backend, image, w, h)),
                None => Outcome::Unchanged,
            },

            Self::Fill {
                width,
                height,
                closeness,
            } => {
                let rect = fill_crop_box(size, (width, height), closeness, focal_point);
                let cropped = crop_to(backend, image, &rect);

                // Same scale on both axes; never upscale past the crop.
                let cropped_width = backend.dimensions(&cropped).width;
                let scale = f64::from(width) / f64::from(cropped_width);
                if scale < 1.0 {
                    Outcome::Replaced(resize_full_color(backend, &cropped, width, height))
                } else {
                    Outcome::Replaced(cropped)
                }
            }

            Self::Crop(CropRegion::Explicit {
                left,
                top,
                width,
                height,
            }) => {
                let rect = explicit_crop_box(size, left, top, width, height);
                Outcome::Replaced(crop_to(backend, image, &rect))
            }

            Self::Crop(CropRegion::FocalPoint) => match focal_point {
                Some(focal) => Outcome::Replaced(crop_to(backend, image, focal)),
                None => Outcome::Unchanged,
            },

            Self::Scale { percent } => {
                let (w, h) = scale_dimensions(size, percent);
                Outcome::Replaced(backend.resize(image, w, h))
            }

            Self::Format(format) => {
                env.set_output_format(format);
                Outcome::Unchanged
            }
        }
    }
}

/// Canonical spec text, e.g. `fill-300x200-c50`.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::WidthHeight { axis, size } => match axis {
                Axis::Width => write!(f, "width-{size}"),
                Axis::Height => write!(f, "height-{size}"),
            },
            Self::MinMax {
                bound,
                width,
                height,
            } => match bound {
                Bound::Min => write!(f, "min-{width}x{height}"),
                Bound::Max => write!(f, "max-{width}x{height}"),
            },
            Self::Fill {
                width,
                height,
                closeness,
            } => {
                write!(f, "fill-{width}x{height}")?;
                if *closeness > 0.0 {
                    write!(f, "-c{}", (closeness * 100.0).round())?;
                }
                Ok(())
            }
            Self::Crop(CropRegion::FocalPoint) => f.write_str("crop"),
            Self::Crop(CropRegion::Explicit {
                left,
                top,
                width,
                height,
            }) => write!(f, "crop-{left}x{top}x{width}x{height}"),
            Self::Scale { percent } => write!(f, "scale-{percent}"),
            Self::Format(format) => write!(f, "format-{format}"),
        }
    }
}
