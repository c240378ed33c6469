//! Pure calculation functions for rendition geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Operations call them to decide *what* to crop or resize, then hand the
//! result to the backend.

use crate::geometry::Rect;

/// Axis constrained by a `width-N` / `height-N` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

/// Direction of a `min-WxH` / `max-WxH` bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Never smaller than the box on the limiting axis.
    Min,
    /// Never larger than the box on either axis.
    Max,
}

/// Convert a computed length to whole pixels, truncating.
///
/// Never returns zero: encoders reject empty images.
fn pixels(length: f64) -> u32 {
    (length as u32).max(1)
}

/// Resize dimensions for a single-axis bound.
///
/// Returns `None` when the image already fits on `axis`. Otherwise the bound
/// axis lands exactly on `target` and the other axis is scaled and rounded.
///
/// ```
/// # use renditions::imaging::calculations::{Axis, bound_axis_dimensions};
/// assert_eq!(bound_axis_dimensions((800, 600), Axis::Width, 400), Some((400, 300)));
/// assert_eq!(bound_axis_dimensions((800, 600), Axis::Height, 600), None);
/// ```
pub fn bound_axis_dimensions(source: (u32, u32), axis: Axis, target: u32) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return None;
    }

    match axis {
        Axis::Width => {
            if src_w <= target {
                return None;
            }
            let scale = f64::from(target) / f64::from(src_w);
            Some((target, pixels((f64::from(src_h) * scale).round())))
        }
        Axis::Height => {
            if src_h <= target {
                return None;
            }
            let scale = f64::from(target) / f64::from(src_h);
            Some((pixels((f64::from(src_w) * scale).round()), target))
        }
    }
}

/// Resize dimensions for a two-axis bound.
///
/// - [`Bound::Min`]: no-op when both axes already reach the box; otherwise
///   scale by the *larger* per-axis factor so neither axis undershoots.
/// - [`Bound::Max`]: no-op when both axes already fit; otherwise scale by the
///   *smaller* factor so neither axis overshoots.
///
/// The driving axis lands exactly on its bound; the other is truncated.
/// An empty source has no aspect ratio to keep and is left alone.
pub fn bound_box_dimensions(
    source: (u32, u32),
    bound: Bound,
    target: (u32, u32),
) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    if src_w == 0 || src_h == 0 {
        return None;
    }

    let horz_scale = f64::from(tgt_w) / f64::from(src_w);
    let vert_scale = f64::from(tgt_h) / f64::from(src_h);

    let width_drives = match bound {
        Bound::Min => {
            if src_w >= tgt_w && src_h >= tgt_h {
                return None;
            }
            horz_scale > vert_scale
        }
        Bound::Max => {
            if src_w <= tgt_w && src_h <= tgt_h {
                return None;
            }
            horz_scale < vert_scale
        }
    };

    if width_drives {
        Some((tgt_w, pixels(f64::from(src_h) * horz_scale)))
    } else {
        Some((pixels(f64::from(src_w) * vert_scale), tgt_h))
    }
}

/// Dimensions after scaling both axes by `percent`, rounded down.
pub fn scale_dimensions(source: (u32, u32), percent: f64) -> (u32, u32) {
    let scale = percent / 100.0;
    (
        pixels((f64::from(source.0) * scale).floor()),
        pixels((f64::from(source.1) * scale).floor()),
    )
}

/// Crop box for a `fill` operation, before rounding.
///
/// The box has the target's aspect ratio. Its size is interpolated between
/// the largest box that fits the image (`closeness = 0`) and the smallest
/// box that still holds the focal point (`closeness = 1`), with closeness
/// capped so the box never gets smaller than the target (no upscaling).
///
/// The box is positioned so the focal centroid sits at the same relative
/// position inside the box as it does inside the image, then moved to cover
/// the whole focal point and clamped to the image.
pub fn fill_crop_box(
    source: (u32, u32),
    target: (u32, u32),
    closeness: f64,
    focal_point: Option<&Rect>,
) -> Rect {
    let image_w = f64::from(source.0);
    let image_h = f64::from(source.1);
    if source.0 == 0 || source.1 == 0 {
        return Rect::new(0.0, 0.0, image_w, image_h);
    }

    let target_w = f64::from(target.0);
    let target_h = f64::from(target.1);
    let aspect = target_w / target_h;

    let crop_max_scale = image_w.min(image_h * aspect);
    let crop_max_w = crop_max_scale;
    let crop_max_h = crop_max_scale / aspect;

    let mut crop_w = crop_max_w;
    let mut crop_h = crop_max_h;

    let (fp_x, fp_y) = match focal_point {
        Some(focal) => {
            let crop_min_scale = focal.width().max(focal.height() * aspect);
            let crop_min_w = crop_min_scale;
            let crop_min_h = crop_min_scale / aspect;

            // A focal point as large as the image leaves nothing to zoom into.
            if crop_min_scale < crop_max_scale {
                let max_closeness = (1.0 - (target_w - crop_min_w) / (crop_max_w - crop_min_w))
                    .max(1.0 - (target_h - crop_min_h) / (crop_max_h - crop_min_h));
                let closeness = closeness.min(max_closeness);

                if (0.0..=1.0).contains(&closeness) {
                    crop_w = crop_max_w + (crop_min_w - crop_max_w) * closeness;
                    crop_h = crop_max_h + (crop_min_h - crop_max_h) * closeness;
                }
            }

            focal.centroid()
        }
        None => (image_w / 2.0, image_h / 2.0),
    };

    let fp_u = fp_x / image_w;
    let fp_v = fp_y / image_h;

    let crop_x = fp_x - (fp_u - 0.5) * crop_w;
    let crop_y = fp_y - (fp_v - 0.5) * crop_h;

    let mut rect = Rect::from_point(crop_x, crop_y, crop_w, crop_h);
    if let Some(focal) = focal_point {
        rect = rect.move_to_cover(focal);
    }
    rect.move_to_clamp(&Rect::new(0.0, 0.0, image_w, image_h))
}

/// Crop box for an explicit `crop-LxTxWxH` operation, before rounding.
///
/// The box is centered on `(left + width/2, top + height/2)`, with the
/// center kept at least one pixel inside the image. Each axis is shrunk to
/// `min(requested, 2 × space before center, 2 × space after center)`, so a
/// box that would spill past the image silently gets smaller but never
/// empty on a non-empty image.
pub fn explicit_crop_box(
    source: (u32, u32),
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> Rect {
    let (image_w, image_h) = source;

    let clamp_axis = |offset: u32, length: u32, image_len: u32| -> (f64, f64) {
        let image_len = f64::from(image_len);
        let requested = f64::from(length);
        let margin = (image_len / 2.0).min(1.0);
        let center = (f64::from(offset) + requested / 2.0).clamp(margin, image_len - margin);
        let remaining_after = image_len - center;
        let max_length = requested
            .min(center * 2.0)
            .min(remaining_after * 2.0)
            .max(0.0);
        (center, max_length)
    };

    let (center_x, crop_w) = clamp_axis(left, width, image_w);
    let (center_y, crop_h) = clamp_axis(top, height, image_h);

    Rect::from_point(center_x, center_y, crop_w, crop_h)
}
