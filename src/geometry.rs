//! Rectangle math used by every cropping operation.
//!
//! [`Rect`] keeps sub-pixel precision (`f64` edges) until the very end of a
//! crop computation, where [`Rect::round`] snaps it to a [`PixelRect`]. The
//! repositioning helpers only ever translate; none of them resize.
//!
//! ```text
//!   (left, top) ┌──────────────┐
//!               │   centroid   │ height = bottom - top
//!               │      ×       │
//!               └──────────────┘ (right, bottom)
//!                width = right - left
//! ```

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with real-valued edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Build a rect from its edges.
    ///
    /// Degenerate input (right < left, bottom < top) is accepted; such a
    /// rect has negative extent and produces an empty crop downstream.
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rect of the given size centered on `(cx, cy)`.
    pub fn from_point(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Build a rect from an origin and a size.
    pub fn from_origin(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn centroid(&self) -> (f64, f64) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Translate by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Translate so that `self` contains `other`, moving as little as possible.
    ///
    /// Per axis: if `other` pokes out on the near side, shift toward it; else
    /// if it pokes out on the far side, shift the other way. When `other` is
    /// larger than `self` on an axis, the near side wins.
    pub fn move_to_cover(&self, other: &Rect) -> Self {
        let dx = if self.left > other.left {
            other.left - self.left
        } else if self.right < other.right {
            other.right - self.right
        } else {
            0.0
        };

        let dy = if self.top > other.top {
            other.top - self.top
        } else if self.bottom < other.bottom {
            other.bottom - self.bottom
        } else {
            0.0
        };

        self.translate(dx, dy)
    }

    /// Translate so that `self` lies within `bounds`.
    ///
    /// The near edges are fixed first, then the far edges, so a rect larger
    /// than `bounds` ends up aligned to the far edge.
    pub fn move_to_clamp(&self, bounds: &Rect) -> Self {
        let mut rect = *self;

        if rect.left < bounds.left {
            rect = rect.translate(bounds.left - rect.left, 0.0);
        }
        if rect.top < bounds.top {
            rect = rect.translate(0.0, bounds.top - rect.top);
        }
        if rect.right > bounds.right {
            rect = rect.translate(bounds.right - rect.right, 0.0);
        }
        if rect.bottom > bounds.bottom {
            rect = rect.translate(0.0, bounds.bottom - rect.bottom);
        }

        rect
    }

    /// Snap every edge to the nearest integer, ties to even.
    pub fn round(&self) -> PixelRect {
        PixelRect {
            left: self.left.round_ties_even() as i64,
            top: self.top.round_ties_even() as i64,
            right: self.right.round_ties_even() as i64,
            bottom: self.bottom.round_ties_even() as i64,
        }
    }
}

/// Integer-snapped rectangle, ready to hand to a backend crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl PixelRect {
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    /// Intersect with a `width × height` image and return `(x, y, w, h)`.
    ///
    /// Never fails: a rect lying outside the image, or a degenerate one,
    /// yields a zero-sized region.
    pub fn clip_to(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let clip = |lo: i64, hi: i64, max: u32| -> (u32, u32) {
            let max = i64::from(max);
            let lo = lo.clamp(0, max);
            let hi = hi.clamp(lo, max);
            // Both values are within 0..=u32::MAX here.
            (lo as u32, (hi - lo) as u32)
        };

        let (x, w) = clip(self.left, self.right, width);
        let (y, h) = clip(self.top, self.bottom, height);
        (x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derived_properties() {
        let rect = Rect::new(10.0, 20.0, 110.0, 70.0);
        assert_relative_eq!(rect.width(), 100.0);
        assert_relative_eq!(rect.height(), 50.0);
        assert_eq!(rect.centroid(), (60.0, 45.0));
    }

    #[test]
    fn from_point_centers_rect() {
        let rect = Rect::from_point(50.0, 40.0, 20.0, 10.0);
        assert_eq!(rect, Rect::new(40.0, 35.0, 60.0, 45.0));
        assert_eq!(rect.centroid(), (50.0, 40.0));
    }

    #[test]
    fn move_to_cover_shifts_minimally() {
        let crop = Rect::new(0.0, 0.0, 100.0, 100.0);
        let focal = Rect::new(120.0, 10.0, 150.0, 40.0);

        let moved = crop.move_to_cover(&focal);
        assert_eq!(moved, Rect::new(50.0, 0.0, 150.0, 100.0));
    }

    #[test]
    fn move_to_cover_moves_toward_near_side() {
        let crop = Rect::new(50.0, 50.0, 150.0, 150.0);
        let focal = Rect::new(10.0, 20.0, 30.0, 60.0);

        let moved = crop.move_to_cover(&focal);
        assert_eq!(moved, Rect::new(10.0, 20.0, 110.0, 120.0));
    }

    #[test]
    fn move_to_cover_noop_when_already_covering() {
        let crop = Rect::new(0.0, 0.0, 100.0, 100.0);
        let focal = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(crop.move_to_cover(&focal), crop);
    }

    #[test]
    fn move_to_clamp_pulls_inside_bounds() {
        let bounds = Rect::new(0.0, 0.0, 200.0, 100.0);

        let left_out = Rect::new(-30.0, 10.0, 70.0, 60.0);
        assert_eq!(
            left_out.move_to_clamp(&bounds),
            Rect::new(0.0, 10.0, 100.0, 60.0)
        );

        let bottom_right_out = Rect::new(150.0, 80.0, 250.0, 130.0);
        assert_eq!(
            bottom_right_out.move_to_clamp(&bounds),
            Rect::new(100.0, 50.0, 200.0, 100.0)
        );
    }

    #[test]
    fn move_to_clamp_never_resizes() {
        let bounds = Rect::new(0.0, 0.0, 50.0, 50.0);
        let big = Rect::new(-10.0, -10.0, 90.0, 90.0);

        let moved = big.move_to_clamp(&bounds);
        assert_relative_eq!(moved.width(), 100.0);
        assert_relative_eq!(moved.height(), 100.0);
        assert_relative_eq!(moved.right, 50.0);
    }

    #[test]
    fn round_ties_to_even() {
        let rect = Rect::new(0.5, 1.5, 2.5, 3.4);
        assert_eq!(
            rect.round(),
            PixelRect {
                left: 0,
                top: 2,
                right: 2,
                bottom: 3,
            }
        );
    }

    #[test]
    fn clip_to_image_bounds() {
        let rect = PixelRect {
            left: -5,
            top: 10,
            right: 50,
            bottom: 500,
        };
        assert_eq!(rect.clip_to(40, 100), (0, 10, 40, 90));
    }

    #[test]
    fn clip_degenerate_rect_is_empty() {
        let rect = PixelRect {
            left: 30,
            top: 30,
            right: 10,
            bottom: 10,
        };
        assert_eq!(rect.clip_to(100, 100), (30, 30, 0, 0));
    }
}
