//! # Renditions
//!
//! Derived images ("renditions") from an uploaded source image, described by
//! short filter specs such as `fill-300x200-c50` or `format-png`.
//!
//! # Architecture: Parse → Run → Key
//!
//! ```text
//! 1. Parse   ["fill-300x200", "format-png"]  →  ImageFilter   (no pixels touched)
//! 2. Run     ImageFilter + source bytes      →  Rendered      (decode, operate, encode)
//! 3. Key     file size + focal point         →  fingerprint   (staleness check)
//! ```
//!
//! Parsing is separate from running so a bad spec list is rejected before a
//! single byte is decoded. Running is a pure function of the source bytes,
//! the focal point, the specs and the encoder settings: identical inputs give
//! identical bytes, and independent renditions can run on separate threads.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filter`] | Spec parser, operation set and pipeline runner |
//! | [`imaging`] | Backend trait, pure dimension math and the `image`-crate backend |
//! | [`geometry`] | Floating-point `Rect` used for crop boxes and focal points |
//! | [`identity`] | Rendition fingerprint from file size and focal point |
//! | [`attachment`] | Serializable file / image / rendition records with validation |
//! | [`config`] | `renditions.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## Backend Trait
//!
//! Every pixel operation goes through [`imaging::ImageBackend`]. Operations
//! compute geometry with pure functions in [`imaging::calculations`] and hand
//! the result to the backend, so unit tests assert exact crop boxes and resize
//! targets against a recording mock without decoding anything.
//!
//! ## No Upscaling
//!
//! `width`, `height`, `max` and `fill` only ever shrink. `min` and `scale`
//! are the two operations allowed to enlarge.
//!
//! ## Focal Points
//!
//! An image may carry a focal point: the region that must survive cropping.
//! `fill` keeps it in frame and `crop` with no arguments cuts to it. The
//! fingerprint covers it, so moving the focal point marks existing
//! renditions stale.

pub mod attachment;
pub mod config;
pub mod filter;
pub mod geometry;
pub mod identity;
pub mod imaging;

#[cfg(test)]
pub(crate) mod test_helpers;
