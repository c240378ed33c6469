//! The rendition filter engine.
//!
//! A rendition is described by an ordered list of filter specs, one per
//! stage, e.g. `["fill-300x200-c50", "format-png"]`. Each spec is a keyword
//! followed by dash-separated arguments:
//!
//! ```text
//! original
//! width-<int>            height-<int>
//! min-<int>x<int>        max-<int>x<int>
//! fill-<int>x<int>[-c<0..100>]
//! crop-<left>x<top>x<width>x<height>
//! crop                   (crop to the focal point, if any)
//! scale-<float>          (percent)
//! format-(jpeg|png)
//! ```
//!
//! Parsing ([`spec`]) happens up front and never touches pixels, so a bad
//! spec list fails before anything is decoded. The runner ([`pipeline`])
//! then decodes the source, folds the [`Operation`]s over it and encodes the
//! result.
//!
//! The engine holds no shared mutable state: every call owns its
//! [`Environment`] and image, so independent renditions can run on separate
//! threads against the same backend.

pub mod operation;
pub mod pipeline;
pub mod spec;

pub use operation::{CropRegion, Operation, Outcome};
pub use pipeline::{Environment, ImageFilter, Rendered, render};
pub use spec::{Keyword, parse_spec, parse_specs};

use crate::imaging::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Unrecognised operation: {0}")]
    UnknownOperation(String),
    #[error("Invalid filter spec '{spec}': {reason}")]
    InvalidFilterSpec { spec: String, reason: String },
    #[error("Source image could not be decoded: {0}")]
    DecodeFailure(BackendError),
    /// Only reachable when the source is in a format we cannot write and no
    /// `format-*` stage picked one.
    #[error("No encoder for output format '{0}'")]
    UnsupportedOutputFormat(String),
    #[error("Rendition could not be encoded: {0}")]
    Encode(BackendError),
}
