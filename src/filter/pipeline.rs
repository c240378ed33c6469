//! The pipeline runner: decode → operations → encode.

use super::FilterError;
use super::operation::{Operation, Outcome};
use super::spec::parse_specs;
use crate::geometry::Rect;
use crate::imaging::{EncodeParams, ImageBackend, OutputFormat, SourceFormat};
use log::debug;
use serde::Serialize;

/// State threaded through one pipeline run.
///
/// The original format is fixed at decode time; `format-*` stages overwrite
/// the output format, so the last one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    original_format: SourceFormat,
    output_format: Option<OutputFormat>,
}

impl Environment {
    pub fn new(original_format: SourceFormat) -> Self {
        Self {
            original_format,
            output_format: None,
        }
    }

    pub fn original_format(&self) -> &SourceFormat {
        &self.original_format
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output_format
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = Some(format);
    }

    /// The format to encode in: the last `format-*` stage, else the source's.
    pub fn resolve_output_format(&self) -> Result<OutputFormat, FilterError> {
        self.output_format
            .or_else(|| self.original_format.output_format())
            .ok_or_else(|| {
                FilterError::UnsupportedOutputFormat(self.original_format.name().to_string())
            })
    }
}

/// An encoded rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl Rendered {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// A parsed, ready-to-run spec list.
///
/// Parsing happens in [`ImageFilter::parse`], so a bad spec is reported
/// before any image is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFilter {
    specs: Vec<String>,
    operations: Vec<Operation>,
}

impl ImageFilter {
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, FilterError> {
        Ok(Self {
            specs: specs.iter().map(|s| s.as_ref().to_string()).collect(),
            operations: parse_specs(specs)?,
        })
    }

    /// Parse a single string of specs separated by whitespace or `|`.
    pub fn parse_str(specs: &str) -> Result<Self, FilterError> {
        let specs: Vec<&str> = specs
            .split(|c: char| c == '|' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        Self::parse(&specs)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn specs(&self) -> &[String] {
        &self.specs
    }

    /// The spec list as one string, as callers key stored renditions by it.
    /// [`ImageFilter::parse_str`] reads it back.
    pub fn spec_string(&self) -> String {
        self.specs.join(" ")
    }

    /// Decode `source`, apply every operation in order and encode the result.
    pub fn run<B: ImageBackend>(
        &self,
        backend: &B,
        source: &[u8],
        focal_point: Option<&Rect>,
        params: &EncodeParams,
    ) -> Result<Rendered, FilterError> {
        let decoded = backend.decode(source).map_err(FilterError::DecodeFailure)?;
        let mut env = Environment::new(decoded.format);
        let mut image = decoded.image;

        for operation in &self.operations {
            match operation.apply(backend, &image, focal_point, &mut env) {
                Outcome::Unchanged => debug!("{operation}: unchanged"),
                Outcome::Replaced(next) => {
                    image = next;
                    let dims = backend.dimensions(&image);
                    debug!("{operation}: now {}x{}", dims.width, dims.height);
                }
            }
        }

        let format = env.resolve_output_format()?;
        let dims = backend.dimensions(&image);
        let bytes = backend
            .encode(&image, format, params)
            .map_err(FilterError::Encode)?;

        debug!(
            "encoded {}x{} {format} rendition ({} bytes, source was {})",
            dims.width,
            dims.height,
            bytes.len(),
            env.original_format().name()
        );

        Ok(Rendered {
            bytes,
            width: dims.width,
            height: dims.height,
            format,
        })
    }
}

/// Parse `specs` and render `source` in one call.
pub fn render<B: ImageBackend, S: AsRef<str>>(
    backend: &B,
    source: &[u8],
    focal_point: Option<&Rect>,
    specs: &[S],
    params: &EncodeParams,
) -> Result<Rendered, FilterError> {
    ImageFilter::parse(specs)?.run(backend, source, focal_point, params)
}
