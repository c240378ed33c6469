//! Attachment records.
//!
//! Plain serializable records describing an uploaded file, an image with an
//! optional focal point, and a rendition generated from that image. Storage
//! is the caller's business: these types carry metadata and validation only,
//! and [`RenditionAttachment::create`] hands back encoded bytes for the
//! caller to persist.
//!
//! ```text
//! FileAttachment        name, content type, extension, size
//!   └─ ImageAttachment  + width, height, focal point, cache key
//!        └─ RenditionAttachment  + cache key of the source, filter spec
//! ```

use crate::filter::{FilterError, ImageFilter};
use crate::geometry::Rect;
use crate::identity::fingerprint;
use crate::imaging::{BackendError, EncodeParams, ImageBackend};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 2 MiB.
pub const DEFAULT_MAX_LENGTH: u64 = 2 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("{}", content_type_message(.content_type, .allowed))]
    ContentType {
        content_type: Option<String>,
        allowed: Vec<String>,
    },
    #[error("File size {file_size} exceeds the maximum allowed length of {max_length} bytes")]
    TooLarge { file_size: u64, max_length: u64 },
    #[error("Image could not be identified: {0}")]
    Identify(#[from] BackendError),
    #[error("Invalid focal point: {0}")]
    FocalPoint(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

fn content_type_message(content_type: &Option<String>, allowed: &[String]) -> String {
    let mut message = match content_type {
        Some(content_type) => format!("Content type is not supported {content_type}."),
        None => "Content type is not provided.".to_string(),
    };
    if !allowed.is_empty() {
        message.push_str(&format!(" Valid options are: {}", allowed.join(", ")));
    }
    message
}

/// Which files are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub allowed_content_types: Vec<String>,
    pub max_length: u64,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            allowed_content_types: vec!["image/jpeg".into(), "image/png".into()],
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl AttachmentPolicy {
    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_content_types.iter().any(|t| t == content_type)
    }
}

/// File extension for a MIME type, with the leading dot.
///
/// `image/jpeg` maps to `.jpeg`, not `.jpe` or `.jpg`.
pub fn guess_extension(content_type: &str) -> Option<&'static str> {
    let extension = match content_type {
        "image/jpeg" => ".jpeg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        "image/svg+xml" => ".svg",
        _ => return None,
    };
    Some(extension)
}

/// A validated upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub original_filename: String,
    pub content_type: String,
    pub extension: Option<String>,
    pub file_size: u64,
}

impl FileAttachment {
    /// Build a record for `file_size` bytes of `content_type`, checking both
    /// against `policy`.
    pub fn new(
        original_filename: &str,
        content_type: Option<&str>,
        file_size: u64,
        policy: &AttachmentPolicy,
    ) -> Result<Self, AttachmentError> {
        let content_type = match content_type {
            Some(content_type) if policy.allows(content_type) => content_type,
            other => {
                return Err(AttachmentError::ContentType {
                    content_type: other.map(str::to_string),
                    allowed: policy.allowed_content_types.clone(),
                });
            }
        };
        if file_size > policy.max_length {
            return Err(AttachmentError::TooLarge {
                file_size,
                max_length: policy.max_length,
            });
        }

        Ok(Self {
            original_filename: original_filename.to_string(),
            content_type: content_type.to_string(),
            extension: guess_extension(content_type).map(str::to_string),
            file_size,
        })
    }
}

/// Integer focal point as stored on an image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FocalPoint {
    pub fn to_rect(self) -> Rect {
        Rect::from_origin(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }
}

/// An uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    #[serde(flatten)]
    pub file: FileAttachment,
    pub width: u32,
    pub height: u32,
    pub focal_point: Option<FocalPoint>,
}

impl ImageAttachment {
    /// Validate `bytes` against `policy` and read the image size.
    pub fn from_bytes<B: ImageBackend>(
        backend: &B,
        original_filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
        policy: &AttachmentPolicy,
    ) -> Result<Self, AttachmentError> {
        let file =
            FileAttachment::new(original_filename, content_type, bytes.len() as u64, policy)?;
        let dims = backend.identify(bytes)?;
        Ok(Self {
            file,
            width: dims.width,
            height: dims.height,
            focal_point: None,
        })
    }

    /// Set the focal point. It must be non-empty and lie inside the image.
    pub fn with_focal_point(
        mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Self, AttachmentError> {
        if width == 0 || height == 0 {
            return Err(AttachmentError::FocalPoint(format!(
                "{width}x{height} has no area"
            )));
        }
        let fits = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(x, width, self.width) || !fits(y, height, self.height) {
            return Err(AttachmentError::FocalPoint(format!(
                "{x},{y} {width}x{height} lies outside the {}x{} image",
                self.width, self.height
            )));
        }
        self.focal_point = Some(FocalPoint {
            x,
            y,
            width,
            height,
        });
        Ok(self)
    }

    pub fn focal_point(&self) -> Option<Rect> {
        self.focal_point.map(FocalPoint::to_rect)
    }

    /// Fingerprint of the size and focal point; see [`fingerprint`].
    pub fn cache_key(&self) -> String {
        fingerprint(self.file.file_size, self.focal_point().as_ref())
    }
}

/// A rendition generated from an [`ImageAttachment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionAttachment {
    #[serde(flatten)]
    pub file: FileAttachment,
    pub width: u32,
    pub height: u32,
    /// The source's cache key at creation time.
    pub cache_key: String,
    pub filter_spec: String,
}

impl RenditionAttachment {
    /// Run `filter` over `source_bytes` with the source's focal point.
    ///
    /// Returns the record and the encoded rendition.
    pub fn create<B: ImageBackend>(
        backend: &B,
        source: &ImageAttachment,
        source_bytes: &[u8],
        filter: &ImageFilter,
        params: &EncodeParams,
    ) -> Result<(Self, Vec<u8>), AttachmentError> {
        let focal_point = source.focal_point();
        let rendered = filter.run(backend, source_bytes, focal_point.as_ref(), params)?;

        let content_type = rendered.content_type();
        let record = Self {
            file: FileAttachment {
                original_filename: source.file.original_filename.clone(),
                content_type: content_type.to_string(),
                extension: guess_extension(content_type).map(str::to_string),
                file_size: rendered.bytes.len() as u64,
            },
            width: rendered.width,
            height: rendered.height,
            cache_key: source.cache_key(),
            filter_spec: filter.spec_string(),
        };
        Ok((record, rendered.bytes))
    }

    /// Whether `source` has changed since this rendition was made.
    pub fn is_stale(&self, source: &ImageAttachment) -> bool {
        self.cache_key != source.cache_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::SourceFormat;
    use crate::imaging::backend::tests::{MockBackend, MockImage};

    fn policy() -> AttachmentPolicy {
        AttachmentPolicy::default()
    }

    fn image(width: u32, height: u32) -> ImageAttachment {
        let backend = MockBackend::with_source(MockImage::rgb(width, height), SourceFormat::Jpeg);
        ImageAttachment::from_bytes(&backend, "photo.jpg", Some("image/jpeg"), &[0; 64], &policy())
            .unwrap()
    }

    // =========================================================================
    // FileAttachment
    // =========================================================================

    #[test]
    fn file_attachment_accepts_allowed_type() {
        let file = FileAttachment::new("a.png", Some("image/png"), 10, &policy()).unwrap();
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.extension.as_deref(), Some(".png"));
        assert_eq!(file.file_size, 10);
    }

    #[test]
    fn unsupported_content_type_lists_options() {
        let err = FileAttachment::new("a.gif", Some("image/gif"), 10, &policy()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Content type is not supported image/gif. Valid options are: image/jpeg, image/png"
        );
    }

    #[test]
    fn missing_content_type() {
        let err = FileAttachment::new("a", None, 10, &policy()).unwrap_err();
        assert!(err.to_string().starts_with("Content type is not provided."));
    }

    #[test]
    fn too_large() {
        let err = FileAttachment::new("a.png", Some("image/png"), DEFAULT_MAX_LENGTH + 1, &policy())
            .unwrap_err();
        assert!(matches!(
            err,
            AttachmentError::TooLarge { max_length, .. } if max_length == DEFAULT_MAX_LENGTH
        ));
    }

    #[test]
    fn exactly_max_length_is_allowed() {
        assert!(
            FileAttachment::new("a.png", Some("image/png"), DEFAULT_MAX_LENGTH, &policy()).is_ok()
        );
    }

    #[test]
    fn jpeg_extension_override() {
        assert_eq!(guess_extension("image/jpeg"), Some(".jpeg"));
        assert_eq!(guess_extension("text/plain"), None);
    }

    // =========================================================================
    // ImageAttachment
    // =========================================================================

    #[test]
    fn image_reads_dimensions() {
        let img = image(640, 480);
        assert_eq!((img.width, img.height), (640, 480));
        assert_eq!(img.file.file_size, 64);
        assert!(img.focal_point().is_none());
    }

    #[test]
    fn image_identify_failure() {
        let backend = MockBackend::undecodable();
        let err = ImageAttachment::from_bytes(&backend, "x.png", Some("image/png"), b"x", &policy())
            .unwrap_err();
        assert!(matches!(err, AttachmentError::Identify(_)));
    }

    #[test]
    fn focal_point_becomes_rect() {
        let img = image(640, 480).with_focal_point(10, 20, 30, 40).unwrap();
        let rect = img.focal_point().unwrap();
        assert_eq!((rect.left, rect.top, rect.right, rect.bottom), (10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn focal_point_must_have_area() {
        assert!(image(640, 480).with_focal_point(10, 20, 0, 40).is_err());
    }

    #[test]
    fn focal_point_must_fit() {
        assert!(image(640, 480).with_focal_point(600, 0, 41, 10).is_err());
        assert!(image(640, 480).with_focal_point(600, 0, 40, 480).is_ok());
    }

    #[test]
    fn cache_key_follows_focal_point() {
        let plain = image(640, 480);
        let focused = plain.clone().with_focal_point(1, 2, 3, 4).unwrap();
        assert_eq!(plain.cache_key(), fingerprint(64, None));
        assert_ne!(plain.cache_key(), focused.cache_key());
    }

    #[test]
    fn image_record_serializes_flat() {
        let json = serde_json::to_value(image(4, 3)).unwrap();
        assert_eq!(json["original_filename"], "photo.jpg");
        assert_eq!(json["width"], 4);
        assert!(json["focal_point"].is_null());
    }

    // =========================================================================
    // RenditionAttachment
    // =========================================================================

    #[test]
    fn rendition_records_output() {
        let source = image(400, 200);
        let backend = MockBackend::with_source(MockImage::rgb(400, 200), SourceFormat::Jpeg);
        let filter = ImageFilter::parse(&["fill-100x100", "format-png"]).unwrap();

        let (record, bytes) = RenditionAttachment::create(
            &backend,
            &source,
            &[0; 64],
            &filter,
            &EncodeParams::default(),
        )
        .unwrap();

        assert_eq!(bytes, b"png:100x100");
        assert_eq!((record.width, record.height), (100, 100));
        assert_eq!(record.file.content_type, "image/png");
        assert_eq!(record.file.extension.as_deref(), Some(".png"));
        assert_eq!(record.file.file_size, bytes.len() as u64);
        assert_eq!(record.cache_key, source.cache_key());
        assert_eq!(record.filter_spec, "fill-100x100 format-png");
        assert!(!record.is_stale(&source));
    }

    #[test]
    fn rendition_uses_source_focal_point() {
        let source = image(400, 200).with_focal_point(0, 0, 50, 50).unwrap();
        let backend = MockBackend::with_source(MockImage::rgb(400, 200), SourceFormat::Jpeg);
        let filter = ImageFilter::parse(&["crop"]).unwrap();

        let (record, _) = RenditionAttachment::create(
            &backend,
            &source,
            &[0; 64],
            &filter,
            &EncodeParams::default(),
        )
        .unwrap();

        assert_eq!(backend.crops(), vec![(0, 0, 50, 50)]);
        assert_eq!((record.width, record.height), (50, 50));
    }

    #[test]
    fn rendition_goes_stale_when_focal_point_moves() {
        let source = image(400, 200);
        let backend = MockBackend::with_source(MockImage::rgb(400, 200), SourceFormat::Jpeg);
        let filter = ImageFilter::parse(&["original"]).unwrap();
        let (record, _) = RenditionAttachment::create(
            &backend,
            &source,
            &[0; 64],
            &filter,
            &EncodeParams::default(),
        )
        .unwrap();

        let moved = source.with_focal_point(5, 5, 10, 10).unwrap();
        assert!(record.is_stale(&moved));
    }

    #[test]
    fn rendition_filter_errors_propagate() {
        let source = image(400, 200);
        let backend = MockBackend::undecodable();
        let filter = ImageFilter::parse(&["original"]).unwrap();
        let err =
            RenditionAttachment::create(&backend, &source, b"", &filter, &EncodeParams::default())
                .unwrap_err();
        assert!(matches!(err, AttachmentError::Filter(FilterError::DecodeFailure(_))));
    }
}
