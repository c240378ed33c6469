//! Rendition identity.
//!
//! A stored rendition is reusable only while its source is unchanged. The
//! fingerprint covers the two things that change what a pipeline produces
//! from an attachment without changing its specs: the file size and the
//! focal point. Callers key stored renditions by
//! `(fingerprint, filter spec string)`.

use crate::geometry::Rect;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 8;

/// Deterministic short hash of `file_size` and the focal point.
///
/// The focal point contributes `x`, `y`, `width` and `height`; a missing
/// focal point contributes the literal `None` for each field.
pub fn fingerprint(file_size: u64, focal_point: Option<&Rect>) -> String {
    let fields = match focal_point {
        Some(focal) => {
            [focal.left, focal.top, focal.width(), focal.height()].map(|v| v.to_string())
        }
        None => std::array::from_fn(|_| "None".to_string()),
    };
    let vary = format!("{file_size}-{}", fields.join("-"));

    let digest = Sha256::digest(vary.as_bytes());
    let mut hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex.truncate(FINGERPRINT_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focal() -> Rect {
        Rect::from_origin(10.0, 20.0, 30.0, 40.0)
    }

    #[test]
    fn fixed_length_lowercase_hex() {
        let key = fingerprint(1234, None);
        assert_eq!(key.len(), FINGERPRINT_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn stable_across_calls() {
        assert_eq!(fingerprint(1234, None), fingerprint(1234, None));
        assert_eq!(
            fingerprint(1234, Some(&focal())),
            fingerprint(1234, Some(&focal()))
        );
    }

    #[test]
    fn matches_sha256_of_vary_string() {
        let digest = Sha256::digest(b"1234-10-20-30-40");
        let expected: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
        assert_eq!(fingerprint(1234, Some(&focal())), expected);

        let digest = Sha256::digest(b"1234-None-None-None-None");
        let expected: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
        assert_eq!(fingerprint(1234, None), expected);
    }

    #[test]
    fn size_changes_fingerprint() {
        assert_ne!(fingerprint(1234, None), fingerprint(1235, None));
    }

    #[test]
    fn focal_point_presence_changes_fingerprint() {
        assert_ne!(fingerprint(1234, None), fingerprint(1234, Some(&focal())));
    }

    #[test]
    fn each_focal_coordinate_changes_fingerprint() {
        let base = fingerprint(1234, Some(&focal()));
        let variants = [
            Rect::from_origin(11.0, 20.0, 30.0, 40.0),
            Rect::from_origin(10.0, 21.0, 30.0, 40.0),
            Rect::from_origin(10.0, 20.0, 31.0, 40.0),
            Rect::from_origin(10.0, 20.0, 30.0, 41.0),
        ];
        for variant in &variants {
            assert_ne!(base, fingerprint(1234, Some(variant)), "{variant:?}");
        }
    }
}
