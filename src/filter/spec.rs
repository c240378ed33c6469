//! Filter spec parsing and the keyword registry.
//!
//! The registry is closed: [`Keyword::lookup`] is a plain `match`, and each
//! keyword knows how to build its [`Operation`] from the remaining
//! dash-separated arguments.

use super::FilterError;
use super::operation::{CropRegion, Operation};
use crate::imaging::OutputFormat;
use crate::imaging::calculations::{Axis, Bound};
use log::debug;
use std::fmt;

/// Every operation keyword a spec may start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Original,
    Width,
    Height,
    Min,
    Max,
    Fill,
    Crop,
    Scale,
    Format,
}

impl Keyword {
    pub const ALL: [Keyword; 9] = [
        Keyword::Original,
        Keyword::Width,
        Keyword::Height,
        Keyword::Min,
        Keyword::Max,
        Keyword::Fill,
        Keyword::Crop,
        Keyword::Scale,
        Keyword::Format,
    ];

    pub fn lookup(word: &str) -> Option<Self> {
        match word {
            "original" => Some(Self::Original),
            "width" => Some(Self::Width),
            "height" => Some(Self::Height),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "fill" => Some(Self::Fill),
            "crop" => Some(Self::Crop),
            "scale" => Some(Self::Scale),
            "format" => Some(Self::Format),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Width => "width",
            Self::Height => "height",
            Self::Min => "min",
            Self::Max => "max",
            Self::Fill => "fill",
            Self::Crop => "crop",
            Self::Scale => "scale",
            Self::Format => "format",
        }
    }

    /// Build the operation for this keyword. Errors are bare reasons; the
    /// caller attaches the spec.
    fn construct(self, args: &[&str]) -> Result<Operation, String> {
        match self {
            Self::Original => {
                expect_args(self, args, 0, 0)?;
                Ok(Operation::Original)
            }
            Self::Width | Self::Height => {
                expect_args(self, args, 1, 1)?;
                let axis = if self == Self::Width {
                    Axis::Width
                } else {
                    Axis::Height
                };
                Ok(Operation::WidthHeight {
                    axis,
                    size: parse_length(args[0])?,
                })
            }
            Self::Min | Self::Max => {
                expect_args(self, args, 1, 1)?;
                let bound = if self == Self::Min {
                    Bound::Min
                } else {
                    Bound::Max
                };
                let (width, height) = parse_size(args[0])?;
                Ok(Operation::MinMax {
                    bound,
                    width,
                    height,
                })
            }
            Self::Fill => {
                if args.is_empty() {
                    return Err("fill expects a size like 300x200".to_string());
                }
                let (width, height) = parse_size(args[0])?;
                let mut closeness = 0.0;
                for extra in &args[1..] {
                    closeness = parse_closeness(extra)?;
                }
                Ok(Operation::Fill {
                    width,
                    height,
                    closeness,
                })
            }
            Self::Crop => {
                expect_args(self, args, 0, 1)?;
                match args.first() {
                    None | Some(&"") => Ok(Operation::Crop(CropRegion::FocalPoint)),
                    Some(region) => parse_region(region).map(Operation::Crop),
                }
            }
            Self::Scale => {
                expect_args(self, args, 1, 1)?;
                let percent: f64 = args[0]
                    .parse()
                    .map_err(|_| format!("'{}' is not a number", args[0]))?;
                if !percent.is_finite() || percent <= 0.0 {
                    return Err(format!("scale must be a positive percentage, got {percent}"));
                }
                Ok(Operation::Scale { percent })
            }
            Self::Format => {
                expect_args(self, args, 1, 1)?;
                OutputFormat::from_token(args[0])
                    .map(Operation::Format)
                    .ok_or_else(|| "Format must be either 'jpeg' or 'png'".to_string())
            }
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn expect_args(keyword: Keyword, args: &[&str], min: usize, max: usize) -> Result<(), String> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    Err(match (min, max) {
        (0, 0) => format!("{keyword} takes no arguments, got {}", args.len()),
        (lo, hi) if lo == hi => format!("{keyword} expects {lo} argument(s), got {}", args.len()),
        (lo, hi) => format!(
            "{keyword} expects {lo} to {hi} arguments, got {}",
            args.len()
        ),
    })
}

fn parse_int(token: &str) -> Result<u32, String> {
    token
        .parse::<u32>()
        .map_err(|_| format!("'{token}' is not a whole number"))
}

/// A strictly positive pixel length.
fn parse_length(token: &str) -> Result<u32, String> {
    match parse_int(token)? {
        0 => Err("sizes must be greater than zero".to_string()),
        n => Ok(n),
    }
}

/// `WxH`
fn parse_size(token: &str) -> Result<(u32, u32), String> {
    match token.split('x').collect::<Vec<_>>().as_slice() {
        [width, height] => Ok((parse_length(width)?, parse_length(height)?)),
        _ => Err(format!("'{token}' is not a size like 300x200")),
    }
}

/// `c<0..100>`, as a fraction.
fn parse_closeness(token: &str) -> Result<f64, String> {
    let Some(value) = token.strip_prefix('c') else {
        return Err(format!("Unrecognised filter spec part: {token}"));
    };
    let percent = parse_int(value)?;
    if percent > 100 {
        return Err(format!("crop closeness must be 0-100, got {percent}"));
    }
    Ok(f64::from(percent) / 100.0)
}

/// `LxTxWxH`
fn parse_region(token: &str) -> Result<CropRegion, String> {
    match token.split('x').collect::<Vec<_>>().as_slice() {
        [left, top, width, height] => Ok(CropRegion::Explicit {
            left: parse_int(left)?,
            top: parse_int(top)?,
            width: parse_length(width)?,
            height: parse_length(height)?,
        }),
        _ => Err(format!("'{token}' is not a region like 10x20x300x200")),
    }
}

/// Parse one spec such as `fill-300x200-c50`.
pub fn parse_spec(spec: &str) -> Result<Operation, FilterError> {
    let mut parts = spec.split('-');
    // `split` always yields at least one item.
    let word = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let keyword =
        Keyword::lookup(word).ok_or_else(|| FilterError::UnknownOperation(word.to_string()))?;

    let operation = keyword
        .construct(&args)
        .map_err(|reason| FilterError::InvalidFilterSpec {
            spec: spec.to_string(),
            reason,
        })?;

    debug!("parsed filter spec {spec:?} as {operation:?}");
    Ok(operation)
}

/// Parse an ordered spec list, failing on the first bad entry.
pub fn parse_specs<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Operation>, FilterError> {
    specs.iter().map(|spec| parse_spec(spec.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_reason(spec: &str) -> String {
        match parse_spec(spec) {
            Err(FilterError::InvalidFilterSpec { spec: s, reason }) => {
                assert_eq!(s, spec);
                reason
            }
            other => panic!("expected InvalidFilterSpec for {spec:?}, got {other:?}"),
        }
    }

    #[test]
    fn every_keyword_round_trips_through_lookup() {
        for keyword in Keyword::ALL {
            assert_eq!(Keyword::lookup(keyword.as_str()), Some(keyword));
        }
        assert_eq!(Keyword::lookup("blur"), None);
    }

    #[test]
    fn unknown_keyword_names_it() {
        match parse_spec("blur-5") {
            Err(FilterError::UnknownOperation(word)) => assert_eq!(word, "blur"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert!(matches!(
            parse_spec("Width-100"),
            Err(FilterError::UnknownOperation(_))
        ));
    }

    #[test]
    fn parses_original() {
        assert_eq!(parse_spec("original").unwrap(), Operation::Original);
        invalid_reason("original-5");
    }

    #[test]
    fn parses_width_and_height() {
        assert_eq!(
            parse_spec("width-300").unwrap(),
            Operation::WidthHeight {
                axis: Axis::Width,
                size: 300,
            }
        );
        assert_eq!(
            parse_spec("height-120").unwrap(),
            Operation::WidthHeight {
                axis: Axis::Height,
                size: 120,
            }
        );
    }

    #[test]
    fn width_rejects_bad_arguments() {
        assert!(invalid_reason("width-abc").contains("'abc'"));
        assert!(invalid_reason("width").contains("expects 1"));
        assert!(invalid_reason("width-100-200").contains("got 2"));
        invalid_reason("width-0");
    }

    #[test]
    fn parses_min_and_max() {
        assert_eq!(
            parse_spec("min-300x200").unwrap(),
            Operation::MinMax {
                bound: Bound::Min,
                width: 300,
                height: 200,
            }
        );
        assert_eq!(
            parse_spec("max-50x60").unwrap(),
            Operation::MinMax {
                bound: Bound::Max,
                width: 50,
                height: 60,
            }
        );
        invalid_reason("max-300");
        invalid_reason("max-300x200x100");
        invalid_reason("min-ax2");
    }

    #[test]
    fn parses_fill_with_and_without_closeness() {
        assert_eq!(
            parse_spec("fill-300x200").unwrap(),
            Operation::Fill {
                width: 300,
                height: 200,
                closeness: 0.0,
            }
        );
        assert_eq!(
            parse_spec("fill-300x200-c50").unwrap(),
            Operation::Fill {
                width: 300,
                height: 200,
                closeness: 0.5,
            }
        );
        assert_eq!(
            parse_spec("fill-10x10-c100").unwrap(),
            Operation::Fill {
                width: 10,
                height: 10,
                closeness: 1.0,
            }
        );
    }

    #[test]
    fn fill_rejects_bad_extras() {
        assert!(invalid_reason("fill-300x200-z5").contains("z5"));
        assert!(invalid_reason("fill-300x200-c101").contains("0-100"));
        invalid_reason("fill-300x200-cabc");
        invalid_reason("fill");
    }

    #[test]
    fn parses_crop_forms() {
        assert_eq!(
            parse_spec("crop").unwrap(),
            Operation::Crop(CropRegion::FocalPoint)
        );
        assert_eq!(
            parse_spec("crop-10x20x300x200").unwrap(),
            Operation::Crop(CropRegion::Explicit {
                left: 10,
                top: 20,
                width: 300,
                height: 200,
            })
        );
        invalid_reason("crop-10x20x300");
        invalid_reason("crop-10x20x300x200-5");
    }

    #[test]
    fn parses_scale() {
        assert_eq!(
            parse_spec("scale-50").unwrap(),
            Operation::Scale { percent: 50.0 }
        );
        assert_eq!(
            parse_spec("scale-12.5").unwrap(),
            Operation::Scale { percent: 12.5 }
        );
        invalid_reason("scale-half");
        invalid_reason("scale-0");
        invalid_reason("scale-inf");
    }

    #[test]
    fn parses_format_case_insensitively() {
        assert_eq!(
            parse_spec("format-PNG").unwrap(),
            Operation::Format(OutputFormat::Png)
        );
        assert_eq!(
            parse_spec("format-jpeg").unwrap(),
            Operation::Format(OutputFormat::Jpeg)
        );
        assert!(invalid_reason("format-gif").contains("'jpeg' or 'png'"));
    }

    #[test]
    fn parse_specs_preserves_order() {
        let ops = parse_specs(&["format-png", "width-100", "original"]).unwrap();
        assert_eq!(
            ops,
            vec![
                Operation::Format(OutputFormat::Png),
                Operation::WidthHeight {
                    axis: Axis::Width,
                    size: 100,
                },
                Operation::Original,
            ]
        );
    }

    #[test]
    fn parse_specs_stops_at_first_error() {
        let err = parse_specs(&["width-100", "blur-5", "format-gif"]).unwrap_err();
        assert!(matches!(err, FilterError::UnknownOperation(ref w) if w == "blur"));
    }

    #[test]
    fn empty_spec_is_unknown() {
        assert!(matches!(
            parse_spec(""),
            Err(FilterError::UnknownOperation(ref w)) if w.is_empty()
        ));
    }
}
