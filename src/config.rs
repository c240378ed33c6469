//! Rendition configuration.
//!
//! Handles loading and validating `renditions.toml`. Stock defaults are the
//! base layer; a user file overrides whichever keys it names. A missing file
//! means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [jpeg]
//! quality = 85              # 1-100
//! progressive = true
//! optimize_huffman = true
//!
//! [png]
//! optimize = true           # Best compression + adaptive filtering
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [attachments]
//! max_length = 2097152      # Bytes
//! allowed_content_types = ["image/jpeg", "image/png"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::attachment::{AttachmentPolicy, DEFAULT_MAX_LENGTH};
use crate::imaging::{EncodeParams, JpegParams, PngParams, Resample};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `renditions.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenditionConfig {
    /// JPEG encoder settings.
    pub jpeg: JpegParams,
    /// PNG encoder settings.
    pub png: PngParams,
    /// Resampling filter for every resize.
    pub resize: ResizeConfig,
    /// Upload validation.
    pub attachments: AttachmentsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl RenditionConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attachments.max_length == 0 {
            return Err(ConfigError::Validation(
                "attachments.max_length must be non-zero".into(),
            ));
        }
        if self.attachments.allowed_content_types.is_empty() {
            return Err(ConfigError::Validation(
                "attachments.allowed_content_types must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .attachments
            .allowed_content_types
            .iter()
            .find(|t| !t.starts_with("image/"))
        {
            return Err(ConfigError::Validation(format!(
                "attachments.allowed_content_types: '{bad}' is not an image type"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            jpeg: self.jpeg,
            png: self.png,
        }
    }

    pub fn policy(&self) -> AttachmentPolicy {
        AttachmentPolicy {
            allowed_content_types: self.attachments.allowed_content_types.clone(),
            max_length: self.attachments.max_length,
        }
    }
}

/// Resampling settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: Resample,
}

/// Upload validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttachmentsConfig {
    /// Largest accepted upload in bytes.
    pub max_length: u64,
    /// MIME types accepted for image uploads.
    pub allowed_content_types: Vec<String>,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        let policy = AttachmentPolicy::default();
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            allowed_content_types: policy.allowed_content_types,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel rendition workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(RenditionConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<RenditionConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenditionConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the TOML file at `path`.
///
/// A missing file yields the validated stock defaults.
pub fn load_config(path: &Path) -> Result<RenditionConfig, ConfigError> {
    let overlay = if path.exists() {
        let content = fs::read_to_string(path)?;
        Some(toml::from_str::<toml::Value>(&content)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `renditions.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Renditions Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# JPEG output
# ---------------------------------------------------------------------------
[jpeg]
# Encoding quality, 1 (worst) to 100 (best).
quality = 85
# Progressive scans load coarse-to-fine in browsers.
progressive = true
# Build per-image Huffman tables. Smaller files, slightly slower.
optimize_huffman = true

# ---------------------------------------------------------------------------
# PNG output
# ---------------------------------------------------------------------------
[png]
# Best compression with adaptive row filtering.
optimize = true

# ---------------------------------------------------------------------------
# Resampling
# ---------------------------------------------------------------------------
[resize]
# One of: nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "lanczos3"

# ---------------------------------------------------------------------------
# Upload validation
# ---------------------------------------------------------------------------
[attachments]
# Largest accepted upload, in bytes (2 MiB).
max_length = 2097152
allowed_content_types = ["image/jpeg", "image/png"]

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel rendition workers.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
