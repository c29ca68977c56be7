//! CLI configuration.
//!
//! The `ribs` binary reads an optional `ribs.toml` (path set with
//! `--config`). User values are merged on top of the stock defaults, unknown
//! keys are rejected and the result is validated before use.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [jpeg]
//! quality = 95          # 0-100, used when a conversion does not pass one
//! progressive = false   # multi-scan output (needs the `mozjpeg` feature)
//!
//! [png]
//! quality = 60          # 0-100, maps to deflate effort
//!
//! [processing]
//! max_threads = 4       # omit for auto = CPU cores
//! ```
//!
//! The library never reads this file: [`crate::Operations`] takes its
//! defaults as an [`EncodeDefaults`] value.

use crate::codec::{EncodeDefaults, Quality};
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

/// Contents of `ribs.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RibsConfig {
    pub jpeg: JpegConfig,
    pub png: PngConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    pub quality: u32,
    pub progressive: bool,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            progressive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PngConfig {
    pub quality: u32,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self { quality: 60 }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum rayon workers. Absent means one per core; larger values are
    /// clamped to the core count.
    pub max_threads: Option<usize>,
}

impl RibsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jpeg.quality > 100 {
            return Err(ConfigError::Validation("jpeg.quality must be 0-100".into()));
        }
        if self.png.quality > 100 {
            return Err(ConfigError::Validation("png.quality must be 0-100".into()));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Per-codec qualities for [`crate::Operations::with_backend`].
    ///
    /// Call on a validated config; out-of-range values are clamped.
    pub fn encode_defaults(&self) -> EncodeDefaults {
        EncodeDefaults {
            jpeg: Quality::new(clamp_quality(self.jpeg.quality)),
            png: Quality::new(clamp_quality(self.png.quality)),
        }
    }
}

fn clamp_quality(value: u32) -> u8 {
    value.min(100) as u8
}

/// Worker count for the rayon pool: the configured cap, never more than
/// the machine's cores, and the core count when unset.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    match config.max_threads {
        Some(cap) => cap.min(cores),
        None => cores,
    }
}

/// Stock defaults as a `toml::Value::Table`, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RibsConfig::default())
        .expect("stock ribs config serializes to TOML")
}

/// Layer a user `ribs.toml` over the stock table.
///
/// Sections are merged per key, so `[jpeg] quality = 80` keeps the stock
/// `progressive`; a scalar in `overlay` replaces whatever `base` held.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    let toml::Value::Table(overlay_table) = overlay else {
        return overlay;
    };
    let toml::Value::Table(mut merged) = base else {
        return toml::Value::Table(overlay_table);
    };
    for (key, value) in overlay_table {
        let value = match merged.remove(&key) {
            Some(existing) => merge_toml(existing, value),
            None => value,
        };
        merged.insert(key, value);
    }
    toml::Value::Table(merged)
}

/// Read `path` as a raw TOML value. A missing file is `Ok(None)`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RibsConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RibsConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`, falling back to defaults when absent.
pub fn load_config(path: &Path) -> Result<RibsConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Fully commented stock `ribs.toml`, printed by `ribs gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# ribs configuration
# ==================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# JPEG output
# ---------------------------------------------------------------------------
[jpeg]
# Quality used when a conversion does not pass --quality (0 = smallest, 100 = best).
quality = 95

# Write multi-scan (progressive) JPEGs. Needs the `mozjpeg` feature, which
# default builds include.
progressive = false

# ---------------------------------------------------------------------------
# PNG output
# ---------------------------------------------------------------------------
[png]
# PNG is lossless: quality only selects deflate effort.
# High values compress fast, low values compress hard.
quality = 60

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `ribs batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}
