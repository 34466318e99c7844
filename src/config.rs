//! Configuration: target size, presets, and default directories.
//!
//! Values are layered, later layers winning:
//!
//! ```text
//! stock defaults  →  batch-resize.toml (or --config FILE)  →  CLI flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input = "input"              # Folder to read images from
//! output = "output"            # Folder to write PNG copies to
//! lenient_dimensions = false   # Fall back to 1920x1080 on bad --width/--height
//!
//! [target]
//! width = 1920
//! height = 1080
//! # preset = "iphone"          # Overrides width/height when set
//!
//! [presets]
//! iphone = [1242, 2688]
//! mac = [2560, 1600]
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables merge key by key, so adding a preset
//! keeps the stock ones:
//!
//! ```toml
//! [presets]
//! ipad = [2048, 2732]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::TargetSize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// File looked up in the working directory when `--config` isn't given.
pub const CONFIG_FILE_NAME: &str = "batch-resize.toml";

/// Used for the stock target, and as the lenient fallback.
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Largest accepted edge, in pixels.
pub const MAX_DIMENSION: u32 = 32768;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Unknown preset '{name}'. Available: {available}")]
    UnknownPreset { name: String, available: String },
    #[error("Invalid {field} '{value}': expected an integer from 1 to {max}", max = MAX_DIMENSION)]
    InvalidDimension { field: &'static str, value: String },
}

/// Tool configuration loaded from `batch-resize.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Folder to read images from.
    pub input: PathBuf,
    /// Folder to write PNG copies to.
    pub output: PathBuf,
    /// When true, unparsable `--width`/`--height` fall back to 1920x1080.
    pub lenient_dimensions: bool,
    /// Target size used when no CLI size flags are given.
    pub target: TargetConfig,
    /// Named sizes selectable with `--preset`, as `[width, height]`.
    pub presets: BTreeMap<String, [u32; 2]>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            output: PathBuf::from("output"),
            lenient_dimensions: false,
            target: TargetConfig::default(),
            presets: stock_presets(),
        }
    }
}

fn stock_presets() -> BTreeMap<String, [u32; 2]> {
    BTreeMap::from([
        ("iphone".to_string(), [1242, 2688]),
        ("mac".to_string(), [2560, 1600]),
    ])
}

/// Default target size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub width: u32,
    pub height: u32,
    /// Preset name; takes precedence over `width`/`height`.
    pub preset: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            preset: None,
        }
    }
}

fn in_range(value: u32) -> bool {
    (1..=MAX_DIMENSION).contains(&value)
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !in_range(self.target.width) || !in_range(self.target.height) {
            return Err(ConfigError::Validation(format!(
                "target width and height must be 1-{MAX_DIMENSION}"
            )));
        }
        for (name, [w, h]) in &self.presets {
            if !in_range(*w) || !in_range(*h) {
                return Err(ConfigError::Validation(format!(
                    "presets.{name} dimensions must be 1-{MAX_DIMENSION}"
                )));
            }
        }
        if let Some(name) = &self.target.preset {
            self.preset(name)?;
        }
        Ok(())
    }

    /// Look up a preset by name.
    pub fn preset(&self, name: &str) -> Result<TargetSize, ConfigError> {
        self.presets
            .get(name)
            .and_then(|[w, h]| TargetSize::new(*w, *h))
            .ok_or_else(|| ConfigError::UnknownPreset {
                name: name.to_string(),
                available: self
                    .presets
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// The configured target, ignoring CLI flags.
    pub fn default_target(&self) -> Result<TargetSize, ConfigError> {
        match &self.target.preset {
            Some(name) => self.preset(name),
            None => TargetSize::new(self.target.width, self.target.height).ok_or_else(|| {
                ConfigError::Validation("target width and height must be non-zero".into())
            }),
        }
    }
}

/// Size-related CLI flags, kept as raw text so lenient parsing can apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetArgs {
    pub preset: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub lenient: bool,
}

/// Parse a custom dimension: a whole number from 1 to [`MAX_DIMENSION`].
///
/// Surrounding whitespace is ignored.
pub fn parse_dimension(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|v| in_range(*v))
}

fn dimension_or_fallback(
    text: &str,
    field: &'static str,
    fallback: u32,
    lenient: bool,
) -> Result<u32, ConfigError> {
    match parse_dimension(text) {
        Some(value) => Ok(value),
        None if lenient => {
            warn!("{field} '{text}' is not a valid size, using {fallback}");
            Ok(fallback)
        }
        None => Err(ConfigError::InvalidDimension {
            field,
            value: text.to_string(),
        }),
    }
}

/// Resolve the final target size from config plus CLI flags.
///
/// Precedence: `--preset`, then `--width`/`--height` (a missing one comes
/// from the configured target), then `target.preset`, then
/// `target.width`/`target.height`.
pub fn resolve_target(config: &BatchConfig, args: &TargetArgs) -> Result<TargetSize, ConfigError> {
    if let Some(name) = &args.preset {
        return config.preset(name);
    }
    if args.width.is_none() && args.height.is_none() {
        return config.default_target();
    }

    let lenient = args.lenient || config.lenient_dimensions;
    let width = match &args.width {
        Some(text) => dimension_or_fallback(text, "width", DEFAULT_WIDTH, lenient)?,
        None => config.target.width,
    };
    let height = match &args.height {
        Some(text) => dimension_or_fallback(text, "height", DEFAULT_HEIGHT, lenient)?,
        None => config.target.height,
    };
    TargetSize::new(width, height)
        .ok_or_else(|| ConfigError::Validation("target width and height must be non-zero".into()))
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BatchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Read a TOML file as a raw value. `Ok(None)` if it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BatchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `batch-resize.toml` from `dir` if present, else stock defaults.
pub fn load_config(dir: &Path) -> Result<BatchConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    let overlay = load_raw_config(&path)?;
    if overlay.is_some() {
        debug!(path = %path.display(), "loaded config");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<BatchConfig, ConfigError> {
    let overlay =
        load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?;
    debug!(path = %path.display(), "loaded config");
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# batch-resize configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the working directory as batch-resize.toml, or pass
# it with --config FILE. Command-line flags override everything here.
# Unknown keys will cause an error.

# Folder to read images from. Only direct children are processed:
# png, jpg, jpeg, tiff, bmp (any case).
input = "input"

# Folder to write PNG copies to. Files keep their original names.
output = "output"

# When true, a --width/--height that isn't a positive whole number falls
# back to 1920 (width) or 1080 (height) with a warning instead of failing.
lenient_dimensions = false

# ---------------------------------------------------------------------------
# Target size
# ---------------------------------------------------------------------------
# Images are stretched to exactly this size; aspect ratio is not kept.
[target]
width = 1920
height = 1080

# Use a named preset instead of width/height.
# preset = "iphone"

# ---------------------------------------------------------------------------
# Presets, selectable with --preset NAME
# ---------------------------------------------------------------------------
# Entries added here are merged with the stock ones.
[presets]
iphone = [1242, 2688]
mac = [2560, 1600]
"##
}
