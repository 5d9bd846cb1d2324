//! Editor configuration module.
//!
//! Handles loading, validating, and merging `gif-derive.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! The CLI reads `gif-derive.toml` from the working directory, or the file
//! given with `--config`. Without either, the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resample]
//! filter = "lanczos3"       # nearest, triangle, catmull_rom, gaussian, lanczos3
//!
//! [encoder]
//! speed = 10                # GIF quantizer speed, 1 (best) to 30 (fastest)
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//!
//! [sizes.thumbnail]
//! width = 150
//! height = 150
//! crop = true
//! ```
//!
//! ## Named Sizes
//!
//! `[sizes.*]` tables are merged by name, so a user file can add a size or
//! adjust one stock size without repeating the rest. Setting both dimensions
//! of a stock size to `0` disables it.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{EncodeParams, Resample};
use crate::types::TargetSizeSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "gif-derive.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `gif-derive.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Resampling filter applied to every frame.
    pub resample: ResampleConfig,
    /// GIF encoder settings.
    pub encoder: EncoderConfig,
    /// Parallel processing settings for the batch path.
    pub processing: ProcessingConfig,
    /// Named target sizes for `multi-resize`.
    pub sizes: BTreeMap<String, SizeConfig>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let sizes = [
            ("thumbnail", Some(150), Some(150), true),
            ("medium", Some(300), Some(300), false),
            ("medium_large", Some(768), None, false),
            ("large", Some(1024), Some(1024), false),
        ]
        .into_iter()
        .map(|(name, width, height, crop)| {
            (
                name.to_string(),
                SizeConfig {
                    width,
                    height,
                    crop,
                },
            )
        })
        .collect();

        Self {
            resample: ResampleConfig::default(),
            encoder: EncoderConfig::default(),
            processing: ProcessingConfig::default(),
            sizes,
        }
    }
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=30).contains(&self.encoder.speed) {
            return Err(ConfigError::Validation(
                "encoder.speed must be 1-30".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams::new(self.encoder.speed)
    }

    /// Configured sizes as batch specs, ordered by name.
    pub fn target_sizes(&self) -> Vec<TargetSizeSpec> {
        self.sizes
            .iter()
            .map(|(name, size)| TargetSizeSpec::new(name, size.width, size.height, size.crop))
            .collect()
    }
}

/// Resampling settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResampleConfig {
    pub filter: Resample,
}

/// GIF encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Quantizer speed: 1 = best palette, 30 = fastest.
    pub speed: i32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            speed: EncodeParams::default().speed(),
        }
    }
}

/// One named target size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent or null, defaults to the number of CPU cores.
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

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EditorConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `gif-derive.toml` in the given directory.
///
/// A missing file yields the stock defaults.
pub fn load_config(dir: &Path) -> Result<EditorConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    let overlay = if path.exists() {
        Some(load_raw_config(&path)?)
    } else {
        None
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Load config from an explicit file, which must exist.
pub fn load_config_file(path: &Path) -> Result<EditorConfig, ConfigError> {
    resolve_config(stock_defaults_value(), Some(load_raw_config(path)?))
}

/// Returns a fully-commented stock `gif-derive.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gif-derive Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Resampling
# ---------------------------------------------------------------------------
[resample]
# Filter used when scaling each frame.
# One of: nearest, triangle, catmull_rom, gaussian, lanczos3
filter = "lanczos3"

# ---------------------------------------------------------------------------
# GIF encoder
# ---------------------------------------------------------------------------
[encoder]
# Palette quantizer speed, 1 (best quality) to 30 (fastest).
speed = 10

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for multi-resize.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Named sizes for multi-resize
# ---------------------------------------------------------------------------
# Omit width or height to leave that edge unbounded.
# Set both to 0 to disable a size.
# crop = true cuts the source to the exact aspect ratio before scaling.

[sizes.thumbnail]
width = 150
height = 150
crop = true

[sizes.medium]
width = 300
height = 300

[sizes.medium_large]
width = 768

[sizes.large]
width = 1024
height = 1024
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EditorConfig::default();
        assert_eq!(config.resample.filter, Resample::Lanczos3);
        assert_eq!(config.encoder.speed, 10);
        assert_eq!(config.processing.max_processes, None);
        assert_eq!(config.sizes.len(), 4);
        assert_eq!(
            config.sizes["thumbnail"],
            SizeConfig {
                width: Some(150),
                height: Some(150),
                crop: true,
            }
        );
        assert_eq!(config.sizes["medium_large"].height, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[encoder]
speed = 25
"#;
        let config: EditorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.encoder.speed, 25);
        assert_eq!(config.resample.filter, Resample::Lanczos3);
    }

    #[test]
    fn parse_filter_name() {
        let toml = r#"
[resample]
filter = "catmull_rom"
"#;
        let config: EditorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.resample.filter, Resample::CatmullRom);
    }

    #[test]
    fn target_sizes_are_ordered_by_name() {
        let names: Vec<String> = EditorConfig::default()
            .target_sizes()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["large", "medium", "medium_large", "thumbnail"]);
    }

    #[test]
    fn encode_params_follow_config() {
        let mut config = EditorConfig::default();
        config.encoder.speed = 3;
        assert_eq!(config.encode_params().speed(), 3);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.encoder.speed, 10);
        assert_eq!(config.sizes.len(), 4);
    }

    #[test]
    fn load_config_merges_sizes_by_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[sizes.thumbnail]
width = 100
height = 100

[sizes.banner]
width = 600
height = 100
crop = true
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.sizes.len(), 5);
        // crop inherited from the stock thumbnail
        assert_eq!(
            config.sizes["thumbnail"],
            SizeConfig {
                width: Some(100),
                height: Some(100),
                crop: true,
            }
        );
        assert!(config.sizes["banner"].crop);
        assert_eq!(config.sizes["large"].width, Some(1024));
    }

    #[test]
    fn disabled_stock_size_is_unbounded() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[sizes.large]
width = 0
height = 0
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        let large = config
            .target_sizes()
            .into_iter()
            .find(|s| s.name == "large")
            .unwrap();
        assert!(large.is_unbounded());
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_file_requires_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_file(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_file_reads_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[encoder]\nspeed = 1\n").unwrap();
        assert_eq!(load_config_file(&path).unwrap().encoder.speed, 1);
    }

    // =========================================================================
    // effective_threads tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"speed = 10"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"speed = 20"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("speed").unwrap().as_integer(), Some(20));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r#"
[sizes.thumbnail]
width = 150
crop = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[sizes.thumbnail]
width = 96
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let thumb = merged.get("sizes").unwrap().get("thumbnail").unwrap();
        assert_eq!(thumb.get("width").unwrap().as_integer(), Some(96));
        assert_eq!(thumb.get("crop").unwrap().as_bool(), Some(true));
    }

    // =========================================================================
    // Validation and unknown key rejection
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str("[encoder]\nsped = 10\n");
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn unknown_size_key_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str("[sizes.x]\nwidht = 10\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_filter_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str("[resample]\nfilter = \"bicubic\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_speed_out_of_range() {
        let mut config = EditorConfig::default();
        config.encoder.speed = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.encoder.speed = 31;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = EditorConfig::default();
        config.processing.max_processes = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[encoder]\nspeed = 200\n").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: EditorConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = EditorConfig::default();
        assert_eq!(config.encoder.speed, defaults.encoder.speed);
        assert_eq!(config.resample.filter, defaults.resample.filter);
        assert_eq!(config.sizes, defaults.sizes);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        assert!(val.get("resample").is_some());
        assert!(val.get("encoder").is_some());
        assert!(val.get("processing").is_some());
        assert!(val.get("sizes").is_some());
    }
}
