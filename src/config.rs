//! Server configuration module.
//!
//! Handles loading, validating, and merging `retouch.toml`. Configuration is
//! layered: stock defaults are overridden by the user's file, which is in turn
//! overridden by command-line flags and finally by the `PORT` environment
//! variable (so the binary drops into platforms that assign a port).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! public_dir = "public"          # Static assets served at /
//!
//! [storage]
//! uploads_dir = "public/uploads" # Uploaded originals
//! results_dir = "public/results" # Enhanced images (also the bundle source)
//! keep_originals = true          # Keep originals after enhancement
//!
//! [upload]
//! max_files = 50                 # Files per upload request
//! max_file_size = 52428800       # Bytes per file (50 MiB)
//! max_json_size = 52428800       # Bytes per JSON body (overlays are big)
//! allowed_types = ["jpeg", "jpg", "png", "webp", "tiff", "bmp"]
//!
//! [enhance]
//! scale_factor = 2               # Width multiplier
//! max_width = 4000               # Output width cap
//! quality = 90                   # JPEG quality (1-100)
//! sharpen_sigma = 1.5            # Unsharp mask sigma (0 disables)
//! sharpen_threshold = 10         # Unsharp mask threshold
//! # brightness = 1.0             # Multiplier, unset = untouched
//! # saturation = 1.0             # Multiplier, unset = untouched
//!
//! [processing]
//! max_processes = 4              # CLI batch workers (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::{EnhanceConfig, Modulation, Quality, Sharpening};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "retouch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration loaded from `retouch.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listener settings.
    pub server: ListenConfig,
    /// Where originals and results live.
    pub storage: StorageConfig,
    /// Upload limits and accepted types.
    pub upload: UploadConfig,
    /// Enhancement pipeline parameters.
    pub enhance: EnhanceSettings,
    /// Parallel processing settings for the CLI batch mode.
    pub processing: ProcessingConfig,
}

impl ServerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_files == 0 {
            return Err(ConfigError::Validation(
                "upload.max_files must be at least 1".into(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "upload.max_file_size must be non-zero".into(),
            ));
        }
        if self.upload.allowed_types.is_empty() {
            return Err(ConfigError::Validation(
                "upload.allowed_types must not be empty".into(),
            ));
        }
        if self.enhance.quality == 0 || self.enhance.quality > 100 {
            return Err(ConfigError::Validation(
                "enhance.quality must be 1-100".into(),
            ));
        }
        if self.enhance.scale_factor == 0 || self.enhance.max_width == 0 {
            return Err(ConfigError::Validation(
                "enhance.scale_factor and enhance.max_width must be non-zero".into(),
            ));
        }
        if self.enhance.sharpen_sigma < 0.0 {
            return Err(ConfigError::Validation(
                "enhance.sharpen_sigma must not be negative".into(),
            ));
        }
        for (key, value) in [
            ("brightness", self.enhance.brightness),
            ("saturation", self.enhance.saturation),
        ] {
            if value.is_some_and(|v| v <= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "enhance.{key} must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Apply environment overrides. Only `PORT` is recognised.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("PORT '{port}' is not a port")))?;
        }
        Ok(())
    }
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    /// Static files served at the site root (besides the generated index).
    pub public_dir: PathBuf,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_dir: PathBuf::from("public"),
        }
    }
}

impl ListenConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Storage directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
    pub results_dir: PathBuf,
    /// When false, an original is deleted once its enhanced copy exists.
    pub keep_originals: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("public/uploads"),
            results_dir: PathBuf::from("public/results"),
            keep_originals: true,
        }
    }
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub max_files: usize,
    pub max_file_size: u64,
    pub max_json_size: u64,
    /// Accepted type names, matched against both MIME subtype and extension.
    pub allowed_types: Vec<String>,
}

const MIB: u64 = 1024 * 1024;

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: 50,
            max_file_size: 50 * MIB,
            max_json_size: 50 * MIB,
            allowed_types: ["jpeg", "jpg", "png", "webp", "tiff", "bmp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl UploadConfig {
    /// Largest multipart body worth reading: every file at its cap, plus slack
    /// for part headers.
    pub fn max_body_size(&self) -> usize {
        let files = self.max_file_size.saturating_mul(self.max_files as u64);
        usize::try_from(files.saturating_add(MIB)).unwrap_or(usize::MAX)
    }
}

/// Enhancement pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceSettings {
    pub scale_factor: u32,
    pub max_width: u32,
    pub quality: u32,
    /// Unsharp-mask sigma; `0` turns sharpening off.
    pub sharpen_sigma: f32,
    pub sharpen_threshold: i32,
    pub brightness: Option<f32>,
    pub saturation: Option<f32>,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        let sharpening = Sharpening::enhance_default();
        Self {
            scale_factor: 2,
            max_width: 4000,
            quality: Quality::default().value(),
            sharpen_sigma: sharpening.sigma,
            sharpen_threshold: sharpening.threshold,
            brightness: None,
            saturation: None,
        }
    }
}

impl EnhanceSettings {
    /// Translate file settings into the imaging pipeline's config.
    pub fn to_enhance_config(&self) -> EnhanceConfig {
        EnhanceConfig {
            scale_factor: self.scale_factor,
            max_width: self.max_width,
            quality: Quality::new(self.quality),
            sharpening: (self.sharpen_sigma > 0.0).then_some(Sharpening {
                sigma: self.sharpen_sigma,
                threshold: self.sharpen_threshold,
            }),
            modulation: Modulation {
                brightness: self.brightness,
                saturation: self.saturation,
            },
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
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
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ServerConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ServerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the server config.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
/// `working_dir` is used when present and stock defaults otherwise.
pub fn load_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<ServerConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let fallback = working_dir.join(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                Some(load_raw_config(&fallback)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `retouch.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# retouch configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Precedence: stock defaults < this file < CLI flags < PORT env var.

# ---------------------------------------------------------------------------
# Listener
# ---------------------------------------------------------------------------
[server]
host = "0.0.0.0"
port = 3000

# Static assets served at the site root next to the generated index page.
public_dir = "public"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Uploaded originals, served at /uploads/<name>.
uploads_dir = "public/uploads"

# Enhanced images, served at /results/<name>; /download_all zips this folder.
results_dir = "public/results"

# Keep originals after their enhanced copy is written.
keep_originals = true

# ---------------------------------------------------------------------------
# Upload limits
# ---------------------------------------------------------------------------
[upload]
# Files accepted in a single request.
max_files = 50

# Per-file limit in bytes (50 MiB).
max_file_size = 52428800

# JSON body limit in bytes; overlays arrive as base64 data URLs.
max_json_size = 52428800

# Both the MIME subtype and the file extension must be one of these.
allowed_types = ["jpeg", "jpg", "png", "webp", "tiff", "bmp"]

# ---------------------------------------------------------------------------
# Enhancement pipeline
# ---------------------------------------------------------------------------
[enhance]
# Output width = min(width * scale_factor, max_width); height keeps aspect.
scale_factor = 2
max_width = 4000

# JPEG encoding quality (1 = worst, 100 = best).
quality = 90

# Unsharp mask applied after the upscale. Set sigma to 0 to disable.
sharpen_sigma = 1.5
sharpen_threshold = 10

# Optional colour multipliers (1.0 = unchanged).
# brightness = 1.0
# saturation = 1.0

# ---------------------------------------------------------------------------
# Processing (CLI batch mode)
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers for `retouch enhance`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
