//! Showcase configuration module.
//!
//! Handles loading and validating `settings.toml` from the showcase folder and
//! resolving it into an immutable [`ShowcaseConfig`] that the pipeline holds.
//!
//! ## Config File Location
//!
//! ```text
//! showcase/
//! ├── settings.toml            # Required (may be empty: every key has a default)
//! ├── fallback.png             # Shown when nothing else can be
//! ├── fonts/
//! │   └── OpenSans-Regular.ttf # Caption font (bitmap font if missing)
//! ├── images/
//! │   ├── alice__cat.png
//! │   └── bob__sunset.jpg
//! └── cache/                   # Created on demand
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! image_folder = "images"
//! fallback_image = "fallback.png"
//! # fallback_folder = "fallback"  # Base for fallback_image (default: showcase root)
//! font_path = "fonts/OpenSans-Regular.ttf"
//! cache_dir = "cache"
//!
//! output_width = 400
//! output_height = 400
//!
//! font_size = 16.0             # Pixels
//! text_padding = 10
//! text_angle = 0.0             # Degrees, counter-clockwise
//! text_position = "bottom-left"
//! font_color = [255, 255, 255]
//! shadow_color = [0, 0, 0]
//!
//! cache_ttl = 3600             # Seconds
//!
//! fallback_credit = ""         # Empty = derive from the fallback file name
//! delimiter = "__"
//! use_artist_prefix = true
//!
//! [processing]
//! max_processes = 4            # Cache warm-up workers (omit for auto = CPU cores)
//! ```
//!
//! Relative paths resolve against the showcase folder. Unknown keys are
//! rejected to catch typos early.

use crate::imaging::{MAX_CANVAS_SIDE, MAX_FONT_SIZE, Rgb, TextPosition};
use crate::select::SelectionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file name inside the showcase folder.
pub const SETTINGS_FILENAME: &str = "settings.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Raw `settings.toml` contents.
///
/// All fields have defaults; a settings file only needs the values it wants
/// to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShowcaseSettings {
    pub image_folder: String,
    /// Base folder for a relative `fallback_image`. Unset means the showcase root.
    pub fallback_folder: Option<String>,
    pub fallback_image: String,
    pub font_path: String,
    pub cache_dir: String,
    pub output_width: u32,
    pub output_height: u32,
    /// Caption size in pixels.
    pub font_size: f32,
    pub text_padding: u32,
    /// Caption rotation in degrees, counter-clockwise.
    pub text_angle: f32,
    pub text_position: TextPosition,
    pub font_color: Rgb,
    pub shadow_color: Rgb,
    /// Seconds a rendered image stays fresh.
    pub cache_ttl: u64,
    /// Credit for the fallback image. Empty derives it from the file name.
    pub fallback_credit: String,
    pub delimiter: String,
    /// Credit is the part before the delimiter (`true`) or after it.
    pub use_artist_prefix: bool,
    /// Parallel warm-up settings.
    pub processing: ProcessingConfig,
}

impl Default for ShowcaseSettings {
    fn default() -> Self {
        Self {
            image_folder: "images".to_string(),
            fallback_folder: None,
            fallback_image: "fallback.png".to_string(),
            font_path: "fonts/OpenSans-Regular.ttf".to_string(),
            cache_dir: "cache".to_string(),
            output_width: 400,
            output_height: 400,
            font_size: 16.0,
            text_padding: 10,
            text_angle: 0.0,
            text_position: TextPosition::BottomLeft,
            font_color: Rgb::white(),
            shadow_color: Rgb::black(),
            cache_ttl: 3600,
            fallback_credit: String::new(),
            delimiter: "__".to_string(),
            use_artist_prefix: true,
            processing: ProcessingConfig::default(),
        }
    }
}

impl ShowcaseSettings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(ConfigError::Validation(
                "output_width and output_height must be non-zero".into(),
            ));
        }
        if self.output_width > MAX_CANVAS_SIDE || self.output_height > MAX_CANVAS_SIDE {
            return Err(ConfigError::Validation(format!(
                "output_width and output_height must be at most {MAX_CANVAS_SIDE}"
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ConfigError::Validation(
                "font_size must be a positive number".into(),
            ));
        }
        if self.font_size > MAX_FONT_SIZE {
            return Err(ConfigError::Validation(format!(
                "font_size must be at most {MAX_FONT_SIZE}"
            )));
        }
        if !self.text_angle.is_finite() {
            return Err(ConfigError::Validation(
                "text_angle must be a finite number".into(),
            ));
        }
        if self.delimiter.is_empty() {
            return Err(ConfigError::Validation(
                "delimiter must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel warm-up workers.
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

/// Fully resolved showcase configuration.
///
/// Built once at startup and passed explicitly to the pipeline. All paths are
/// absolute or relative to the current directory, never to the showcase root.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowcaseConfig {
    pub root: PathBuf,
    pub image_folder: PathBuf,
    pub fallback_image: PathBuf,
    /// `None` derives the fallback credit from its file name.
    pub fallback_credit: Option<String>,
    pub font_path: PathBuf,
    pub cache_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub font_size: f32,
    pub padding: u32,
    pub angle: f32,
    pub position: TextPosition,
    pub font_color: Rgb,
    pub shadow_color: Rgb,
    pub cache_ttl: u64,
    pub delimiter: String,
    pub use_prefix: bool,
    pub processing: ProcessingConfig,
}

impl ShowcaseConfig {
    /// Load `settings.toml` from `root`, validate it and resolve paths.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let settings = load_settings(root)?;
        Ok(Self::from_settings(root, settings))
    }

    /// Resolve already-validated settings against the showcase root.
    pub fn from_settings(root: &Path, settings: ShowcaseSettings) -> Self {
        let fallback_base = match &settings.fallback_folder {
            Some(folder) => resolve(root, folder),
            None => root.to_path_buf(),
        };
        let fallback_credit = Some(settings.fallback_credit.trim().to_string())
            .filter(|credit| !credit.is_empty());

        Self {
            root: root.to_path_buf(),
            image_folder: resolve(root, &settings.image_folder),
            fallback_image: resolve(&fallback_base, &settings.fallback_image),
            fallback_credit,
            font_path: resolve(root, &settings.font_path),
            cache_dir: resolve(root, &settings.cache_dir),
            width: settings.output_width,
            height: settings.output_height,
            font_size: settings.font_size,
            padding: settings.text_padding,
            angle: settings.text_angle,
            position: settings.text_position,
            font_color: settings.font_color,
            shadow_color: settings.shadow_color,
            cache_ttl: settings.cache_ttl,
            delimiter: settings.delimiter,
            use_prefix: settings.use_artist_prefix,
            processing: settings.processing,
        }
    }

    /// The subset the candidate selector needs.
    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig {
            image_folder: self.image_folder.clone(),
            fallback_image: self.fallback_image.clone(),
            fallback_credit: self.fallback_credit.clone(),
            delimiter: self.delimiter.clone(),
            use_prefix: self.use_prefix,
        }
    }
}

/// Join `value` onto `base` unless it is already absolute.
fn resolve(base: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Read and validate `<root>/settings.toml`.
pub fn load_settings(root: &Path) -> Result<ShowcaseSettings, ConfigError> {
    let path = root.join(SETTINGS_FILENAME);
    if !path.is_file() {
        return Err(ConfigError::Missing(path));
    }
    let content = fs::read_to_string(&path)?;
    let settings: ShowcaseSettings = toml::from_str(&content)?;
    settings.validate()?;
    Ok(settings)
}

/// A documented `settings.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Showcase Settings
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. The file itself must exist.
#
# Relative paths resolve against the folder holding this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
# Folder scanned (non-recursively) for png, jpg, jpeg, webp and gif files.
image_folder = "images"

# Image shown when the folder is empty or the chosen image can't be used.
fallback_image = "fallback.png"

# Folder a relative fallback_image is resolved against.
# Defaults to the showcase folder itself.
# fallback_folder = "fallback"

# TrueType caption font. A built-in bitmap font is used if it can't be loaded.
font_path = "fonts/OpenSans-Regular.ttf"

# Where rendered images are cached. Created on demand.
cache_dir = "cache"

# ---------------------------------------------------------------------------
# Canvas
# ---------------------------------------------------------------------------
# Output size in pixels. Images are scaled to fit and centered on a
# transparent background. At most 8192 per side.
output_width = 400
output_height = 400

# ---------------------------------------------------------------------------
# Caption
# ---------------------------------------------------------------------------
# Font size in pixels, at most 512.
font_size = 16.0

# Distance from the canvas edges in pixels.
text_padding = 10

# Rotation in degrees, counter-clockwise.
text_angle = 0.0

# One of: top-left, top-right, center, bottom-left, bottom-right.
text_position = "bottom-left"

# Colors as [red, green, blue]. The shadow is drawn one pixel down-right.
font_color = [255, 255, 255]
shadow_color = [0, 0, 0]

# ---------------------------------------------------------------------------
# Credits
# ---------------------------------------------------------------------------
# Filenames look like "<artist>__<title>.jpg" (or the reverse).
delimiter = "__"

# true: the credit is the part before the delimiter; false: the part after.
use_artist_prefix = true

# Credit for the fallback image. Empty derives it from the file name.
fallback_credit = ""

# ---------------------------------------------------------------------------
# Cache
# ---------------------------------------------------------------------------
# Seconds a rendered image is reused before it is rendered again.
cache_ttl = 3600

# ---------------------------------------------------------------------------
# Parallel processing (cache warm-up)
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit for auto (number of CPU cores).
# Values above the core count are clamped down.
# max_processes = 4
"##
}
