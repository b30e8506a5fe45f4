//! Configuration file support
//!
//! Pipeline settings live in an optional TOML file; every section and field
//! falls back to its default.
//!
//! ```toml
//! [normalize]
//! target_width = 100.0
//!
//! [reconcile]
//! thresh_factor = 0.05
//! size_factor = 1.03
//!
//! [consistency]
//! mode = "pairwise"
//! pair_threshold = 0.10
//! median_threshold = 0.10
//!
//! [render]
//! enabled = false
//! max_width = 2200
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::consistency::ConsistencyMode;
use crate::reconcile::{CheckMode, ReconcileOptions, DEFAULT_SIZE_FACTOR, DEFAULT_THRESH_FACTOR};
use crate::render::TileOptions;

/// Config file name inside the user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name inside the user config directory
pub const CONFIG_DIR_NAME: &str = "boxrecon";

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoxReconConfig {
    pub normalize: NormalizeConfig,
    pub reconcile: ReconcileConfig,
    pub consistency: ConsistencyConfig,
    pub render: RenderConfig,
}

/// Scaling applied before analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Width the array extent is scaled to (default: 100.0)
    pub target_width: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { target_width: 100.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    pub thresh_factor: f64,
    pub size_factor: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            thresh_factor: DEFAULT_THRESH_FACTOR,
            size_factor: DEFAULT_SIZE_FACTOR,
        }
    }
}

impl ReconcileConfig {
    /// Reconcile options for one check mode
    pub fn options(&self, check: CheckMode) -> ReconcileOptions {
        ReconcileOptions {
            check,
            thresh_factor: self.thresh_factor,
            size_factor: self.size_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsistencyConfig {
    pub mode: ConsistencyMode,
    /// Pairwise deviation below which a dimension counts as uniform
    pub pair_threshold: f64,
    /// Median deviation below which a dimension counts as uniform
    pub median_threshold: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            mode: ConsistencyMode::Pairwise,
            pair_threshold: 0.10,
            median_threshold: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Write PNG tiles next to the output arrays
    pub enabled: bool,
    pub max_width: u32,
    pub line_width: u32,
    pub scale: f32,
    pub background: u8,
    pub spacing: u32,
    pub border: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let tiles = TileOptions::default();
        Self {
            enabled: false,
            max_width: tiles.max_width,
            line_width: tiles.line_width,
            scale: tiles.scale,
            background: tiles.background,
            spacing: tiles.spacing,
            border: tiles.border,
        }
    }
}

impl RenderConfig {
    pub fn tile_options(&self) -> TileOptions {
        TileOptions {
            max_width: self.max_width,
            line_width: self.line_width,
            scale: self.scale,
            background: self.background,
            spacing: self.spacing,
            border: self.border,
        }
    }
}

impl BoxReconConfig {
    /// Parse and validate a TOML string
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load the user config file if it exists, defaults otherwise
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/boxrecon/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let target = self.normalize.target_width;
        if !target.is_finite() || target <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "normalize.target_width must be positive, got {}",
                target
            )));
        }
        self.reconcile
            .options(CheckMode::Both)
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("reconcile: {}", e)))?;
        for (name, v) in [
            ("pair_threshold", self.consistency.pair_threshold),
            ("median_threshold", self.consistency.median_threshold),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "consistency.{} must be >= 0, got {}",
                    name, v
                )));
            }
        }
        if !self.render.scale.is_finite() || self.render.scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "render.scale must be positive, got {}",
                self.render.scale
            )));
        }
        Ok(())
    }
}
