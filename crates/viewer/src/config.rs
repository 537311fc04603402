use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use streaming::{DEFAULT_INDEX_WIDTH, ImageFormat, LoaderConfig, TileUrlTemplate};

use crate::history::DEFAULT_HISTORY_DEBOUNCE_MS;
use crate::scrubber::{DEFAULT_SNAP_STRENGTH, ScrubberConfig};
use crate::view_state::ViewDefaults;

/// Session configuration. Every field has a default, so a partial JSON file
/// (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Image CDN origin; empty means same-origin relative URLs.
    pub cdn_base: String,
    pub image_format: ImageFormat,
    pub index_width: usize,
    pub loader: LoaderConfig,
    pub snap_strength: f64,
    pub history_debounce_ms: u64,
    pub default_camera: ViewDefaults,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cdn_base: String::new(),
            image_format: ImageFormat::default(),
            index_width: DEFAULT_INDEX_WIDTH,
            loader: LoaderConfig::default(),
            snap_strength: DEFAULT_SNAP_STRENGTH,
            history_debounce_ms: DEFAULT_HISTORY_DEBOUNCE_MS,
            default_camera: ViewDefaults::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&raw)
    }

    pub fn template_for(&self, race_slug: &str) -> TileUrlTemplate {
        TileUrlTemplate::new(self.cdn_base.clone(), race_slug)
            .with_format(self.image_format)
            .with_index_width(self.index_width)
    }

    pub fn scrubber(&self) -> ScrubberConfig {
        ScrubberConfig {
            snap_strength: self.snap_strength,
        }
    }
}
