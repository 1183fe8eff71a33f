use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::layout::{
    DEFAULT_COLUMN_GAP, DEFAULT_COLUMN_WIDTH, DEFAULT_MAX_COLUMN_WIDTH, LayoutSettings, WidthMode,
};

pub const DEFAULT_TRUNC_CHAR: &str = "…";
pub const DEFAULT_TICK_RATE_MS: u64 = 100;

/// Settings read from `config.toml`. Every section and field is optional;
/// command-line flags override whatever is set here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub load: LoadConfig,
    pub layout: LayoutConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// "auto", "utf-8" or "latin-1"
    pub encoding: String,
    /// Sniffed when unset
    pub delimiter: Option<String>,
    pub quote_char: String,
    pub header: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            encoding: "auto".into(),
            delimiter: None,
            quote_char: "\"".into(),
            header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// A fixed width such as `20`, or `"max"` / `"mode"`
    pub width: WidthSpec,
    pub gap: usize,
    pub max_width: usize,
    pub trunc_char: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: WidthSpec::Fixed(DEFAULT_COLUMN_WIDTH),
            gap: DEFAULT_COLUMN_GAP,
            max_width: DEFAULT_MAX_COLUMN_WIDTH,
            trunc_char: DEFAULT_TRUNC_CHAR.into(),
        }
    }
}

impl LayoutConfig {
    pub fn settings(&self) -> LayoutSettings {
        let (mode, default_width) = match self.width {
            WidthSpec::Fixed(w) => (WidthMode::Fixed, w.max(1)),
            WidthSpec::Mode(mode) => (mode, DEFAULT_COLUMN_WIDTH),
        };
        LayoutSettings {
            mode,
            default_width,
            gap: self.gap,
            max_width: self.max_width.max(1),
            ..LayoutSettings::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Reload when the file changes on disk
    pub watch: bool,
    /// Redraw interval of the event loop
    pub tick_rate_ms: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            watch: false,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
        }
    }
}

/// Column width policy as given by `--width` or `layout.width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WidthSpec {
    Fixed(usize),
    Mode(WidthMode),
}

impl FromStr for WidthSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "max" => Ok(WidthSpec::Mode(WidthMode::MaxContent)),
            "mode" => Ok(WidthSpec::Mode(WidthMode::ModalContent)),
            n => n
                .parse::<usize>()
                .ok()
                .filter(|&w| w > 0)
                .map(WidthSpec::Fixed)
                .ok_or_else(|| format!("expected a positive width, \"max\" or \"mode\", got {s:?}")),
        }
    }
}

impl fmt::Display for WidthSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidthSpec::Fixed(w) => write!(f, "{w}"),
            WidthSpec::Mode(mode) => f.write_str(mode.display_name()),
        }
    }
}

impl Config {
    /// Load from an explicit path (which must exist) or from the default
    /// location (missing file means defaults).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tabgrid").join("config.toml"))
    }
}
