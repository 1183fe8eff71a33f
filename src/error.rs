use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a source into rows. Fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),
    #[error("unsupported encoding {0:?} (expected utf-8 or latin-1)")]
    UnsupportedEncoding(String),
    #[error("input is not valid {0}")]
    Decode(&'static str),
    #[error("{name} must be a single ASCII character, got {value:?}")]
    InvalidByte { name: &'static str, value: String },
    #[error("malformed delimited data: {0}")]
    Parse(#[from] csv::Error),
    #[error("invalid start position {0:?}")]
    StartPosition(String),
}

/// Failure to refresh a running session. The previous data stays on screen.
#[derive(Debug, Error)]
#[error("reload failed, keeping previous data: {0}")]
pub struct ReloadError(#[from] pub LoadError);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard program available")]
    Unavailable,
    #[error("{program} failed: {reason}")]
    Failed { program: &'static str, reason: String },
}
