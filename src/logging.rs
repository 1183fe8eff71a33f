//! File logging. The terminal belongs to the grid, so everything traced goes
//! to `<cache dir>/tabgrid/tabgrid.log` unless `--log-file` says otherwise.
//!
//! Filter with `TABGRID_LOG`, e.g. `TABGRID_LOG=tabgrid::session=debug`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "TABGRID_LOG";
const DEFAULT_FILTER: &str = "info";

pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("tabgrid").join("tabgrid.log"))
}

/// Install the global subscriber. Returns the file being written, or `None`
/// when no log location could be determined.
pub fn init(explicit: Option<&Path>) -> io::Result<Option<PathBuf>> {
    let Some(path) = explicit.map(Path::to_path_buf).or_else(default_log_path) else {
        return Ok(None);
    };
    let file = open_log(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    // a subscriber installed earlier (tests) keeps priority
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tabgrid starting");
    Ok(Some(path))
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_log_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("tabgrid.log");
        open_log(&path).expect("open");
        assert!(path.exists());
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("run.log");
        assert_eq!(init(Some(&path)).expect("init"), Some(path.clone()));
        assert!(path.exists());
    }
}
