//! Reload trigger for `--watch`.
//!
//! notify runs its own thread; change notifications for the viewed file are
//! forwarded over a crossbeam channel that the event loop drains between
//! input polls.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender, unbounded};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<()>,
    path: PathBuf,
}

impl FileWatcher {
    /// Watch `path` through its parent directory so editors that replace the
    /// file on save are still picked up.
    pub fn new(path: &Path) -> notify::Result<Self> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path.file_name().map(OsString::from);

        let (tx, rx) = unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            forward(res, name.as_deref(), &tx);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(path = %path.display(), "watching for changes");

        Ok(Self {
            _watcher: watcher,
            rx,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending notifications. True when at least one arrived, so a
    /// burst of writes turns into one reload.
    pub fn changed(&self) -> bool {
        let pending = self.rx.try_iter().count();
        if pending > 0 {
            debug!(pending, "file change notifications drained");
        }
        pending > 0
    }
}

fn forward(res: notify::Result<Event>, name: Option<&std::ffi::OsStr>, tx: &Sender<()>) {
    match res {
        Ok(event) => {
            if is_relevant(&event, name) {
                // receiver gone means the viewer is shutting down
                let _ = tx.send(());
            }
        }
        Err(e) => warn!(error = %e, "file watcher error"),
    }
}

fn is_relevant(event: &Event, name: Option<&std::ffi::OsStr>) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| name.is_some() && p.file_name() == name)
}
