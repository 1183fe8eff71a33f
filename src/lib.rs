//! Interactive terminal viewer for delimited text data.
//!
//! The grid engine (`grid`, `layout`, `sort`, `search`, `viewport`,
//! `session`) is terminal-free; `app` and `ui` wire it to crossterm and
//! ratatui.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod grid;
pub mod input;
pub mod layout;
pub mod loader;
pub mod logging;
pub mod search;
pub mod session;
pub mod sort;
pub mod ui;
pub mod viewport;
pub mod watcher;
