use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::clipboard;
use crate::error::{ClipboardError, ReloadError};
use crate::grid::{Position, column_label};
use crate::input::{Command, Interpreter, Invocation};
use crate::loader::{self, LoadOptions, Source};
use crate::session::Session;
use crate::sort::Direction;
use crate::viewport::Screen;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    /// Incremental search prompt; `origin` is where the cursor was when `/`
    /// was pressed.
    Search {
        input: String,
        origin: Position,
    },
    Help,
    CellView,
}

pub struct App {
    pub should_quit: bool,

    // UI state
    pub mode: AppMode,
    pub status: String,
    pub trunc_char: String,

    pub session: Session,

    // Where the rows came from, for reloads
    pub source: Source,
    pub options: LoadOptions,

    interpreter: Interpreter,
}

impl App {
    pub fn new(session: Session, source: Source, options: LoadOptions, trunc_char: String) -> Self {
        let status = if session.grid().is_degenerate() {
            format!("{source}: no data. Press q to quit, ? for help.")
        } else {
            format!(
                "{source}: {} rows, {} columns. Press ? for help.",
                session.data_row_count(),
                session.column_count()
            )
        };
        Self {
            should_quit: false,
            mode: AppMode::Normal,
            status,
            trunc_char,
            session,
            source,
            options,
            interpreter: Interpreter::new(),
        }
    }

    /// Count typed so far, for the status line.
    pub fn pending_count(&self) -> Option<usize> {
        self.interpreter.pending_count()
    }

    pub fn resize(&mut self, screen: Screen) {
        self.session.set_screen(screen);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            AppMode::Normal => {
                if let Some(invocation) = self.interpreter.feed(key) {
                    self.execute(invocation);
                }
            }
            AppMode::Search { .. } => self.handle_key_search(key),
            AppMode::Help | AppMode::CellView => {
                self.mode = AppMode::Normal;
            }
        }
    }

    fn handle_key_search(&mut self, key: KeyEvent) {
        let AppMode::Search { input, origin } = &mut self.mode else {
            return;
        };
        let origin = *origin;
        match key.code {
            KeyCode::Enter => {
                let query = std::mem::take(input);
                self.mode = AppMode::Normal;
                if query.is_empty() {
                    self.session.clear_search();
                }
                self.status = self.search_summary(&query);
            }
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.session.clear_search();
                self.session.restore_cursor(origin);
                self.status = "Search cancelled".into();
            }
            KeyCode::Backspace => {
                input.pop();
                let query = input.clone();
                self.session.search_from(&query, origin);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                input.push(c);
                let query = input.clone();
                self.session.search_from(&query, origin);
            }
            _ => {}
        }
    }

    /// Run a search as if typed at the prompt and confirmed.
    pub fn search_for(&mut self, query: &str) {
        let origin = self.session.cursor();
        self.session.search_from(query, origin);
        self.status = self.search_summary(query);
    }

    fn search_summary(&self, query: &str) -> String {
        let found = self.session.search().matches().len();
        match (query.is_empty(), found) {
            (true, _) => "Search cleared".into(),
            (false, 0) => format!("Pattern not found: {query}"),
            (false, 1) => format!("1 match for {query}"),
            (false, n) => format!("{n} matches for {query}"),
        }
    }

    pub fn execute(&mut self, invocation: Invocation) {
        let n = invocation.repeat();
        let step = invocation.step();
        let s = &mut self.session;
        match invocation.command {
            Command::Quit => self.should_quit = true,
            Command::Reload => self.reload_and_report("Reloaded"),
            Command::MoveUp => s.move_up(n),
            Command::MoveDown => s.move_down(n),
            Command::MoveLeft => s.move_left(n),
            Command::MoveRight => s.move_right(n),
            Command::PageUp => s.page_up(n),
            Command::PageDown => s.page_down(n),
            Command::PageLeft => s.page_left(n),
            Command::PageRight => s.page_right(n),
            Command::GotoTop => match invocation.count {
                Some(line) => s.goto_line(line),
                None => s.goto_top(),
            },
            Command::GotoBottom => match invocation.count {
                Some(line) => s.goto_line(line),
                None => s.goto_bottom(),
            },
            Command::LineHome => s.line_home(),
            Command::LineEnd => s.line_end(),
            Command::GotoColumn => s.goto_column(n),
            Command::Mark => {
                s.set_mark();
                let pos = s.cursor();
                self.status = format!("Mark set at {}{}", column_label(pos.col), pos.row + 1);
            }
            Command::ReturnToMark => {
                if !s.return_to_mark() {
                    self.status = "No mark set".into();
                }
            }
            Command::ShowCell => {
                if s.current_cell_text().is_some() {
                    self.mode = AppMode::CellView;
                } else {
                    self.status = "No cell to show".into();
                }
            }
            Command::StartSearch => {
                self.mode = AppMode::Search {
                    input: String::new(),
                    origin: s.cursor(),
                };
            }
            Command::NextMatch | Command::PrevMatch => {
                let found = if invocation.command == Command::NextMatch {
                    s.next_match(n)
                } else {
                    s.prev_match(n)
                };
                if found.is_none() {
                    self.status = match s.search().query() {
                        "" => "No previous search".into(),
                        q => format!("Pattern not found: {q}"),
                    };
                } else if let Some(i) = s.search().current_index() {
                    self.status = format!("Match {} of {}", i + 1, s.search().matches().len());
                }
            }
            Command::ToggleHeader => {
                s.toggle_header();
                self.status = if s.header_enabled() {
                    "Header row on".into()
                } else {
                    "Header row off".into()
                };
            }
            Command::Sort(comparator, direction) => {
                s.sort_current_column(comparator, direction);
                if let Some(key) = s.sort_state().key() {
                    let dir = match direction {
                        Direction::Ascending => "ascending",
                        Direction::Descending => "descending",
                    };
                    self.status = format!(
                        "Sorted by column {} ({}, {dir})",
                        column_label(key.column),
                        comparator.display_name()
                    );
                }
            }
            Command::Yank => self.yank(),
            Command::Help => self.mode = AppMode::Help,
            Command::ToggleWidthMode => {
                s.toggle_width_mode(invocation.count);
                self.status = format!("Column width: {}", s.layout().mode().display_name());
            }
            Command::WidenAll => s.resize_all_columns(step),
            Command::NarrowAll => s.resize_all_columns(-step),
            Command::WidenColumn => s.resize_current_column(step),
            Command::NarrowColumn => s.resize_current_column(-step),
            Command::MaximizeColumn => s.maximize_current_column(),
            Command::ResetColumn => s.reset_current_column(),
            Command::WidenGap => s.resize_gap(step),
            Command::NarrowGap => s.resize_gap(-step),
            Command::SkipRowChange { forward } => s.skip_row_change(n, forward),
            Command::SkipColumnChange { forward } => s.skip_column_change(n, forward),
            Command::CancelCount => {}
        }
    }

    /// Re-read the source and swap in a session built from the new rows.
    /// On failure the current session is left untouched.
    pub fn reload(&mut self) -> Result<(), ReloadError> {
        let rows = loader::load(&self.source, &self.options)?;
        self.session = self.session.reloaded(rows);
        Ok(())
    }

    pub fn reload_and_report(&mut self, done: &str) {
        match self.reload() {
            Ok(()) => {
                self.status = format!("{done} {}", self.source);
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.status = e.to_string();
            }
        }
    }

    pub fn yank(&mut self) {
        self.yank_with(clipboard::copy);
    }

    fn yank_with<F>(&mut self, copy: F)
    where
        F: FnOnce(&str) -> Result<&'static str, ClipboardError>,
    {
        let Some(text) = self.session.current_cell_text() else {
            self.status = "Nothing to copy (no data)".into();
            return;
        };
        self.status = match copy(text) {
            Ok(prog) => {
                info!(program = prog, "cell copied");
                format!("Copied cell to clipboard via {prog}")
            }
            Err(e) => format!("Copy failed: {e}"),
        };
    }
}
