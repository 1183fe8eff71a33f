use tracing::{debug, info};

use crate::grid::{Grid, Position};
use crate::layout::{ColumnLayout, LayoutSettings};
use crate::search::SearchState;
use crate::sort::{Comparator, Direction, SortKey, SortState};
use crate::viewport::{Screen, Viewport};

/// All interaction state for one loaded grid. Rebuilt wholesale on reload.
#[derive(Debug, Clone)]
pub struct Session {
    grid: Grid,
    sort: SortState,
    search: SearchState,
    layout: ColumnLayout,
    cursor: Position,
    viewport: Viewport,
    mark: Option<Position>,
    screen: Screen,
}

impl Session {
    pub fn new(grid: Grid, settings: LayoutSettings, start: Position, screen: Screen) -> Self {
        let sort = SortState::identity(grid.data_row_count());
        let layout = ColumnLayout::new(settings, &grid);
        let mut session = Self {
            grid,
            sort,
            search: SearchState::default(),
            layout,
            cursor: Position::default(),
            viewport: Viewport::default(),
            mark: None,
            screen,
        };
        session.set_cursor(start);
        info!(
            rows = session.grid.data_row_count(),
            columns = session.grid.column_count(),
            "session created"
        );
        session
    }

    /// A new session over `rows` carrying over this session's sort, layout,
    /// search, header and mark. The cursor follows its underlying row when that
    /// row still exists.
    pub fn reloaded(&self, rows: Vec<Vec<String>>) -> Self {
        let grid = Grid::new(rows, self.grid.header_enabled());
        let sort = SortState::build(&grid, self.sort.key());
        let layout = ColumnLayout::new(self.layout.settings().clone(), &grid);
        let mut search = SearchState::default();
        search.set_query(self.search.query(), &grid, &sort);

        let row = self
            .sort
            .underlying(self.cursor.row)
            .and_then(|u| sort.display_of(u))
            .unwrap_or(self.cursor.row);

        let mut session = Self {
            grid,
            sort,
            search,
            layout,
            cursor: Position::default(),
            viewport: self.viewport,
            mark: self.mark,
            screen: self.screen,
        };
        session.clamp_viewport();
        session.set_cursor(Position::new(row, self.cursor.col));
        session.search.sync_to(session.cursor);
        info!(
            rows = session.grid.data_row_count(),
            columns = session.grid.column_count(),
            "session reloaded"
        );
        session
    }

    // ----- read accessors for the renderer -----

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn mark(&self) -> Option<Position> {
        self.mark
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn header_enabled(&self) -> bool {
        self.grid.header_enabled()
    }

    pub fn data_row_count(&self) -> usize {
        self.sort.len()
    }

    pub fn column_count(&self) -> usize {
        self.grid.column_count()
    }

    pub fn visible_rows(&self) -> usize {
        self.screen.visible_rows(self.header_enabled())
    }

    /// Data row at a display position.
    pub fn display_row(&self, display: usize) -> Option<&[String]> {
        self.sort
            .underlying(display)
            .and_then(|u| self.grid.data_row(u))
    }

    pub fn cell(&self, pos: Position) -> Option<&str> {
        self.display_row(pos.row)
            .and_then(|row| row.get(pos.col))
            .map(String::as_str)
    }

    /// Full text under the cursor, for yanking and the detail popup.
    pub fn current_cell_text(&self) -> Option<&str> {
        if self.grid.is_degenerate() {
            return None;
        }
        self.cell(self.cursor)
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.viewport
            .contains(pos, self.screen, self.header_enabled(), &self.layout)
    }

    // ----- screen -----

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen == screen {
            return;
        }
        debug!(width = screen.width, height = screen.height, "screen resized");
        self.screen = screen;
        self.clamp_viewport();
        self.reveal_cursor();
    }

    // ----- cursor movement -----

    pub fn move_up(&mut self, n: usize) {
        let row = self.cursor.row.saturating_sub(n);
        self.set_cursor(Position::new(row, self.cursor.col));
    }

    pub fn move_down(&mut self, n: usize) {
        let row = self.cursor.row.saturating_add(n);
        self.set_cursor(Position::new(row, self.cursor.col));
    }

    pub fn move_left(&mut self, n: usize) {
        let col = self.cursor.col.saturating_sub(n);
        self.set_cursor(Position::new(self.cursor.row, col));
    }

    pub fn move_right(&mut self, n: usize) {
        let col = self.cursor.col.saturating_add(n);
        self.set_cursor(Position::new(self.cursor.row, col));
    }

    pub fn goto_top(&mut self) {
        self.set_cursor(Position::new(0, self.cursor.col));
    }

    pub fn goto_bottom(&mut self) {
        let last = self.last_row();
        self.set_cursor(Position::new(last, self.cursor.col));
    }

    /// Jump to a 1-based line number; 0 means the top.
    pub fn goto_line(&mut self, line: usize) {
        self.set_cursor(Position::new(line.saturating_sub(1), self.cursor.col));
    }

    /// Jump to a 1-based column number; 0 means the first column.
    pub fn goto_column(&mut self, column: usize) {
        self.set_cursor(Position::new(self.cursor.row, column.saturating_sub(1)));
    }

    pub fn line_home(&mut self) {
        self.set_cursor(Position::new(self.cursor.row, 0));
    }

    pub fn line_end(&mut self) {
        let last = self.last_col();
        self.set_cursor(Position::new(self.cursor.row, last));
    }

    pub fn page_down(&mut self, pages: usize) {
        if self.grid.is_degenerate() {
            return;
        }
        let rows = self.visible_rows();
        let distance = rows.saturating_mul(pages);
        let max_top = Viewport::max_top(self.screen, self.header_enabled(), self.data_row_count());
        let top = self.viewport.top.saturating_add(distance).min(max_top);
        if top > self.viewport.top {
            self.viewport.top = top;
            self.clamp_cursor_rows(top, rows);
        } else {
            self.cursor.row = self.cursor.row.saturating_add(distance).min(self.last_row());
        }
        self.reveal_cursor();
    }

    pub fn page_up(&mut self, pages: usize) {
        if self.grid.is_degenerate() {
            return;
        }
        let rows = self.visible_rows();
        let distance = rows.saturating_mul(pages);
        let top = self.viewport.top.saturating_sub(distance);
        if top < self.viewport.top {
            self.viewport.top = top;
            self.clamp_cursor_rows(top, rows);
        } else {
            self.cursor.row = self.cursor.row.saturating_sub(distance);
        }
        self.reveal_cursor();
    }

    pub fn page_right(&mut self, pages: usize) {
        if self.grid.is_degenerate() {
            return;
        }
        let distance = self.screen.visible_width().saturating_mul(pages);
        let max_x = Viewport::max_x_offset(self.screen, &self.layout);
        let x = self.viewport.x_offset.saturating_add(distance).min(max_x);
        if x > self.viewport.x_offset {
            self.viewport.x_offset = x;
            self.clamp_cursor_columns(true);
        } else {
            self.cursor.col = self.last_col();
        }
        self.reveal_cursor();
    }

    pub fn page_left(&mut self, pages: usize) {
        if self.grid.is_degenerate() {
            return;
        }
        let distance = self.screen.visible_width().saturating_mul(pages);
        let x = self.viewport.x_offset.saturating_sub(distance);
        if x < self.viewport.x_offset {
            self.viewport.x_offset = x;
            self.clamp_cursor_columns(false);
        } else {
            self.cursor.col = 0;
        }
        self.reveal_cursor();
    }

    /// Move down (or up) the current column to the `n`th cell whose text
    /// differs from the one before it, stopping early at the edge.
    pub fn skip_row_change(&mut self, n: usize, forward: bool) {
        if self.grid.is_degenerate() {
            return;
        }
        let col = self.cursor.col;
        let last = self.last_row();
        let mut row = self.cursor.row;
        let mut changes = 0;
        while changes < n {
            let next = match forward {
                true if row < last => row + 1,
                false if row > 0 => row - 1,
                _ => break,
            };
            if self.cell(Position::new(next, col)) != self.cell(Position::new(row, col)) {
                changes += 1;
            }
            row = next;
        }
        self.set_cursor(Position::new(row, col));
    }

    /// Same as [`Session::skip_row_change`] along the current row.
    pub fn skip_column_change(&mut self, n: usize, forward: bool) {
        if self.grid.is_degenerate() {
            return;
        }
        let row = self.cursor.row;
        let last = self.last_col();
        let mut col = self.cursor.col;
        let mut changes = 0;
        while changes < n {
            let next = match forward {
                true if col < last => col + 1,
                false if col > 0 => col - 1,
                _ => break,
            };
            if self.cell(Position::new(row, next)) != self.cell(Position::new(row, col)) {
                changes += 1;
            }
            col = next;
        }
        self.set_cursor(Position::new(row, col));
    }

    // ----- mark -----

    pub fn set_mark(&mut self) {
        self.mark = Some(self.cursor);
    }

    /// Returns false when no mark was set.
    pub fn return_to_mark(&mut self) -> bool {
        match self.mark {
            Some(mark) => {
                self.set_cursor(mark);
                true
            }
            None => false,
        }
    }

    // ----- sorting -----

    /// Sort by the cursor's column; the cursor stays on the same data row.
    pub fn sort_current_column(&mut self, comparator: Comparator, direction: Direction) {
        if self.grid.is_degenerate() {
            return;
        }
        let key = SortKey {
            column: self.cursor.col,
            direction,
            comparator,
        };
        let underlying = self.sort.underlying(self.cursor.row);
        self.sort = SortState::build(&self.grid, Some(key));
        if let Some(row) = underlying.and_then(|u| self.sort.display_of(u)) {
            self.cursor.row = row;
        }
        self.search.refresh(&self.grid, &self.sort);
        self.search.sync_to(self.cursor);
        debug!(column = key.column, ?direction, ?comparator, "sorted");
        self.reveal_cursor();
    }

    /// Show or hide the first source row as a fixed header.
    pub fn toggle_header(&mut self) {
        let enable = !self.grid.header_enabled();
        let underlying = self.sort.underlying(self.cursor.row);
        self.grid = self.grid.with_header(enable);
        self.sort = SortState::build(&self.grid, self.sort.key());
        self.layout.recompute(&self.grid);

        let shifted = underlying.map(|u| if enable { u.saturating_sub(1) } else { u + 1 });
        let row = shifted
            .and_then(|u| self.sort.display_of(u))
            .unwrap_or(self.cursor.row);
        self.search.refresh(&self.grid, &self.sort);
        self.set_cursor(Position::new(row, self.cursor.col));
        self.search.sync_to(self.cursor);
        debug!(header = enable, "header toggled");
    }

    // ----- search -----

    /// Incremental search step: rebuild matches for `query` and jump to the
    /// first match at or after `origin`. Returns the match count.
    pub fn search_from(&mut self, query: &str, origin: Position) -> usize {
        self.search.set_query(query, &self.grid, &self.sort);
        if let Some(pos) = self.search.jump_from(origin) {
            self.set_cursor(pos);
        }
        self.search.matches().len()
    }

    pub fn next_match(&mut self, n: usize) -> Option<Position> {
        let mut found = None;
        for _ in 0..n.max(1) {
            found = self.search.next_match(self.cursor);
        }
        if let Some(pos) = found {
            self.set_cursor(pos);
        }
        found
    }

    pub fn prev_match(&mut self, n: usize) -> Option<Position> {
        let mut found = None;
        for _ in 0..n.max(1) {
            found = self.search.prev_match(self.cursor);
        }
        if let Some(pos) = found {
            self.set_cursor(pos);
        }
        found
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Put the cursor back where it was without touching search state.
    pub fn restore_cursor(&mut self, pos: Position) {
        self.set_cursor(pos);
    }

    // ----- column layout -----

    /// With a count, switch to fixed widths of that size; otherwise cycle the
    /// width mode.
    pub fn toggle_width_mode(&mut self, width: Option<usize>) {
        match width {
            Some(w) => self.layout.set_fixed_width(w, &self.grid),
            None => self.layout.toggle_mode(&self.grid),
        }
        self.reveal_cursor();
    }

    pub fn resize_all_columns(&mut self, delta: isize) {
        self.layout.resize_all(delta, &self.grid);
        self.reveal_cursor();
    }

    pub fn resize_current_column(&mut self, delta: isize) {
        self.layout.resize_column(self.cursor.col, delta, &self.grid);
        self.reveal_cursor();
    }

    pub fn maximize_current_column(&mut self) {
        self.layout.maximize_column(self.cursor.col, &self.grid);
        self.reveal_cursor();
    }

    pub fn reset_current_column(&mut self) {
        self.layout.reset_column(self.cursor.col, &self.grid);
        self.reveal_cursor();
    }

    pub fn resize_gap(&mut self, delta: isize) {
        self.layout.resize_gap(delta);
        self.reveal_cursor();
    }

    // ----- internals -----

    fn last_row(&self) -> usize {
        self.data_row_count().saturating_sub(1)
    }

    fn last_col(&self) -> usize {
        self.column_count().saturating_sub(1)
    }

    fn clamp(&self, pos: Position) -> Position {
        if self.grid.is_degenerate() {
            return Position::default();
        }
        Position::new(pos.row.min(self.last_row()), pos.col.min(self.last_col()))
    }

    fn set_cursor(&mut self, pos: Position) {
        self.cursor = self.clamp(pos);
        self.reveal_cursor();
    }

    fn reveal_cursor(&mut self) {
        let header = self.header_enabled();
        self.viewport
            .ensure_visible(self.cursor, self.screen, header, &self.layout);
    }

    fn clamp_viewport(&mut self) {
        let max_top = Viewport::max_top(self.screen, self.header_enabled(), self.data_row_count());
        self.viewport.top = self.viewport.top.min(max_top);
        let max_x = Viewport::max_x_offset(self.screen, &self.layout);
        self.viewport.x_offset = self.viewport.x_offset.min(max_x);
    }

    fn clamp_cursor_rows(&mut self, top: usize, rows: usize) {
        let bottom = (top + rows - 1).min(self.last_row());
        self.cursor.row = self.cursor.row.clamp(top, bottom.max(top));
        self.cursor.row = self.cursor.row.min(self.last_row());
    }

    /// Pull the cursor into the columns fully shown after a horizontal page.
    /// When the view sits inside a column wider than the screen, step to the
    /// next column in the paging direction so the move is not undone.
    fn clamp_cursor_columns(&mut self, forward: bool) {
        let full = self.viewport.full_columns(self.screen, &self.layout);
        if full.is_empty() {
            let x = self.viewport.x_offset;
            self.cursor.col = if forward {
                (0..self.layout.column_count())
                    .find(|&col| self.layout.column_start(col) >= x)
                    .unwrap_or_else(|| self.last_col())
            } else {
                self.viewport.left_column(&self.layout)
            };
            return;
        }
        if self.cursor.col < full.start {
            self.cursor.col = full.start;
        } else if self.cursor.col >= full.end {
            self.cursor.col = full.end - 1;
        }
    }
}
