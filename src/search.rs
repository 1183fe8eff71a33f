use crate::grid::{Grid, Position};
use crate::sort::SortState;

/// Every cell containing `query`, row-major over the display order.
pub fn search(grid: &Grid, sort: &SortState, query: &str) -> Vec<Position> {
    if query.is_empty() {
        return Vec::new();
    }
    let mut matches = Vec::new();
    for (display_row, &underlying) in sort.order().iter().enumerate() {
        let Some(row) = grid.data_row(underlying) else {
            continue;
        };
        for (col, cell) in row.iter().enumerate() {
            if cell.contains(query) {
                matches.push(Position::new(display_row, col));
            }
        }
    }
    matches
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    query: String,
    matches: Vec<Position>,
    current: Option<usize>,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[Position] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_match(&self) -> Option<Position> {
        self.current.and_then(|i| self.matches.get(i).copied())
    }

    /// Replace the query and rebuild matches. The current match is cleared.
    pub fn set_query(&mut self, query: &str, grid: &Grid, sort: &SortState) {
        self.query = query.to_string();
        self.refresh(grid, sort);
    }

    /// Rebuild matches for the current query against a new order or grid.
    pub fn refresh(&mut self, grid: &Grid, sort: &SortState) {
        self.matches = search(grid, sort, &self.query);
        self.current = None;
    }

    /// Make the match at `pos` current, if there is one.
    pub fn sync_to(&mut self, pos: Position) {
        self.current = self.matches.iter().position(|&m| m == pos);
    }

    /// First match at or after `from` in traversal order, wrapping.
    pub fn jump_from(&mut self, from: Position) -> Option<Position> {
        if self.matches.is_empty() {
            return None;
        }
        let idx = self
            .matches
            .iter()
            .position(|&m| (m.row, m.col) >= (from.row, from.col))
            .unwrap_or(0);
        self.current = Some(idx);
        self.current_match()
    }

    /// Advance cyclically. Without a current match, picks the first one after
    /// `cursor`.
    pub fn next_match(&mut self, cursor: Position) -> Option<Position> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let idx = match self.current {
            Some(i) => (i + 1) % len,
            None => self
                .matches
                .iter()
                .position(|&m| (m.row, m.col) > (cursor.row, cursor.col))
                .unwrap_or(0),
        };
        self.current = Some(idx);
        self.current_match()
    }

    /// Step back cyclically. Without a current match, picks the last one before
    /// `cursor`.
    pub fn prev_match(&mut self, cursor: Position) -> Option<Position> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let idx = match self.current {
            Some(i) => (i + len - 1) % len,
            None => self
                .matches
                .iter()
                .rposition(|&m| (m.row, m.col) < (cursor.row, cursor.col))
                .unwrap_or(len - 1),
        };
        self.current = Some(idx);
        self.current_match()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
