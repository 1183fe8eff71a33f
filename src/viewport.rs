use std::ops::Range;

use crate::grid::Position;
use crate::layout::ColumnLayout;

/// Size of the area the grid body is drawn into, header band included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub width: usize,
    pub height: usize,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
        }
    }
}

impl Screen {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Data rows that fit below the fixed header band.
    pub fn visible_rows(&self, header: bool) -> usize {
        self.height.saturating_sub(usize::from(header)).max(1)
    }

    pub fn visible_width(&self) -> usize {
        self.width.max(1)
    }
}

/// First visible data row and horizontal scroll offset in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub top: usize,
    pub x_offset: usize,
}

impl Viewport {
    /// Scroll just enough to bring `cursor` fully into view.
    pub fn ensure_visible(
        &mut self,
        cursor: Position,
        screen: Screen,
        header: bool,
        layout: &ColumnLayout,
    ) {
        let rows = screen.visible_rows(header);
        if cursor.row < self.top {
            self.top = cursor.row;
        } else if cursor.row >= self.top + rows {
            self.top = cursor.row + 1 - rows;
        }

        if layout.column_count() == 0 {
            self.x_offset = 0;
            return;
        }
        let width = screen.visible_width();
        let span = layout.column_span(cursor.col);
        if span.start < self.x_offset || span.len() > width {
            self.x_offset = span.start;
        } else if span.end > self.x_offset + width {
            self.x_offset = span.end - width;
        }
    }

    /// Rows currently rendered, as display indices.
    pub fn row_range(&self, screen: Screen, header: bool, data_rows: usize) -> Range<usize> {
        let end = (self.top + screen.visible_rows(header)).min(data_rows);
        self.top.min(end)..end
    }

    /// Largest useful `top` so the last page is full.
    pub fn max_top(screen: Screen, header: bool, data_rows: usize) -> usize {
        data_rows.saturating_sub(screen.visible_rows(header))
    }

    pub fn max_x_offset(screen: Screen, layout: &ColumnLayout) -> usize {
        layout.total_width().saturating_sub(screen.visible_width())
    }

    /// Column containing the left edge of the view.
    pub fn left_column(&self, layout: &ColumnLayout) -> usize {
        (0..layout.column_count())
            .find(|&col| layout.column_start(col + 1) > self.x_offset)
            .unwrap_or(0)
    }

    /// Columns with any part on screen.
    pub fn column_range(&self, screen: Screen, layout: &ColumnLayout) -> Range<usize> {
        let left = self.left_column(layout);
        let right_edge = self.x_offset + screen.visible_width();
        let end = (left..layout.column_count())
            .find(|&col| layout.column_start(col) >= right_edge)
            .unwrap_or(layout.column_count());
        left..end
    }

    /// Columns whose cell text is entirely on screen. Empty when the view
    /// lies inside a column wider than the screen.
    pub fn full_columns(&self, screen: Screen, layout: &ColumnLayout) -> Range<usize> {
        let right_edge = self.x_offset + screen.visible_width();
        let visible = self.column_range(screen, layout);
        let full: Vec<usize> = visible
            .clone()
            .filter(|&col| {
                let span = layout.column_span(col);
                span.start >= self.x_offset && span.end <= right_edge
            })
            .collect();
        match (full.first(), full.last()) {
            (Some(&first), Some(&last)) => first..last + 1,
            _ => visible.start..visible.start,
        }
    }

    /// Is the cell text of `pos` fully on screen?
    pub fn contains(
        &self,
        pos: Position,
        screen: Screen,
        header: bool,
        layout: &ColumnLayout,
    ) -> bool {
        let rows = screen.visible_rows(header);
        let row_ok = pos.row >= self.top && pos.row < self.top + rows;
        let span = layout.column_span(pos.col);
        let width = screen.visible_width();
        let col_ok = if span.len() > width {
            span.start == self.x_offset
        } else {
            span.start >= self.x_offset && span.end <= self.x_offset + width
        };
        row_ok && col_ok
    }
}
