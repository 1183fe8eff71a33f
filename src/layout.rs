use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use serde::Deserialize;
use unicode_width::UnicodeWidthStr;

use crate::grid::Grid;

pub const DEFAULT_COLUMN_WIDTH: usize = 20;
pub const DEFAULT_COLUMN_GAP: usize = 2;
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 80;
const MIN_FIXED_WIDTH: usize = 1;

/// Width policy applied to every column without an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthMode {
    Fixed,
    #[serde(alias = "max")]
    MaxContent,
    #[serde(alias = "mode")]
    ModalContent,
}

impl WidthMode {
    pub fn cycle(self) -> Self {
        match self {
            WidthMode::Fixed => WidthMode::MaxContent,
            WidthMode::MaxContent => WidthMode::ModalContent,
            WidthMode::ModalContent => WidthMode::Fixed,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WidthMode::Fixed => "fixed",
            WidthMode::MaxContent => "max",
            WidthMode::ModalContent => "mode",
        }
    }
}

/// User-facing layout knobs; the part of a layout that survives a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSettings {
    pub mode: WidthMode,
    pub default_width: usize,
    pub overrides: BTreeMap<usize, usize>,
    pub gap: usize,
    pub max_width: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            mode: WidthMode::Fixed,
            default_width: DEFAULT_COLUMN_WIDTH,
            overrides: BTreeMap::new(),
            gap: DEFAULT_COLUMN_GAP,
            max_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

/// Display width of a cell as rendered on one line.
pub fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Per-column widths for `grid` under `settings`. Overrides win in every mode.
pub fn compute_widths(grid: &Grid, settings: &LayoutSettings) -> Vec<usize> {
    (0..grid.column_count())
        .map(|col| {
            if let Some(&w) = settings.overrides.get(&col) {
                return w;
            }
            match settings.mode {
                WidthMode::Fixed => settings.default_width,
                WidthMode::MaxContent => max_content_width(grid, col).min(settings.max_width),
                WidthMode::ModalContent => modal_content_width(grid, col).min(settings.max_width),
            }
        })
        .collect()
}

/// Longest rendered cell in a column (header included when enabled).
pub fn max_content_width(grid: &Grid, col: usize) -> usize {
    grid.column_cells(col).map(text_width).max().unwrap_or(0)
}

/// Most frequent cell width in a column; ties go to the smaller width.
pub fn modal_content_width(grid: &Grid, col: usize) -> usize {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for cell in grid.column_cells(col) {
        *counts.entry(text_width(cell)).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(wa, ca), (wb, cb)| ca.cmp(cb).then(wb.cmp(wa)))
        .map(|(w, _)| w)
        .unwrap_or(0)
}

/// Resolved column geometry for one grid.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    settings: LayoutSettings,
    widths: Vec<usize>,
}

impl ColumnLayout {
    pub fn new(settings: LayoutSettings, grid: &Grid) -> Self {
        let widths = compute_widths(grid, &settings);
        Self { settings, widths }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn mode(&self) -> WidthMode {
        self.settings.mode
    }

    pub fn gap(&self) -> usize {
        self.settings.gap
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn width(&self, col: usize) -> usize {
        self.widths.get(col).copied().unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.widths.len()
    }

    /// Character offset where `col` starts.
    pub fn column_start(&self, col: usize) -> usize {
        self.widths
            .iter()
            .take(col)
            .map(|w| w + self.settings.gap)
            .sum()
    }

    /// Character range covered by the cell text of `col` (gap excluded).
    pub fn column_span(&self, col: usize) -> Range<usize> {
        let start = self.column_start(col);
        start..start + self.width(col)
    }

    /// Width of the whole table including the trailing gap.
    pub fn total_width(&self) -> usize {
        self.column_start(self.widths.len())
    }

    pub fn recompute(&mut self, grid: &Grid) {
        self.widths = compute_widths(grid, &self.settings);
    }

    pub fn toggle_mode(&mut self, grid: &Grid) {
        self.settings.mode = self.settings.mode.cycle();
        self.settings.overrides.clear();
        self.recompute(grid);
    }

    pub fn set_fixed_width(&mut self, width: usize, grid: &Grid) {
        self.settings.mode = WidthMode::Fixed;
        self.settings.default_width = width.max(MIN_FIXED_WIDTH);
        self.settings.overrides.clear();
        self.recompute(grid);
    }

    /// Grow or shrink every column without an override; switches to `Fixed`.
    pub fn resize_all(&mut self, delta: isize, grid: &Grid) {
        self.settings.mode = WidthMode::Fixed;
        self.settings.default_width = apply_delta(self.settings.default_width, delta);
        self.recompute(grid);
    }

    pub fn resize_column(&mut self, col: usize, delta: isize, grid: &Grid) {
        if col >= self.widths.len() {
            return;
        }
        let current = self.width(col);
        self.settings
            .overrides
            .insert(col, apply_delta(current, delta));
        self.recompute(grid);
    }

    /// Pin `col` to its longest content, ignoring the content cap.
    pub fn maximize_column(&mut self, col: usize, grid: &Grid) {
        if col >= self.widths.len() {
            return;
        }
        self.settings
            .overrides
            .insert(col, max_content_width(grid, col));
        self.recompute(grid);
    }

    pub fn reset_column(&mut self, col: usize, grid: &Grid) {
        self.settings.overrides.remove(&col);
        self.recompute(grid);
    }

    pub fn resize_gap(&mut self, delta: isize) {
        self.settings.gap = self.settings.gap.saturating_add_signed(delta);
    }
}

fn apply_delta(width: usize, delta: isize) -> usize {
    width.saturating_add_signed(delta).max(MIN_FIXED_WIDTH)
}
