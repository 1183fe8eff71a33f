/// A cell coordinate in display order (post-sort, header excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Spreadsheet-style column name: A..Z, AA, AB, ...
pub fn column_label(col: usize) -> String {
    let mut n = col + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// Rectangular table of text cells. Row 0 is the header iff `header_enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    columns: usize,
    header_enabled: bool,
}

impl Grid {
    /// Build a grid, padding short rows with empty cells so every row has the
    /// width of the longest one.
    pub fn new(mut rows: Vec<Vec<String>>, header_enabled: bool) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(columns, String::new());
        }
        Self {
            rows,
            columns,
            header_enabled,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn header_enabled(&self) -> bool {
        self.header_enabled
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(self.header_offset())
    }

    /// True when there is no cell the cursor could land on.
    pub fn is_degenerate(&self) -> bool {
        self.data_row_count() == 0 || self.columns == 0
    }

    pub fn header(&self) -> Option<&[String]> {
        if self.header_enabled {
            self.rows.first().map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Data row by underlying index (header excluded).
    pub fn data_row(&self, index: usize) -> Option<&[String]> {
        self.rows
            .get(index + self.header_offset())
            .map(Vec::as_slice)
    }

    pub fn data_cell(&self, index: usize, col: usize) -> Option<&str> {
        self.data_row(index)
            .and_then(|row| row.get(col))
            .map(String::as_str)
    }

    /// All cells of a column that are rendered: the header (when enabled) and
    /// every data row.
    pub fn column_cells(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(col).map(String::as_str))
    }

    /// Same rows with the header flag flipped.
    pub fn with_header(&self, header_enabled: bool) -> Self {
        Self {
            rows: self.rows.clone(),
            columns: self.columns,
            header_enabled,
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn header_offset(&self) -> usize {
        usize::from(self.header_enabled && !self.rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn short_rows_are_padded_to_longest() {
        let grid = Grid::new(rows(&[&["a"], &["b", "c", "d"], &[]]), false);
        assert_eq!(grid.column_count(), 3);
        assert!(grid.rows().iter().all(|r| r.len() == 3));
        assert_eq!(grid.data_cell(0, 2), Some(""));
    }

    #[test]
    fn header_is_excluded_from_data_rows() {
        let grid = Grid::new(rows(&[&["name", "age"], &["bob", "4"]]), true);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.data_row_count(), 1);
        assert_eq!(grid.header().map(|h| h[0].as_str()), Some("name"));
        assert_eq!(grid.data_cell(0, 0), Some("bob"));

        let flat = grid.with_header(false);
        assert_eq!(flat.data_row_count(), 2);
        assert_eq!(flat.data_cell(0, 0), Some("name"));
        assert!(flat.header().is_none());
    }

    #[test]
    fn empty_and_header_only_grids_are_degenerate() {
        assert!(Grid::new(Vec::new(), true).is_degenerate());
        assert!(Grid::new(rows(&[&["only", "header"]]), true).is_degenerate());
        assert!(!Grid::new(rows(&[&["x"]]), false).is_degenerate());
    }

    #[test]
    fn column_labels() {
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "AA");
        assert_eq!(column_label(27), "AB");
        assert_eq!(column_label(701), "ZZ");
        assert_eq!(column_label(702), "AAA");
    }
}
