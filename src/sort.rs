use std::cmp::Ordering;

use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lexicographic,
    Natural,
    Numeric,
}

impl Comparator {
    pub fn display_name(self) -> &'static str {
        match self {
            Comparator::Lexicographic => "lexicographic",
            Comparator::Natural => "natural",
            Comparator::Numeric => "numeric",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub direction: Direction,
    pub comparator: Comparator,
}

/// Display order of the data rows. `order[display] == underlying`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    order: Vec<usize>,
    key: Option<SortKey>,
}

impl SortState {
    pub fn identity(len: usize) -> Self {
        Self {
            order: (0..len).collect(),
            key: None,
        }
    }

    /// Sort `grid` by `key`. An unusable key yields the identity order.
    pub fn build(grid: &Grid, key: Option<SortKey>) -> Self {
        let key = key.filter(|k| k.column < grid.column_count() && grid.data_row_count() > 0);
        match key {
            Some(k) => Self {
                order: sort(grid, k),
                key: Some(k),
            },
            None => Self::identity(grid.data_row_count()),
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn key(&self) -> Option<SortKey> {
        self.key
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn underlying(&self, display_row: usize) -> Option<usize> {
        self.order.get(display_row).copied()
    }

    pub fn display_of(&self, underlying: usize) -> Option<usize> {
        self.order.iter().position(|&u| u == underlying)
    }
}

/// Stable permutation of data-row indices ordered by `key`.
///
/// The direction reverses the comparator result only; equal rows keep their
/// original relative order either way. Numeric sorts are the one exception:
/// only the order among numbers is reversed, and unparseable cells stay last
/// in both directions.
pub fn sort(grid: &Grid, key: SortKey) -> Vec<usize> {
    let mut order: Vec<usize> = (0..grid.data_row_count()).collect();
    let cell = |row: usize| grid.data_cell(row, key.column).unwrap_or("");
    order.sort_by(|&a, &b| directed_cmp(key, cell(a), cell(b)));
    order
}

/// Comparator result with the direction applied. Unparseable numeric cells
/// are placed after numbers before the direction is considered.
fn directed_cmp(key: SortKey, a: &str, b: &str) -> Ordering {
    let directed = |ord: Ordering| match key.direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    };
    if key.comparator == Comparator::Numeric {
        // unparseable cells stay at the end in both directions
        return match (parse_number(a), parse_number(b)) {
            (Some(x), Some(y)) => directed(x.total_cmp(&y)),
            (x, y) => x.is_none().cmp(&y.is_none()),
        };
    }
    directed(compare(key.comparator, a, b))
}

pub fn compare(comparator: Comparator, a: &str, b: &str) -> Ordering {
    match comparator {
        Comparator::Lexicographic => a.cmp(b),
        Comparator::Natural => natural_cmp(a, b),
        Comparator::Numeric => numeric_cmp(a, b),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn runs(s: &str) -> Vec<Run<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, ch) in s.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_run(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_run(&s[start..], prev));
    }
    out
}

fn make_run(text: &str, digits: bool) -> Run<'_> {
    if digits {
        Run::Digits(text)
    } else {
        Run::Text(text)
    }
}

/// Compare two ASCII digit strings by magnitude, without size limits.
fn digits_cmp(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ra = runs(a);
    let rb = runs(b);
    for (x, y) in ra.iter().zip(rb.iter()) {
        let ord = match (x, y) {
            (Run::Digits(x), Run::Digits(y)) => digits_cmp(x, y),
            (Run::Text(x), Run::Text(y)) => x.cmp(y),
            (Run::Digits(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ra.len().cmp(&rb.len())
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parseable values by magnitude; unparseable values after all of them.
pub fn numeric_cmp(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[&str]) -> Grid {
        Grid::new(values.iter().map(|v| vec![v.to_string()]).collect(), false)
    }

    fn key(direction: Direction, comparator: Comparator) -> SortKey {
        SortKey {
            column: 0,
            direction,
            comparator,
        }
    }

    fn sorted_values(grid: &Grid, key: SortKey) -> Vec<String> {
        sort(grid, key)
            .into_iter()
            .map(|i| grid.data_cell(i, 0).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn natural_orders_digit_runs_numerically() {
        let g = column(&["item2", "item10", "item1"]);
        assert_eq!(
            sorted_values(&g, key(Direction::Ascending, Comparator::Natural)),
            ["item1", "item2", "item10"]
        );
        assert_eq!(
            sorted_values(&g, key(Direction::Ascending, Comparator::Lexicographic)),
            ["item1", "item10", "item2"]
        );
    }

    #[test]
    fn natural_handles_huge_numbers_and_prefixes() {
        assert_eq!(
            natural_cmp("v123456789012345678901234567890", "v99"),
            Ordering::Greater
        );
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
        assert_eq!(natural_cmp("file", "file1"), Ordering::Less);
        assert_eq!(natural_cmp("1abc", "abc"), Ordering::Less);
        assert_eq!(natural_cmp("", ""), Ordering::Equal);
    }

    #[test]
    fn numeric_puts_unparseable_last_in_original_order() {
        let g = column(&["3", "abc", "1", "xyz"]);
        assert_eq!(
            sorted_values(&g, key(Direction::Ascending, Comparator::Numeric)),
            ["1", "3", "abc", "xyz"]
        );
        assert_eq!(
            sorted_values(&g, key(Direction::Descending, Comparator::Numeric)),
            ["3", "1", "abc", "xyz"]
        );
    }

    #[test]
    fn numeric_accepts_whitespace_signs_and_exponents() {
        let g = column(&[" 2.5 ", "-1", "+10", "1e2", "NaN"]);
        assert_eq!(
            sorted_values(&g, key(Direction::Ascending, Comparator::Numeric)),
            ["-1", " 2.5 ", "+10", "1e2", "NaN"]
        );
    }

    #[test]
    fn sorting_is_idempotent() {
        let g = column(&["b", "a", "c", "a", "b"]);
        let k = key(Direction::Descending, Comparator::Lexicographic);
        let once = sort(&g, k);
        let sorted = Grid::new(
            once.iter()
                .map(|&i| vec![g.data_cell(i, 0).unwrap_or_default().to_string()])
                .collect(),
            false,
        );
        let twice = sort(&sorted, k);
        assert_eq!(twice, (0..5).collect::<Vec<_>>());
        assert_eq!(sort(&g, k), once);
    }

    #[test]
    fn descending_keeps_ties_in_original_order() {
        let g = column(&["1", "2", "1", "2"]);
        assert_eq!(
            sort(&g, key(Direction::Ascending, Comparator::Numeric)),
            vec![0, 2, 1, 3]
        );
        assert_eq!(
            sort(&g, key(Direction::Descending, Comparator::Numeric)),
            vec![1, 3, 0, 2]
        );
    }

    #[test]
    fn build_ignores_unusable_keys() {
        let g = column(&["b", "a"]);
        let bad = SortKey {
            column: 5,
            ..key(Direction::Ascending, Comparator::Lexicographic)
        };
        let state = SortState::build(&g, Some(bad));
        assert_eq!(state.order(), &[0, 1]);
        assert!(state.key().is_none());

        let header_only = Grid::new(vec![vec!["h".into()]], true);
        let state = SortState::build(
            &header_only,
            Some(key(Direction::Ascending, Comparator::Natural)),
        );
        assert!(state.is_empty());
    }

    #[test]
    fn header_row_is_not_sorted() {
        let g = Grid::new(
            vec![vec!["z".into()], vec!["b".into()], vec!["a".into()]],
            true,
        );
        let state = SortState::build(&g, Some(key(Direction::Ascending, Comparator::Lexicographic)));
        assert_eq!(state.order(), &[1, 0]);
        assert_eq!(state.display_of(0), Some(1));
    }
}
