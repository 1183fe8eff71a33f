use std::io::Write;

use tabgrid::grid::{Grid, Position};
use tabgrid::layout::{LayoutSettings, WidthMode, max_content_width};
use tabgrid::loader::{self, LoadOptions, Source};
use tabgrid::session::Session;
use tabgrid::sort::{Comparator, Direction, SortKey, SortState, sort};
use tabgrid::viewport::Screen;

fn column(values: &[&str]) -> Grid {
    Grid::new(values.iter().map(|v| vec![v.to_string()]).collect(), false)
}

fn values(grid: &Grid, order: &[usize]) -> Vec<String> {
    order
        .iter()
        .filter_map(|&u| grid.data_cell(u, 0))
        .map(str::to_string)
        .collect()
}

fn key(comparator: Comparator, direction: Direction) -> SortKey {
    SortKey {
        column: 0,
        direction,
        comparator,
    }
}

#[test]
fn natural_sort_orders_embedded_numbers() {
    let grid = column(&["item2", "item10", "item1"]);
    let order = sort(&grid, key(Comparator::Natural, Direction::Ascending));
    assert_eq!(values(&grid, &order), ["item1", "item2", "item10"]);

    let lexical = sort(&grid, key(Comparator::Lexicographic, Direction::Ascending));
    assert_eq!(values(&grid, &lexical), ["item1", "item10", "item2"]);
}

#[test]
fn numeric_sort_puts_unparseable_cells_last() {
    let grid = column(&["10", "n/a", "-2.5", "", "3"]);
    let asc = sort(&grid, key(Comparator::Numeric, Direction::Ascending));
    assert_eq!(values(&grid, &asc), ["-2.5", "3", "10", "n/a", ""]);
}

#[test]
fn sorting_is_idempotent_and_reversal_is_stable() {
    let grid = Grid::new(
        [["b", "1"], ["a", "2"], ["b", "3"], ["a", "4"]]
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
        false,
    );
    let k = key(Comparator::Lexicographic, Direction::Ascending);
    let once = SortState::build(&grid, Some(k));
    let twice = SortState::build(&grid, Some(k));
    assert_eq!(once, twice);
    assert_eq!(once.order(), &[1, 3, 0, 2]);

    let desc = SortState::build(&grid, Some(key(Comparator::Lexicographic, Direction::Descending)));
    // ties keep their original order in both directions
    assert_eq!(desc.order(), &[0, 2, 1, 3]);
}

#[test]
fn search_cycle_closes() {
    let grid = column(&["x", "y", "xx", "z", "x"]);
    let mut session = Session::new(
        grid,
        LayoutSettings::default(),
        Position::default(),
        Screen::new(40, 4),
    );
    let found = session.search_from("x", Position::default());
    assert_eq!(found, 3);
    let start = session.cursor();
    for _ in 0..found {
        session.next_match(1);
        assert!(session.is_visible(session.cursor()));
    }
    assert_eq!(session.cursor(), start);
    session.prev_match(found);
    assert_eq!(session.cursor(), start);
}

#[test]
fn cursor_stays_visible_through_mixed_commands() {
    let rows: Vec<Vec<String>> = (0..200)
        .map(|r| (0..30).map(|c| "v".repeat((r * 7 + c * 3) % 17)).collect())
        .collect();
    let mut s = Session::new(
        Grid::new(rows, true),
        LayoutSettings {
            mode: WidthMode::MaxContent,
            ..LayoutSettings::default()
        },
        Position::default(),
        Screen::new(60, 15),
    );

    let steps: Vec<Box<dyn Fn(&mut Session)>> = vec![
        Box::new(|s| s.move_down(37)),
        Box::new(|s| s.page_right(2)),
        Box::new(|s| s.resize_current_column(40)),
        Box::new(|s| s.goto_bottom()),
        Box::new(|s| s.line_end()),
        Box::new(|s| s.toggle_width_mode(None)),
        Box::new(|s| s.page_up(3)),
        Box::new(|s| s.sort_current_column(Comparator::Natural, Direction::Descending)),
        Box::new(|s| s.set_screen(Screen::new(25, 6))),
        Box::new(|s| s.resize_gap(9)),
        Box::new(|s| s.toggle_header()),
        Box::new(|s| s.skip_row_change(5, false)),
        Box::new(|s| s.page_left(1)),
        Box::new(|s| s.maximize_current_column()),
        Box::new(|s| s.resize_all_columns(-100)),
        Box::new(|s| s.page_down(50)),
    ];
    for step in &steps {
        step(&mut s);
        assert!(
            s.is_visible(s.cursor()),
            "cursor {:?} hidden by {:?}",
            s.cursor(),
            s.viewport()
        );
    }
}

#[test]
fn reload_of_unchanged_file_preserves_view() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "id;name").expect("write");
    for i in 0..40 {
        writeln!(file, "{};name{}", 40 - i, i % 7).expect("write");
    }
    let source = Source::File(file.path().to_path_buf());
    let options = LoadOptions::default();

    let mut s = Session::new(
        loader::load_grid(&source, &options).expect("load"),
        LayoutSettings::default(),
        Position::new(3, 1),
        Screen::new(30, 8),
    );
    s.sort_current_column(Comparator::Natural, Direction::Ascending);
    s.move_down(20);
    s.resize_current_column(-5);

    let r = s.reloaded(loader::load(&source, &options).expect("reload"));
    assert_eq!(r.cursor(), s.cursor());
    assert_eq!(r.sort_state(), s.sort_state());
    assert_eq!(r.layout().widths(), s.layout().widths());
    assert_eq!(r.viewport(), s.viewport());
    assert_eq!(r.current_cell_text(), s.current_cell_text());
}

#[test]
fn maximize_then_reset_round_trip() {
    let grid = Grid::new(
        vec![
            vec!["short".to_string(), "a much longer header".to_string()],
            vec!["x".to_string(), "y".to_string()],
        ],
        true,
    );
    let mut s = Session::new(
        grid.clone(),
        LayoutSettings::default(),
        Position::new(0, 1),
        Screen::default(),
    );
    let before = s.layout().widths().to_vec();
    s.maximize_current_column();
    assert_eq!(s.layout().width(1), max_content_width(&grid, 1));
    s.reset_current_column();
    assert_eq!(s.layout().widths(), before.as_slice());
}
