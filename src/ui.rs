use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, AppMode};
use crate::grid::{Position, column_label};
use crate::layout::text_width;
use crate::sort::Direction as SortDirection;
use crate::viewport::Screen;

const HELP: &[(&str, &str)] = &[
    ("h j k l / arrows", "move (count repeats)"),
    ("J K / PgDn PgUp / ^F ^B", "page down / up"),
    ("H L", "page left / right"),
    ("g G / Home End", "first / last row; N g, N G go to line N"),
    ("0 ^ $  N |", "first / last column; column N"),
    ("m / Insert", "mark position"),
    ("' / Delete", "return to mark"),
    ("Enter", "show full cell"),
    ("/ n p", "search, next / previous match"),
    ("t", "toggle header row"),
    ("s S", "sort column, lexicographic asc / desc"),
    ("a A", "sort column, natural asc / desc"),
    ("# @", "sort column, numeric asc / desc"),
    ("] [  } {", "skip to next change down / up, right / left"),
    ("< >", "narrow / widen all columns"),
    (", .", "narrow / widen current column"),
    ("- +", "narrow / widen column gap"),
    ("w  N w", "cycle width mode; fixed width N"),
    ("C c", "maximize / reset current column"),
    ("y", "copy cell to clipboard"),
    ("r", "reload"),
    ("? / F1", "this help"),
    ("q Q", "quit"),
];

struct Areas {
    info: Rect,
    grid: Rect,
    status: Rect,
}

fn split(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(area);
    Areas {
        info: chunks[0],
        grid: chunks[1],
        status: chunks[2],
    }
}

/// Size of the grid body for a terminal of `area`.
pub fn grid_screen(area: Rect) -> Screen {
    let grid = split(area).grid;
    Screen::new(usize::from(grid.width), usize::from(grid.height))
}

pub fn draw(f: &mut Frame, app: &App) {
    let areas = split(f.size());
    draw_info(f, areas.info, app);
    draw_grid(f, areas.grid, app);
    draw_status(f, areas.status, app);

    match app.mode {
        AppMode::Help => draw_help(f),
        AppMode::CellView => draw_cell(f, app),
        _ => {}
    }
}

fn draw_info(f: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let pos = session.cursor();
    let mut spans = vec![Span::styled(
        format!("{}{}", column_label(pos.col), pos.row + 1),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(key) = session.sort_state().key() {
        let arrow = match key.direction {
            SortDirection::Ascending => '↑',
            SortDirection::Descending => '↓',
        };
        spans.push(Span::styled(
            format!(" [{}{arrow} {}]", column_label(key.column), key.comparator.display_name()),
            Style::default().fg(Color::Cyan),
        ));
    }
    spans.push(Span::raw(": "));
    spans.push(Span::raw(single_line(session.current_cell_text().unwrap_or(""))));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_grid(f: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    if session.column_count() == 0 {
        f.render_widget(Paragraph::new("(no data)"), area);
        return;
    }

    let screen = session.screen();
    let layout = session.layout();
    let viewport = session.viewport();
    let columns = viewport.column_range(screen, layout);
    let first_start = layout.column_start(columns.start);
    let skip = viewport.x_offset.saturating_sub(first_start);
    let width = screen.visible_width();

    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
    let match_style = Style::default().bg(Color::Yellow).fg(Color::Black);

    let mut lines = Vec::with_capacity(usize::from(area.height));
    if let Some(header) = session.grid().header() {
        let segments = columns
            .clone()
            .map(|col| {
                let text = header.get(col).map(String::as_str).unwrap_or("");
                (fit(text, layout.width(col), &app.trunc_char), header_style)
            })
            .collect::<Vec<_>>();
        lines.push(render_line(segments, layout.gap(), skip, width));
    }

    let cursor = session.cursor();
    let rows = viewport.row_range(screen, session.header_enabled(), session.data_row_count());
    for row in rows {
        let Some(cells) = session.display_row(row) else {
            continue;
        };
        let segments = columns
            .clone()
            .map(|col| {
                let pos = Position::new(row, col);
                let text = cells.get(col).map(String::as_str).unwrap_or("");
                let style = if pos == cursor {
                    cursor_style
                } else if is_match(app, pos) {
                    match_style
                } else {
                    Style::default()
                };
                (fit(text, layout.width(col), &app.trunc_char), style)
            })
            .collect::<Vec<_>>();
        lines.push(render_line(segments, layout.gap(), skip, width));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn is_match(app: &App, pos: Position) -> bool {
    let search = app.session.search();
    // matches are kept in row-major order
    !search.query().is_empty()
        && search
            .matches()
            .binary_search_by(|m| (m.row, m.col).cmp(&(pos.row, pos.col)))
            .is_ok()
}

/// Lay cells out left to right with `gap` spaces between them, then drop the
/// first `skip` display columns and clip to `width`.
fn render_line(
    segments: Vec<(String, Style)>,
    gap: usize,
    skip: usize,
    width: usize,
) -> Line<'static> {
    let mut spans = Vec::new();
    let mut to_skip = skip;
    let mut room = width;
    let spacer = " ".repeat(gap);
    for (text, style) in segments {
        for (piece, piece_style) in [(text, style), (spacer.clone(), Style::default())] {
            if room == 0 {
                break;
            }
            let mut out = String::new();
            for ch in piece.chars() {
                let w = ch.width().unwrap_or(0);
                if to_skip > 0 {
                    // a wide char split by the left edge becomes padding
                    if w > to_skip {
                        out.push_str(&" ".repeat(w - to_skip));
                        room = room.saturating_sub(w - to_skip);
                        to_skip = 0;
                    } else {
                        to_skip -= w;
                    }
                    continue;
                }
                if w > room {
                    room = 0;
                    break;
                }
                out.push(ch);
                room -= w;
            }
            if !out.is_empty() {
                spans.push(Span::styled(out, piece_style));
            }
        }
    }
    Line::from(spans)
}

/// Cell text padded or truncated to exactly `width` display columns.
fn fit(text: &str, width: usize, trunc: &str) -> String {
    let text = single_line(text);
    let full = text_width(&text);
    if full <= width {
        return format!("{text}{}", " ".repeat(width - full));
    }
    let marker = if text_width(trunc) <= width { trunc } else { "" };
    let budget = width - text_width(marker);
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(marker);
    used += text_width(marker);
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let mode = match app.mode {
        AppMode::Normal => "NORMAL",
        AppMode::Search { .. } => "SEARCH",
        AppMode::Help => "HELP",
        AppMode::CellView => "CELL",
    };
    let session = &app.session;
    let message = match &app.mode {
        AppMode::Search { input, .. } => format!("/{input}_"),
        _ => app.status.clone(),
    };
    let mut spans = vec![
        Span::styled(
            format!("[{mode}] "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(message),
    ];
    if let Some(n) = app.pending_count() {
        spans.push(Span::styled(format!("  {n}"), Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::raw(format!(
        "  | row {}/{} col {}/{} | {}",
        (session.cursor().row + 1).min(session.data_row_count()),
        session.data_row_count(),
        (session.cursor().col + 1).min(session.column_count()),
        session.column_count(),
        session.layout().mode().display_name(),
    )));
    let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::TOP));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(70, 80, f.size());
    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(
                    format!("{keys:<26}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*what),
            ])
        })
        .collect();
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Keys (any key closes)"))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn draw_cell(f: &mut Frame, app: &App) {
    let area = centered_rect(80, 60, f.size());
    let pos = app.session.cursor();
    let text = app.session.current_cell_text().unwrap_or("");
    let title = format!("{}{} (any key closes)", column_label(pos.col), pos.row + 1);
    let p = Paragraph::new(text.to_string())
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4, "…"), "ab  ");
        assert_eq!(fit("abcdef", 4, "…"), "abc…");
        assert_eq!(fit("abcdef", 4, ""), "abcd");
        assert_eq!(fit("abc", 0, "…"), "");
        assert_eq!(fit("a\nb", 3, "…"), "a b");
        // wide characters never straddle the boundary
        assert_eq!(fit("日本語", 4, "…"), "日… ");
    }

    #[test]
    fn lines_are_clipped_horizontally() {
        let segments = vec![
            ("aaaa".to_string(), Style::default()),
            ("bbbb".to_string(), Style::default()),
        ];
        assert_eq!(text(&render_line(segments.clone(), 1, 0, 20)), "aaaa bbbb ");
        assert_eq!(text(&render_line(segments.clone(), 1, 2, 20)), "aa bbbb ");
        assert_eq!(text(&render_line(segments, 1, 2, 5)), "aa bb");
    }

    #[test]
    fn grid_screen_leaves_room_for_bars() {
        let screen = grid_screen(Rect::new(0, 0, 100, 30));
        assert_eq!(screen, Screen::new(100, 27));
    }
}
