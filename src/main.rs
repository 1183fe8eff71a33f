use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{backend::CrosstermBackend, prelude::*};
use tracing::{info, warn};

use tabgrid::app::App;
use tabgrid::config::{Config, WidthSpec};
use tabgrid::layout::LayoutSettings;
use tabgrid::loader::{self, Encoding, LoadOptions, Source};
use tabgrid::logging;
use tabgrid::session::Session;
use tabgrid::ui;
use tabgrid::watcher::FileWatcher;

#[derive(Parser, Debug)]
#[command(author, version, about = "Spreadsheet-like viewer for CSV and other delimited files")]
struct Args {
    /// File to view (`-` reads standard input), optionally preceded by
    /// `+ROW[:COL]` to start there
    #[arg(value_name = "FILE", required = true, num_args = 1..=2, allow_hyphen_values = true)]
    targets: Vec<String>,

    /// Input encoding: auto, utf-8 or latin-1
    #[arg(short = 'e', long)]
    encoding: Option<String>,

    /// Field delimiter (sniffed when omitted)
    #[arg(short = 'd', long)]
    delimiter: Option<String>,

    /// Quote character
    #[arg(short = 'q', long = "quote-char")]
    quote_char: Option<String>,

    /// Starting position as ROW[,COL], 1-based
    #[arg(short = 's', long = "start-pos")]
    start_pos: Option<String>,

    /// Column width: a number, `max` or `mode`
    #[arg(short = 'w', long)]
    width: Option<WidthSpec>,

    /// Spaces between columns
    #[arg(long)]
    gap: Option<usize>,

    /// Upper bound for content-derived column widths
    #[arg(long = "max-width")]
    max_width: Option<usize>,

    /// Marker drawn at the end of truncated cells
    #[arg(long = "trunc-char")]
    trunc_char: Option<String>,

    /// Treat the first row as data instead of a header
    #[arg(long = "no-header")]
    no_header: bool,

    /// Search for this text on startup
    #[arg(short = 'S', long)]
    search: Option<String>,

    /// Reload when the file changes on disk
    #[arg(long)]
    watch: bool,

    /// Config file (default: <config dir>/tabgrid/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file (default: <cache dir>/tabgrid/tabgrid.log)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

/// Separate the classic `+ROW[:COL]` argument from the file argument.
fn split_targets(targets: &[String]) -> Result<(String, Option<String>)> {
    let (classic, files): (Vec<&String>, Vec<&String>) =
        targets.iter().partition(|t| t.starts_with('+'));
    match (files.as_slice(), classic.as_slice()) {
        ([file], []) => Ok(((*file).clone(), None)),
        ([file], [pos]) => Ok(((*file).clone(), Some((*pos).clone()))),
        ([], _) => bail!("no file given"),
        _ => bail!("expected one file and at most one +ROW[:COL], got {targets:?}"),
    }
}

fn load_options(args: &Args, config: &Config) -> Result<LoadOptions> {
    let encoding: Encoding = args
        .encoding
        .as_deref()
        .unwrap_or(&config.load.encoding)
        .parse()?;
    let delimiter = args
        .delimiter
        .as_deref()
        .or(config.load.delimiter.as_deref())
        .map(|d| loader::parse_byte("delimiter", d))
        .transpose()?;
    let quote = loader::parse_byte(
        "quote character",
        args.quote_char.as_deref().unwrap_or(&config.load.quote_char),
    )?;
    Ok(LoadOptions {
        delimiter,
        quote,
        encoding,
        header: config.load.header && !args.no_header,
    })
}

fn layout_settings(args: &Args, config: &Config) -> LayoutSettings {
    let mut layout = config.layout.clone();
    if let Some(width) = args.width {
        layout.width = width;
    }
    if let Some(gap) = args.gap {
        layout.gap = gap;
    }
    if let Some(max_width) = args.max_width {
        layout.max_width = max_width;
    }
    layout.settings()
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    if let Err(e) = logging::init(args.log_file.as_deref()) {
        eprintln!("Warning: could not open log file: {e}");
    }

    let (file, classic) = split_targets(&args.targets)?;
    let options = load_options(&args, &config)?;
    let start = loader::parse_start_position(args.start_pos.as_deref(), classic.as_deref())?;
    let settings = layout_settings(&args, &config);
    let trunc_char = args
        .trunc_char
        .clone()
        .unwrap_or_else(|| config.layout.trunc_char.clone());

    let source = if file == "-" {
        Source::stdin()?
    } else {
        Source::File(PathBuf::from(&file))
    };
    let grid = loader::load_grid(&source, &options)?;

    let mut watch_error = None;
    let watcher = if args.watch || config.behavior.watch {
        match source.path() {
            Some(path) => match FileWatcher::new(path) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!(error = %e, "could not watch file");
                    watch_error = Some(format!("Not watching {}: {e}", path.display()));
                    None
                }
            },
            None => {
                watch_error = Some("Cannot watch standard input".to_string());
                None
            }
        }
    } else {
        None
    };

    let mut terminal = setup_terminal()?;
    let screen = ui::grid_screen(terminal.size()?);
    let session = Session::new(grid, settings, start, screen);
    let mut app = App::new(session, source, options, trunc_char);
    if let Some(query) = args.search.as_deref() {
        app.search_for(query);
    }
    if let Some(msg) = watch_error {
        app.status = msg;
    }

    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.behavior.tick_rate_ms.max(10));

    let res = run_app(
        &mut terminal,
        &mut app,
        watcher.as_ref(),
        tick_rate,
        &mut last_tick,
    );

    restore_terminal(terminal)?;
    info!("tabgrid exiting");
    res.context("event loop failed")
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&FileWatcher>,
    tick_rate: Duration,
    last_tick: &mut Instant,
) -> Result<()> {
    // Redraw only when state changes or on tick
    let mut dirty = true;
    loop {
        if watcher.is_some_and(FileWatcher::changed) {
            app.reload_and_report("Reloaded (file changed):");
            dirty = true;
        }

        let tick_due = last_tick.elapsed() >= tick_rate;
        if dirty || tick_due {
            terminal.draw(|f| ui::draw(f, app))?;
            dirty = false;
            if tick_due {
                *last_tick = Instant::now();
            }
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key);
                    dirty = true;
                }
                Event::Resize(width, height) => {
                    app.resize(ui::grid_screen(Rect::new(0, 0, width, height)));
                    dirty = true;
                }
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classic_start_position_may_come_first() {
        let (file, pos) = split_targets(&strings(&["+10:3", "data.csv"])).expect("split");
        assert_eq!(file, "data.csv");
        assert_eq!(pos.as_deref(), Some("+10:3"));

        let (file, pos) = split_targets(&strings(&["-"])).expect("split");
        assert_eq!(file, "-");
        assert!(pos.is_none());

        assert!(split_targets(&strings(&["a.csv", "b.csv"])).is_err());
        assert!(split_targets(&strings(&["+3"])).is_err());
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "tabgrid",
            "-d",
            "\\t",
            "--no-header",
            "-w",
            "max",
            "--gap",
            "0",
            "data.tsv",
        ]);
        let mut config = Config::default();
        config.load.delimiter = Some(";".into());
        config.layout.gap = 5;

        let options = load_options(&args, &config).expect("options");
        assert_eq!(options.delimiter, Some(b'\t'));
        assert!(!options.header);
        assert_eq!(options.encoding, Encoding::Auto);

        let settings = layout_settings(&args, &config);
        assert_eq!(settings.gap, 0);
        assert_eq!(settings.mode, tabgrid::layout::WidthMode::MaxContent);
    }

    #[test]
    fn bad_encoding_is_rejected() {
        let args = Args::parse_from(["tabgrid", "-e", "ebcdic", "x.csv"]);
        assert!(load_options(&args, &Config::default()).is_err());
    }
}
