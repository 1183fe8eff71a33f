use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::grid::{Grid, Position};

const SNIFF_LINES: usize = 20;
const DELIMITER_CANDIDATES: [u8; 5] = [b',', b'\t', b';', b'|', b':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8, falling back to Latin-1 when the bytes are not valid UTF-8.
    #[default]
    Auto,
    Utf8,
    Latin1,
}

impl FromStr for Encoding {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "auto" => Ok(Encoding::Auto),
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "latin-1" | "latin1" | "iso8859-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            _ => Err(LoadError::UnsupportedEncoding(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// `None` sniffs the delimiter from the first lines.
    pub delimiter: Option<u8>,
    pub quote: u8,
    pub encoding: Encoding,
    /// Treat the first row as a header.
    pub header: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            encoding: Encoding::Auto,
            header: true,
        }
    }
}

/// Where rows come from. Standard input is read once and kept so a reload
/// re-parses the same bytes.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Stdin(Vec<u8>),
    Rows(Vec<Vec<String>>),
}

impl Source {
    pub fn stdin() -> Result<Self, LoadError> {
        let mut buf = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .map_err(LoadError::Stdin)?;
        Ok(Source::Stdin(buf))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::File(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Stdin(_) => f.write_str("<stdin>"),
            Source::Rows(_) => f.write_str("<memory>"),
        }
    }
}

/// Read and parse `source` into rows of cell text.
pub fn load(source: &Source, options: &LoadOptions) -> Result<Vec<Vec<String>>, LoadError> {
    let rows = match source {
        Source::File(path) => {
            let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            parse_bytes(&bytes, options)?
        }
        Source::Stdin(bytes) => parse_bytes(bytes, options)?,
        Source::Rows(rows) => rows.clone(),
    };
    info!(source = %source, rows = rows.len(), "loaded");
    Ok(rows)
}

pub fn load_grid(source: &Source, options: &LoadOptions) -> Result<Grid, LoadError> {
    Ok(Grid::new(load(source, options)?, options.header))
}

pub fn parse_bytes(bytes: &[u8], options: &LoadOptions) -> Result<Vec<Vec<String>>, LoadError> {
    let text = decode(bytes, options.encoding)?;
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| sniff_delimiter(&text, options.quote));
    debug!(delimiter = %char::from(delimiter).escape_default(), "parsing");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .quote(options.quote)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, LoadError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding {
        Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| LoadError::Decode("UTF-8")),
        Encoding::Latin1 => Ok(latin1(bytes)),
        Encoding::Auto => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => {
                debug!("input is not UTF-8, decoding as Latin-1");
                Ok(latin1(bytes))
            }
        },
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Pick the candidate that splits the first lines into the same, largest
/// number of fields. Falls back to the most frequent candidate on the first
/// line, then to a comma.
pub fn sniff_delimiter(text: &str, quote: u8) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    if lines.is_empty() {
        return b',';
    }

    let mut best: Option<(usize, u8)> = None;
    for &candidate in &DELIMITER_CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| count_unquoted(l, candidate, quote))
            .collect();
        let first = counts[0];
        if first > 0 && counts.iter().all(|&c| c == first) && best.is_none_or(|(n, _)| first > n)
        {
            best = Some((first, candidate));
        }
    }
    if let Some((_, delimiter)) = best {
        return delimiter;
    }

    DELIMITER_CANDIDATES
        .iter()
        .map(|&c| (count_unquoted(lines[0], c, quote), c))
        .filter(|&(n, _)| n > 0)
        .max_by_key(|&(n, _)| n)
        .map(|(_, c)| c)
        .unwrap_or(b',')
}

fn count_unquoted(line: &str, delimiter: u8, quote: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for &b in line.as_bytes() {
        if b == quote {
            quoted = !quoted;
        } else if b == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

/// Parse a delimiter or quote argument: one ASCII character, or an escape
/// such as `\t`.
pub fn parse_byte(name: &'static str, value: &str) -> Result<u8, LoadError> {
    let byte = match value {
        "\\t" | "tab" => Some(b'\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Some(c as u8),
                _ => None,
            }
        }
    };
    byte.ok_or_else(|| LoadError::InvalidByte {
        name,
        value: value.to_string(),
    })
}

/// Starting cursor from `ROW[,COL]` or the classic `+ROW[:COL]` form.
/// Both are 1-based; an empty or zero part means the first row or column.
pub fn parse_start_position(
    plain: Option<&str>,
    classic: Option<&str>,
) -> Result<Position, LoadError> {
    let (spec, sep) = match (plain, classic) {
        (Some(p), _) => (p, ','),
        (None, Some(c)) => (c.trim_start_matches('+'), ':'),
        (None, None) => return Ok(Position::default()),
    };
    let invalid = || LoadError::StartPosition(spec.to_string());
    let mut parts = spec.split(sep).map(str::trim);
    let mut next = || -> Result<usize, LoadError> {
        match parts.next() {
            None | Some("") => Ok(0),
            Some(p) => p.parse::<usize>().map_err(|_| invalid()),
        }
    };
    let row = next()?;
    let col = next()?;
    Ok(Position::new(row.saturating_sub(1), col.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cells(rows: &[Vec<String>]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n", b'"'), b',');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n", b'"'), b'\t');
        assert_eq!(sniff_delimiter("a;b,c\n1;2\n", b'"'), b';');
        assert_eq!(sniff_delimiter("\"x,y\"|z\n\"1,2\"|3\n", b'"'), b'|');
        assert_eq!(sniff_delimiter("single\n", b'"'), b',');
        assert_eq!(sniff_delimiter("", b'"'), b',');
    }

    #[test]
    fn parses_quoted_fields_and_crlf() {
        let rows = parse_bytes(b"name,note\r\nbob,\"a, b\"\r\namy,\"line\nbreak\"\r\n", &LoadOptions::default())
            .expect("parse");
        assert_eq!(
            cells(&rows),
            vec![vec!["name", "note"], vec!["bob", "a, b"], vec!["amy", "line\nbreak"]]
        );
    }

    #[test]
    fn ragged_rows_are_kept_for_the_grid_to_pad() {
        let rows = parse_bytes(b"a,b,c\n1\n", &LoadOptions::default()).expect("parse");
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn explicit_delimiter_overrides_sniffing() {
        let options = LoadOptions {
            delimiter: Some(b';'),
            ..LoadOptions::default()
        };
        let rows = parse_bytes(b"a,b;c\n", &options).expect("parse");
        assert_eq!(cells(&rows), vec![vec!["a,b", "c"]]);
    }

    #[test]
    fn decodes_latin1_fallback_and_strips_bom() {
        assert_eq!(decode(b"caf\xE9", Encoding::Auto).expect("decode"), "café");
        assert_eq!(decode(b"\xEF\xBB\xBFhi", Encoding::Auto).expect("decode"), "hi");
        assert!(matches!(
            decode(b"caf\xE9", Encoding::Utf8),
            Err(LoadError::Decode(_))
        ));
        assert_eq!(decode(b"\xC3\xA9", Encoding::Latin1).expect("decode"), "Ã©");
    }

    #[test]
    fn encoding_names() {
        assert_eq!("UTF-8".parse::<Encoding>().ok(), Some(Encoding::Utf8));
        assert_eq!("latin_1".parse::<Encoding>().ok(), Some(Encoding::Latin1));
        assert!("cp720".parse::<Encoding>().is_err());
    }

    #[test]
    fn byte_arguments() {
        assert_eq!(parse_byte("delimiter", "\\t").ok(), Some(b'\t'));
        assert_eq!(parse_byte("delimiter", "|").ok(), Some(b'|'));
        assert!(parse_byte("delimiter", "||").is_err());
        assert!(parse_byte("quote", "é").is_err());
    }

    #[test]
    fn start_positions() {
        let pos = |p, c| parse_start_position(p, c).ok();
        assert_eq!(pos(None, None), Some(Position::new(0, 0)));
        assert_eq!(pos(Some("5"), None), Some(Position::new(4, 0)));
        assert_eq!(pos(Some("5,3"), None), Some(Position::new(4, 2)));
        assert_eq!(pos(Some(",3"), None), Some(Position::new(0, 2)));
        assert_eq!(pos(None, Some("+10:2")), Some(Position::new(9, 1)));
        assert_eq!(pos(None, Some("+:4")), Some(Position::new(0, 3)));
        assert_eq!(pos(Some("0"), Some("+9")), Some(Position::new(0, 0)));
        assert!(pos(Some("x"), None).is_none());
    }

    #[test]
    fn loads_files_and_memory_rows() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"a\tb\n1\t2\n").expect("write");
        let rows = load(&Source::File(file.path().to_path_buf()), &LoadOptions::default())
            .expect("load");
        assert_eq!(cells(&rows), vec![vec!["a", "b"], vec!["1", "2"]]);

        let grid = load_grid(&Source::File(file.path().to_path_buf()), &LoadOptions::default())
            .expect("load grid");
        assert!(grid.header_enabled());
        assert_eq!(grid.data_row_count(), 1);

        let memory = Source::Rows(vec![vec!["x".to_string()]]);
        assert_eq!(load(&memory, &LoadOptions::default()).expect("load").len(), 1);

        let missing = Source::File(PathBuf::from("/definitely/not/here.csv"));
        assert!(matches!(
            load(&missing, &LoadOptions::default()),
            Err(LoadError::Io { .. })
        ));
    }
}
