//! Light-curve reader for delimited text files.
//!
//! Brightness-over-time data reaches the pipeline as text exported by very
//! different tools: mission archive CSVs with long headers, whitespace
//! aligned `.dat` tables, European spreadsheets with `;` separators and
//! decimal commas, notebooks with `#` comments, files written with Arabic
//! digits and headers.  No schema is imposed; the reader sniffs each file.
//!
//! # Stages
//!
//! 1. **Decoding**: BOM handling (UTF-8, UTF-16 LE/BE), lossy UTF-8
//!    otherwise; exotic whitespace folded to ASCII space.
//! 2. **Line filtering**: blank lines and comment lines (`#`, `;`, `//`,
//!    `--`) are dropped, trailing inline comments are cut.
//! 3. **Field splitting**: per line, a delimiter that leaves only numeric
//!    fields wins, then the one with most numeric fields, then most fields.
//! 4. **Header detection**: the first line is a header when it holds a
//!    non-numeric field containing a letter; its names are matched against
//!    known time and flux column names.
//! 5. **Column resolution**: header indices, else the first two numeric
//!    fields of each row, else whole-file column inference, else the first
//!    numeric column against the row index, else every number in the file.
//! 6. **Post-processing**: non-finite pairs dropped, duplicate times
//!    collapsed, samples sorted by time (see [`LightCurve::from_raw`]).

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use log::{debug, info, warn};
#[cfg(feature = "python")]
use pyo3::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::numeric::{normalize_token_chars, parse_number, scan_numbers, starts_numeric};
use crate::stats;
use crate::types::{LightCurve, Sample};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading a light curve.
#[derive(Debug, thiserror::Error)]
pub enum LightCurveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no usable data rows found ({found} parsed); ensure the file has at least two numeric columns (time, flux)")]
    InsufficientData { found: usize },

    #[error("unsupported text encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

// ---------------------------------------------------------------------------
// Column vocabulary
// ---------------------------------------------------------------------------

const TIME_NAMES: &[&str] = &[
    "time", "t", "jd", "hjd", "bjd", "mjd", "btjd", "bkjd", "date", "datetime", "timestamp",
    "epoch", "day", "days", "julian_date", "time_bjd", "time_jd",
    "الوقت", "وقت", "الزمن", "زمن", "التاريخ", "تاريخ",
];

const FLUX_NAMES: &[&str] = &[
    "flux", "f", "rel_flux", "relative_flux", "normalized_flux", "normalised_flux", "norm_flux",
    "pdcsap_flux", "sap_flux", "intensity", "brightness", "counts", "count", "mag", "magnitude",
    "التدفق", "تدفق", "السطوع", "سطوع", "الشدة", "شدة", "القدر", "قدر",
];

/// A column index present in at least this share of rows is "numeric".
const NUMERIC_COLUMN_COVERAGE: f64 = 0.6;

/// Minimum share of increasing adjacent pairs for a column to be time.
const MONOTONIC_TIME_SCORE: f64 = 0.6;

lazy_static! {
    static ref HEADER_UNIT: Regex = Regex::new(r"\s*[\(\[][^\)\]]*[\)\]]\s*$").expect("header unit pattern");
    static ref ANY_DELIMITER: Regex = Regex::new(r"[,;\t|\s]+").expect("delimiter pattern");
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// How the time and flux columns were found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ColumnStrategy {
    /// Header names matched known time/flux names.
    Header { time: usize, flux: usize },
    /// First two numeric fields of every row.
    Positional,
    /// Whole-file inference; `time: None` means time is the row index.
    Inferred { time: Option<usize>, flux: usize },
    /// First broadly numeric column as flux, row index as time.
    FirstNumeric { flux: usize },
    /// Every number in the text, indexed by position.
    TokenScan,
}

/// Parser output: the cleaned light curve plus how it was obtained.
#[derive(Clone, Debug)]
pub struct ParsedLightCurve {
    pub curve: LightCurve,
    pub strategy: ColumnStrategy,
    pub header: Option<Vec<String>>,
    /// Data lines left after comment/blank filtering (header excluded).
    pub rows_seen: usize,
}

impl ParsedLightCurve {
    /// Fail unless the curve is long enough to analyse.
    pub fn require_usable(self) -> Result<Self, LightCurveError> {
        if self.curve.is_usable() {
            Ok(self)
        } else {
            Err(LightCurveError::InsufficientData {
                found: self.curve.len(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding and line handling
// ---------------------------------------------------------------------------

/// Decode raw file bytes to text, honouring a leading byte-order mark.
pub fn decode_bytes(bytes: &[u8]) -> Result<String, LightCurveError> {
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) || bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return Err(LightCurveError::UnsupportedEncoding("UTF-32".into()));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return Ok(String::from_utf8_lossy(rest).into_owned());
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return Ok(decode_utf16(rest, u16::from_le_bytes));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return Ok(decode_utf16(rest, u16::from_be_bytes));
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Drop BOM and zero-width characters, fold Unicode spaces to ASCII space.
///
/// Line breaks and tabs are kept: both carry structure.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}'))
        .map(|c| {
            if c.is_whitespace() && !matches!(c, '\n' | '\r' | '\t') {
                ' '
            } else {
                c
            }
        })
        .collect()
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with(';') || line.starts_with("//") || line.starts_with("--")
}

/// Cut a trailing `// ...`, `# ...`, `-- ...` or ` ; ...` comment.
///
/// `--` and ` ;` only start a comment when what follows is not numeric,
/// so `1.0 ; 2.0` stays a semicolon-delimited row.  A line without any
/// numeric field keeps its ` ;` so `time ; flux` survives as a header.
pub fn strip_inline_comment(line: &str) -> &str {
    let mut cut = line.len();
    let has_numeric_field = line
        .split(|c: char| c == ';' || c == ',' || c == '|' || c.is_whitespace())
        .any(|f| parse_number(f).is_some());

    if let Some(i) = line.find("//") {
        cut = cut.min(i);
    }
    if let Some(i) = line.find('#') {
        cut = cut.min(i);
    }
    if let Some(i) = line
        .match_indices("--")
        .map(|(i, _)| i)
        .find(|&i| !starts_numeric(&line[i + 2..]))
    {
        cut = cut.min(i);
    }
    if has_numeric_field {
        if let Some(i) = line.match_indices(';').map(|(i, _)| i).find(|&i| {
            line[..i].ends_with(char::is_whitespace) && !starts_numeric(&line[i + 1..])
        }) {
            cut = cut.min(i);
        }
    }

    line[..cut].trim_end()
}

/// Non-empty, comment-free lines of the normalized text.
fn data_lines(text: &str) -> Vec<&str> {
    text.split(|c| c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_comment_line(l))
        .map(strip_inline_comment)
        .filter(|l| !l.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Field splitting
// ---------------------------------------------------------------------------

fn split_on<'a>(line: &'a str, delimiter: Option<char>) -> Vec<&'a str> {
    let parts: Box<dyn Iterator<Item = &'a str>> = match delimiter {
        Some(d) => Box::new(line.split(d)),
        None => Box::new(line.split_whitespace()),
    };
    parts
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.chars().all(|c| matches!(c, ',' | ';' | '|')))
        .collect()
}

/// Split a line on whichever delimiter fits it best.
///
/// Candidates are comma, whitespace run, semicolon, tab and pipe.  A split
/// in which every field is numeric beats one that leaves unparseable
/// pieces; after that more numeric fields win, then more fields, and the
/// earlier candidate wins ties.
pub fn split_fields(line: &str) -> Vec<String> {
    const CANDIDATES: [Option<char>; 5] = [Some(','), None, Some(';'), Some('\t'), Some('|')];

    let mut best: Vec<&str> = Vec::new();
    let mut best_score = (false, 0usize, 0usize);
    for delimiter in CANDIDATES {
        let fields = split_on(line, delimiter);
        let numeric = fields.iter().filter(|f| parse_number(f).is_some()).count();
        let score = (numeric > 0 && numeric == fields.len(), numeric, fields.len());
        if score > best_score {
            best_score = score;
            best = fields;
        }
    }

    if best.len() <= 1 {
        best = ANY_DELIMITER
            .split(line)
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
    }
    best.into_iter().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Header handling
// ---------------------------------------------------------------------------

fn is_header(fields: &[String]) -> bool {
    fields
        .iter()
        .any(|f| f.chars().any(char::is_alphabetic) && parse_number(f).is_none())
}

fn normalize_header_name(name: &str) -> String {
    let name = normalize_token_chars(name).trim().to_lowercase();
    let name = HEADER_UNIT.replace(&name, "");
    name.trim().replace(&[' ', '-'][..], "_")
}

fn match_column(names: &[String], vocabulary: &[&str], exclude: Option<usize>) -> Option<usize> {
    let eligible = |i: &usize| Some(*i) != exclude;

    let exact = (0..names.len())
        .filter(eligible)
        .find(|&i| vocabulary.contains(&names[i].as_str()));
    if exact.is_some() {
        return exact;
    }

    (0..names.len()).filter(eligible).find(|&i| {
        let tokens: Vec<&str> = names[i].split('_').collect();
        !tokens.iter().any(|t| t.starts_with("err"))
            && tokens
                .iter()
                .any(|t| t.chars().count() > 1 && vocabulary.contains(t))
    })
}

/// Locate the time and flux columns from header names.
pub fn resolve_header(header: &[String]) -> Option<(usize, usize)> {
    let names: Vec<String> = header.iter().map(|h| normalize_header_name(h)).collect();
    let time = match_column(&names, TIME_NAMES, None)?;
    let flux = match_column(&names, FLUX_NAMES, Some(time))?;
    Some((time, flux))
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

fn rows_by_header(rows: &[Vec<String>], time: usize, flux: usize) -> Vec<Sample> {
    rows.iter()
        .filter_map(|r| {
            let t = parse_number(r.get(time)?)?;
            let f = parse_number(r.get(flux)?)?;
            Some(Sample::new(t, f))
        })
        .collect()
}

fn rows_by_position(rows: &[Vec<String>]) -> Vec<Sample> {
    rows.iter()
        .filter_map(|r| {
            let mut numbers = r.iter().filter_map(|f| parse_number(f));
            Some(Sample::new(numbers.next()?, numbers.next()?))
        })
        .collect()
}

/// Share of adjacent pairs that increase; 0 for fewer than two values.
fn increasing_fraction(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let increasing = values.windows(2).filter(|w| w[1] > w[0]).count();
    increasing as f64 / (values.len() - 1) as f64
}

/// Whole-file column inference over a parsed numeric grid.
struct ColumnGrid {
    cells: Vec<Vec<Option<f64>>>,
    numeric: Vec<usize>,
}

impl ColumnGrid {
    fn new(rows: &[Vec<String>]) -> Self {
        let cells: Vec<Vec<Option<f64>>> = rows
            .iter()
            .map(|r| r.iter().map(|f| parse_number(f)).collect())
            .collect();
        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        let needed = NUMERIC_COLUMN_COVERAGE * cells.len() as f64;

        let numeric = (0..width)
            .filter(|&c| {
                let present = cells
                    .iter()
                    .filter(|r| matches!(r.get(c), Some(Some(_))))
                    .count();
                present > 0 && present as f64 >= needed
            })
            .collect();

        Self { cells, numeric }
    }

    fn column(&self, c: usize) -> Vec<f64> {
        self.cells
            .iter()
            .filter_map(|r| r.get(c).copied().flatten())
            .collect()
    }

    fn time_column(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &c in &self.numeric {
            let score = increasing_fraction(&self.column(c));
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((c, score));
            }
        }
        best.filter(|&(_, score)| score >= MONOTONIC_TIME_SCORE)
            .map(|(c, _)| c)
    }

    fn flux_column(&self, time: Option<usize>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &c in self.numeric.iter().filter(|&&c| Some(c) != time) {
            let variance = stats::sample_variance(&self.column(c));
            if best.map_or(true, |(_, v)| variance > v) {
                best = Some((c, variance));
            }
        }
        best.map(|(c, _)| c)
    }

    fn samples(&self, time: Option<usize>, flux: usize) -> Vec<Sample> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let f = r.get(flux).copied().flatten()?;
                let t = match time {
                    Some(tc) => r.get(tc).copied().flatten()?,
                    None => i as f64,
                };
                Some(Sample::new(t, f))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public parser
// ---------------------------------------------------------------------------

/// Parse normalized or raw text into a light curve.
///
/// Never fails: a result with fewer than two samples is returned as-is and
/// rejected by [`ParsedLightCurve::require_usable`].
pub fn parse_text(text: &str) -> ParsedLightCurve {
    let text = normalize_text(text);
    let lines = data_lines(&text);

    let mut rows: Vec<Vec<String>> = lines.iter().map(|l| split_fields(l)).collect();
    let header = match rows.first() {
        Some(first) if is_header(first) => Some(rows.remove(0)),
        _ => None,
    };
    let rows_seen = rows.len();

    let finish = |samples: Vec<Sample>, strategy: ColumnStrategy| ParsedLightCurve {
        curve: LightCurve::from_raw(samples),
        strategy,
        header: header.clone(),
        rows_seen,
    };

    // (a) header names, or (b) positional.
    let (samples, strategy) = match header.as_deref().and_then(resolve_header) {
        Some((time, flux)) => (rows_by_header(&rows, time, flux), ColumnStrategy::Header { time, flux }),
        None => (rows_by_position(&rows), ColumnStrategy::Positional),
    };
    if samples.len() >= LightCurve::MIN_USABLE {
        return finish(samples, strategy);
    }
    // Named columns outrank the flux-only token scan, even for a single row.
    let named = match strategy {
        ColumnStrategy::Header { .. } if !samples.is_empty() => Some((samples.clone(), strategy)),
        _ => None,
    };
    debug!(
        "{:?} strategy produced {} rows, inferring columns from the whole file",
        strategy,
        samples.len()
    );

    // (c) whole-file inference, (d) first numeric column against row index.
    let grid = ColumnGrid::new(&rows);
    if let Some(&first_numeric) = grid.numeric.first() {
        let time = grid.time_column();
        let (samples, strategy) = match grid.flux_column(time) {
            Some(flux) => (grid.samples(time, flux), ColumnStrategy::Inferred { time, flux }),
            None => (
                grid.samples(None, first_numeric),
                ColumnStrategy::FirstNumeric { flux: first_numeric },
            ),
        };
        if samples.len() >= LightCurve::MIN_USABLE {
            return finish(samples, strategy);
        }
    }

    if let Some((samples, strategy)) = named {
        return finish(samples, strategy);
    }

    // (e) every number in the text, flux-only.
    warn!("no column structure found, scanning raw text for numbers");
    let samples = scan_numbers(&lines.join("\n"))
        .into_iter()
        .enumerate()
        .map(|(i, flux)| Sample::new(i as f64, flux))
        .collect();
    finish(samples, ColumnStrategy::TokenScan)
}

/// Convenience wrapper returning only the samples.
pub fn parse_light_curve(text: &str) -> LightCurve {
    parse_text(text).curve
}

// ---------------------------------------------------------------------------
// File reader (Python-exposed)
// ---------------------------------------------------------------------------

/// Reads light-curve files from disk.
///
/// The extension (`.csv`, `.txt`, `.dat`, ...) is only a hint: content is
/// always sniffed.  Binary FITS tables are recognised and refused.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Default)]
pub struct LightCurveReader;

impl LightCurveReader {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse the file at `path`.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<ParsedLightCurve, LightCurveError> {
        let bytes = self.load(path)?;
        self.parse_bytes(&bytes)
    }

    /// Read the raw bytes of `path`, logging what its extension suggests.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, LightCurveError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" | "dat" | "tsv" | "tbl" => debug!("reading {} as delimited text", path.display()),
            other => warn!(
                "unrecognised extension {:?} for {}, sniffing content",
                other,
                path.display()
            ),
        }

        Ok(fs::read(path)?)
    }

    /// Parse raw file contents.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedLightCurve, LightCurveError> {
        if bytes.starts_with(b"SIMPLE  =") {
            return Err(LightCurveError::UnsupportedFormat(
                "FITS binary table; export it to CSV first".into(),
            ));
        }
        let text = decode_bytes(bytes)?;
        let parsed = parse_text(&text);
        info!(
            "Parsed {} samples from {} data rows ({} bytes, {:?})",
            parsed.curve.len(),
            parsed.rows_seen,
            bytes.len(),
            parsed.strategy,
        );
        Ok(parsed)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl LightCurveReader {
    #[new]
    fn py_new() -> Self {
        Self
    }

    /// Read a light-curve file and return the cleaned samples.
    #[pyo3(name = "read")]
    fn py_read(&self, path: &str) -> PyResult<LightCurve> {
        self.read(path)
            .map(|p| p.curve)
            .map_err(|e| pyo3::exceptions::PyIOError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        "LightCurveReader()".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(text: &str) -> Vec<(f64, f64)> {
        parse_light_curve(text)
            .samples()
            .iter()
            .map(|s| (s.time, s.flux))
            .collect()
    }

    #[test]
    fn comment_lines_are_dropped() {
        assert_eq!(samples("# comment\n0,1.0\n1,0.99\n"), vec![(0.0, 1.0), (1.0, 0.99)]);
        assert_eq!(
            samples("; ini style\n// c style\n-- sql style\n\n0 1\n1 2\n"),
            vec![(0.0, 1.0), (1.0, 2.0)]
        );
    }

    #[test]
    fn inline_comments_are_cut() {
        assert_eq!(strip_inline_comment("1.0,2.0 // note"), "1.0,2.0");
        assert_eq!(strip_inline_comment("1.0 2.0 # note"), "1.0 2.0");
        assert_eq!(strip_inline_comment("1.0 2.0 -- note"), "1.0 2.0");
        assert_eq!(strip_inline_comment("1.0 2.0 ; note"), "1.0 2.0");
        assert_eq!(strip_inline_comment("1.0 ; 2.0"), "1.0 ; 2.0");
        assert_eq!(strip_inline_comment("1;2"), "1;2");
    }

    #[test]
    fn delimiter_detection() {
        assert_eq!(split_fields("1,2,3"), vec!["1", "2", "3"]);
        assert_eq!(split_fields("1   2\t3"), vec!["1", "2", "3"]);
        assert_eq!(split_fields("0,99;1,02"), vec!["0,99", "1,02"]);
        assert_eq!(split_fields("1|2"), vec!["1", "2"]);
        assert_eq!(split_fields("time,flux"), vec!["time", "flux"]);
        assert_eq!(split_fields("2020-01-01 12:00:00,1.0"), vec!["2020-01-01 12:00:00", "1.0"]);
    }

    #[test]
    fn header_columns_are_matched_by_name() {
        let parsed = parse_text("time,flux\n0,1\n1,0.98\n2,1.0\n");
        assert_eq!(parsed.strategy, ColumnStrategy::Header { time: 0, flux: 1 });
        assert_eq!(parsed.curve.len(), 3);

        let parsed = parse_text("flux_err,FLUX,BJD (days)\n0.1,1.0,10\n0.1,0.9,11\n");
        assert_eq!(parsed.strategy, ColumnStrategy::Header { time: 2, flux: 1 });
        assert_eq!(parsed.curve.fluxes(), vec![1.0, 0.9]);
    }

    #[test]
    fn arabic_headers_and_digits() {
        let text = "الوقت,التدفق\n\u{0660},\u{0661}\u{066B}\u{0660}\n\u{0661},\u{0660}\u{066B}\u{0669}\n";
        let parsed = parse_text(text);
        assert_eq!(parsed.strategy, ColumnStrategy::Header { time: 0, flux: 1 });
        assert_eq!(parsed.curve.fluxes(), vec![1.0, 0.9]);
    }

    #[test]
    fn european_semicolon_file() {
        assert_eq!(
            samples("zeit;wert\n0,5;1,002\n1,5;0,998\n"),
            vec![(0.5, 1.002), (1.5, 0.998)]
        );
    }

    #[test]
    fn single_column_falls_back_to_index_time() {
        let text: String = (0..50).map(|i| format!("{}\n", 1.0 + (i % 7) as f64 * 0.001)).collect();
        let curve = parse_light_curve(&text);
        assert_eq!(curve.len(), 50);
        assert_eq!(curve.times(), (0..50).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn inference_prefers_monotonic_time_and_noisy_flux() {
        // A text flag sits between the flux and the time stamp.
        let mut text = String::new();
        for i in 0..20 {
            let flux = if i % 2 == 0 { 1.05 } else { 0.95 };
            text.push_str(&format!("{} x{} {}\n", flux, i, 100 + i));
        }
        let parsed = parse_text(&text);
        assert_eq!(parsed.strategy, ColumnStrategy::Positional);

        let grid = ColumnGrid::new(&text.lines().map(split_fields).collect::<Vec<_>>());
        assert_eq!(grid.numeric, vec![0, 2]);
        assert_eq!(grid.time_column(), Some(2));
        assert_eq!(grid.flux_column(Some(2)), Some(0));
    }

    #[test]
    fn sparse_rows_use_whole_file_inference() {
        let mut text = String::from("a b c\n");
        for i in 0..10 {
            text.push_str(&format!("{}\n", 1.0 + (i as f64) * 0.01));
        }
        let parsed = parse_text(&text);
        assert!(matches!(
            parsed.strategy,
            ColumnStrategy::Inferred { .. } | ColumnStrategy::FirstNumeric { .. }
        ));
        assert_eq!(parsed.curve.len(), 10);
    }

    #[test]
    fn token_scan_is_the_last_resort() {
        let parsed = parse_text("values: 1.0 and 2.5");
        assert_eq!(parsed.strategy, ColumnStrategy::TokenScan);
        assert_eq!(parsed.curve.fluxes(), vec![1.0, 2.5]);
        assert_eq!(parsed.curve.times(), vec![0.0, 1.0]);
    }

    #[test]
    fn duplicates_collapse_and_sort() {
        assert_eq!(
            samples("2,1.0\n0,0.5\n2,1.5\n1,0.7\n"),
            vec![(0.0, 0.5), (1.0, 0.7), (2.0, 1.5)]
        );
    }

    #[test]
    fn bom_and_unicode_spaces() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("0\u{00A0}1.0\n1\u{2003}0.5\n".as_bytes());
        let parsed = LightCurveReader::new().parse_bytes(&bytes).unwrap();
        assert_eq!(parsed.curve.fluxes(), vec![1.0, 0.5]);
    }

    #[test]
    fn utf16_input_is_decoded() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "0,1\n1,2\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_bytes(&bytes).unwrap(), "0,1\n1,2\n");
    }

    #[test]
    fn fits_files_are_refused() {
        let err = LightCurveReader::new()
            .parse_bytes(b"SIMPLE  =                    T")
            .unwrap_err();
        assert!(matches!(err, LightCurveError::UnsupportedFormat(_)));
    }

    #[test]
    fn spaced_semicolon_header_keeps_both_names() {
        assert_eq!(strip_inline_comment("time ; flux"), "time ; flux");
        assert_eq!(strip_inline_comment("1.0 2.0 ; bad cadence"), "1.0 2.0");
        assert_eq!(split_fields("time ; flux"), vec!["time", "flux"]);

        let parsed = parse_text("time ; flux\n0 ; 1.0\n1 ; 0.98\n");
        assert_eq!(parsed.strategy, ColumnStrategy::Header { time: 0, flux: 1 });
        assert_eq!(parsed.curve.fluxes(), vec![1.0, 0.98]);
    }

    #[test]
    fn single_named_row_is_not_token_scanned() {
        let parsed = parse_text("time,flux\n3.0,0.5\n");
        assert_eq!(parsed.strategy, ColumnStrategy::Header { time: 0, flux: 1 });
        assert_eq!(samples("time,flux\n3.0,0.5\n"), vec![(3.0, 0.5)]);
    }

    #[test]
    fn short_input_is_not_usable() {
        let err = parse_text("only one value: 42\n").require_usable().unwrap_err();
        assert!(matches!(err, LightCurveError::InsufficientData { found: 1 }));
    }
}
