//! Feed format detection.
//!
//! Each strategy is a pure function from the feed body to an optional list
//! of rows. They are tried in order (JSON, delimited, lines) and the first
//! success wins, except that a delimited result must also pass
//! [`needs_line_fallback`]; a rejected delimited result falls through to
//! line parsing.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::normalize::normalize_object;
use crate::types::{DetectedFormat, ObjectRecord, RawRecord};

/// Keys under which a JSON object may wrap its row array, in priority order.
const ROW_CONTAINER_KEYS: &[&str] = &["data", "rows", "items", "results"];

/// Stand-in byte for multi-character delimiters; the CSV reader only
/// splits on single bytes.
const UNIT_SEPARATOR: u8 = 0x1f;

#[derive(Debug, Clone, Copy)]
enum Delimiter {
    Byte(u8),
    Text(&'static str),
}

const DELIMITERS: [Delimiter; 5] = [
    Delimiter::Byte(b','),
    Delimiter::Byte(b'\t'),
    Delimiter::Byte(b'|'),
    Delimiter::Byte(b';'),
    Delimiter::Text(" - "),
];

static UPC_PREFIXED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8,14}\s+").expect("valid UPC prefix regex"));

/// Tunables for the delimited → line downgrade check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    /// Rows (and text lines) inspected from the start of the feed.
    pub sample_size: usize,
    /// Fraction of sampled rows without a UPC at which delimited parsing is
    /// abandoned.
    pub missing_upc_ratio: f64,
    /// Number of sampled text lines starting with a UPC at which delimited
    /// parsing is abandoned.
    pub upc_prefixed_line_threshold: usize,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            sample_size: 20,
            missing_upc_ratio: 0.6,
            upc_prefixed_line_threshold: 3,
        }
    }
}

/// A feed body split into raw records with one format applied throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub format: DetectedFormat,
    pub records: Vec<RawRecord>,
}

/// Chooses a format for `text` and splits it into raw records.
#[must_use]
pub fn detect_format(text: &str, thresholds: &DetectionThresholds) -> ParsedFeed {
    if let Some(rows) = parse_json_rows(text) {
        return ParsedFeed {
            format: DetectedFormat::Json,
            records: rows.into_iter().map(RawRecord::Object).collect(),
        };
    }

    if let Some(rows) = parse_delimited_rows(text) {
        if needs_line_fallback(&rows, text, thresholds) {
            tracing::debug!(
                rows = rows.len(),
                "delimited parse rejected by sample check; using line parser"
            );
        } else {
            return ParsedFeed {
                format: DetectedFormat::Delimited,
                records: rows.into_iter().map(RawRecord::Object).collect(),
            };
        }
    }

    ParsedFeed {
        format: DetectedFormat::Line,
        records: parse_lines(text),
    }
}

/// Parses `text` as JSON holding a row array, either top level or under
/// one of [`ROW_CONTAINER_KEYS`].
#[must_use]
pub fn parse_json_rows(text: &str) -> Option<Vec<ObjectRecord>> {
    let items = match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => items,
        Value::Object(mut map) => ROW_CONTAINER_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })?,
        _ => return None,
    };
    Some(items.into_iter().map(ObjectRecord::from_json).collect())
}

/// Parses `text` as a header + rows table with the first delimiter that
/// yields at least one row.
#[must_use]
pub fn parse_delimited_rows(text: &str) -> Option<Vec<ObjectRecord>> {
    DELIMITERS
        .iter()
        .find_map(|delimiter| parse_with_delimiter(text, *delimiter))
}

fn parse_with_delimiter(text: &str, delimiter: Delimiter) -> Option<Vec<ObjectRecord>> {
    let (source, byte) = match delimiter {
        Delimiter::Byte(b) => (Cow::Borrowed(text), b),
        Delimiter::Text(sep) => (Cow::Owned(text.replace(sep, "\u{1f}")), UNIT_SEPARATOR),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(byte)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source.as_bytes());

    let headers = reader.headers().ok()?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.ok()?;
        rows.push(ObjectRecord::from_columns(headers.iter(), record.iter()));
    }

    match rows.first() {
        Some(first) if !first.fields.is_empty() => Some(rows),
        _ => None,
    }
}

/// Splits `text` into trimmed, non-empty line records.
#[must_use]
pub fn parse_lines(text: &str) -> Vec<RawRecord> {
    trimmed_lines(text)
        .map(|line| RawRecord::Line(line.to_string()))
        .collect()
}

/// Decides whether a delimited parse should be discarded in favour of line
/// parsing.
///
/// True when too many sampled rows lack a recoverable UPC, or when enough
/// of the leading text lines look like `<UPC><whitespace>...`.
#[must_use]
pub fn needs_line_fallback(
    rows: &[ObjectRecord],
    text: &str,
    thresholds: &DetectionThresholds,
) -> bool {
    let sample = &rows[..rows.len().min(thresholds.sample_size)];
    if sample.is_empty() {
        return true;
    }

    let missing = sample
        .iter()
        .filter(|row| !normalize_object(row).has_upc())
        .count();
    if missing >= missing_upc_limit(sample.len(), thresholds.missing_upc_ratio) {
        return true;
    }

    let prefixed = trimmed_lines(text)
        .take(thresholds.sample_size)
        .filter(|line| UPC_PREFIXED_LINE.is_match(line))
        .count();
    prefixed >= thresholds.upc_prefixed_line_threshold
}

/// Smallest missing-UPC count that triggers the downgrade: `ceil(len * ratio)`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn missing_upc_limit(sample_len: usize, ratio: f64) -> usize {
    (sample_len as f64 * ratio).ceil() as usize
}

fn trimmed_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}
