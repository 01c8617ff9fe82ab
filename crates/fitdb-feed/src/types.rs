//! Raw record shapes produced by the format detector.
//!
//! ## Observed shape of the Optio feed
//!
//! The endpoint serves `text/plain` and has been seen returning fixed-ish
//! text lines such as
//!
//! ```text
//! 190340661600    M QW-K v4 081 Black/Grey/Nightlife 7 D
//! ```
//!
//! i.e. UPC, an optional gender marker, a free-text description, size and
//! width. Nothing guarantees that shape, so the detector also accepts JSON
//! and header-based delimited tables.

use serde_json::{Map, Value};

/// The parsing strategy chosen for a whole feed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Json,
    Delimited,
    Line,
}

impl std::fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectedFormat::Json => write!(f, "json"),
            DetectedFormat::Delimited => write!(f, "delimited"),
            DetectedFormat::Line => write!(f, "line"),
        }
    }
}

/// A string-keyed row from a JSON or delimited feed.
///
/// `fields` keeps the feed's key order and spelling; values are already
/// stringified. `original` is the row exactly as parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub fields: Vec<(String, String)>,
    pub original: Value,
}

impl ObjectRecord {
    /// Builds a record from one element of a JSON row array.
    ///
    /// Elements that are not objects produce a record with no fields; they
    /// still carry the element as `original`.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        let fields = match &value {
            Value::Object(map) => map
                .iter()
                .map(|(key, v)| (key.clone(), stringify_json(v)))
                .collect(),
            _ => Vec::new(),
        };
        Self {
            fields,
            original: value,
        }
    }

    /// Builds a record from a delimited row and its header.
    ///
    /// The pairs are expected to be the same length; the caller's CSV reader
    /// rejects rows whose column count differs from the header.
    pub fn from_columns<'a, H, V>(headers: H, values: V) -> Self
    where
        H: IntoIterator<Item = &'a str>,
        V: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<(String, String)> = headers
            .into_iter()
            .zip(values)
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();

        let mut original = Map::new();
        for (key, value) in &fields {
            original.insert(key.clone(), Value::String(value.clone()));
        }

        Self {
            fields,
            original: Value::Object(original),
        }
    }
}

/// One unit of feed input, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Object(ObjectRecord),
    /// A trimmed, non-empty text line.
    Line(String),
}

/// Renders a JSON value the way a feed field is compared: strings verbatim,
/// scalars as their JSON text, arrays as compact JSON. `null` and nested
/// objects render empty, so neither can supply a UPC.
fn stringify_json(value: &Value) -> String {
    match value {
        Value::Null | Value::Object(_) => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) => value.to_string(),
    }
}
