//! Line-form normalization for feeds that are plain text, one product per
//! line:
//!
//! ```text
//! 190340661600    M QW-K v4 081 Black/Grey/Nightlife 7 D
//! ```
//!
//! A structured pattern is tried first. When it does not match, a token
//! heuristic takes the first token as UPC and the last two as size and
//! width.

use std::sync::LazyLock;

use fitdb_core::{normalize_upc, CanonicalProduct};
use regex::Regex;
use serde_json::json;

use crate::normalize::is_upc_digits;

/// UPC, an optional leading alphabetic word (gender marker such as `M` or
/// `Mens`), description (lazy), size, width.
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([0-9]{8,14})\s+(?:[A-Za-z]+\s+)?(.+?)\s+([0-9]{1,2}(?:\.[0-9]+)?)\s+([A-Za-z0-9]+)\s*$",
    )
    .expect("valid line pattern regex")
});

/// Normalizes one trimmed text line, or returns `None` when neither the
/// structured pattern nor the token heuristic recognizes it.
#[must_use]
pub fn normalize_line(line: &str) -> Option<CanonicalProduct> {
    let fields = parse_structured(line).or_else(|| parse_tokens(line))?;
    Some(CanonicalProduct {
        upc: fields.upc,
        description: fields.description,
        size: fields.size,
        width: fields.width,
        metadata: json!({ "raw_line": line }),
        ..CanonicalProduct::default()
    })
}

#[derive(Debug, PartialEq, Eq)]
struct LineFields {
    upc: String,
    description: String,
    size: String,
    width: String,
}

fn parse_structured(line: &str) -> Option<LineFields> {
    let caps = LINE_PATTERN.captures(line)?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).trim().to_string();
    Some(LineFields {
        upc: normalize_upc(&group(1)),
        description: group(2),
        size: group(3),
        width: group(4),
    })
}

fn parse_tokens(line: &str) -> Option<LineFields> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (upc, rest) = tokens.split_first()?;
    if tokens.len() < 3 || !is_upc_digits(upc) {
        return None;
    }

    let (width, rest) = rest.split_last()?;
    let (size, mut description) = rest.split_last()?;
    if let Some((first, tail)) = description.split_first() {
        if is_gender_marker(first) {
            description = tail;
        }
    }

    Some(LineFields {
        upc: (*upc).to_string(),
        description: description.join(" "),
        size: (*size).to_string(),
        width: (*width).to_string(),
    })
}

fn is_gender_marker(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}
