//! Normalization from raw feed records to [`fitdb_core::CanonicalProduct`].
//!
//! Object records (JSON and delimited rows) are matched by field name; text
//! lines are delegated to [`crate::line`].

use fitdb_core::{normalize_upc, CanonicalProduct};

use crate::line::normalize_line;
use crate::types::{ObjectRecord, RawRecord};

const UPC_FIELDS: &[&str] = &[
    "upc", "barcode", "gtin", "sku", "upc_code", "upc13", "ean", "ean13",
];
const DESCRIPTION_FIELDS: &[&str] = &["description", "desc", "product", "name"];
const SIZE_FIELDS: &[&str] = &["size", "shoe_size", "us_size", "uk_size"];
const WIDTH_FIELDS: &[&str] = &["width", "shoe_width"];
const MODEL_FIELDS: &[&str] = &["model", "modelname", "style", "style_number"];
const BRAND_FIELDS: &[&str] = &["brand", "manufacturer", "maker"];
const IMAGE_FIELDS: &[&str] = &["image", "image_url", "imageurl", "picture"];

/// Normalizes any raw record into a canonical product.
///
/// Object records always produce a product (possibly with an empty UPC).
/// Line records produce `None` when neither line strategy recognizes them.
#[must_use]
pub fn normalize_record(record: &RawRecord) -> Option<CanonicalProduct> {
    match record {
        RawRecord::Object(object) => Some(normalize_object(object)),
        RawRecord::Line(line) => normalize_line(line),
    }
}

/// Normalizes a string-keyed record by looking for well-known field names.
///
/// Keys are compared trimmed and lower-cased. When no UPC-named field has
/// a value, the first field whose digits form an 8 to 14 digit run is used.
#[must_use]
pub fn normalize_object(record: &ObjectRecord) -> CanonicalProduct {
    let fields = fold_keys(record);
    let pick = |names: &[&str]| -> String {
        names
            .iter()
            .find_map(|name| {
                fields
                    .iter()
                    .find(|(key, value)| key == name && !value.is_empty())
                    .map(|(_, value)| value.clone())
            })
            .unwrap_or_default()
    };

    let mut upc = pick(UPC_FIELDS);
    if upc.is_empty() {
        upc = fields
            .iter()
            .map(|(_, value)| normalize_upc(value))
            .find(|digits| is_upc_digits(digits))
            .unwrap_or_default();
    }

    CanonicalProduct {
        upc: normalize_upc(&upc),
        description: pick(DESCRIPTION_FIELDS),
        size: pick(SIZE_FIELDS),
        width: pick(WIDTH_FIELDS),
        model_name: pick(MODEL_FIELDS),
        brand: pick(BRAND_FIELDS),
        image_url: pick(IMAGE_FIELDS),
        metadata: record.original.clone(),
    }
}

/// Returns `true` for 8 to 14 ASCII digits and nothing else.
pub(crate) fn is_upc_digits(s: &str) -> bool {
    (8..=14).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Lower-cases and trims keys, trims values.
///
/// Keys that collide after folding keep their first position and take the
/// later value.
fn fold_keys(record: &ObjectRecord) -> Vec<(String, String)> {
    let mut folded: Vec<(String, String)> = Vec::with_capacity(record.fields.len());
    for (key, value) in &record.fields {
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();
        match folded.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => folded.push((key, value)),
        }
    }
    folded
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
