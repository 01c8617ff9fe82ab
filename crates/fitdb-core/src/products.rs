use serde::{Deserialize, Serialize};

/// A product row from an external feed, normalized into the shape the
/// UPC catalog stores regardless of how the feed was formatted.
///
/// Every descriptive field is an empty string when the feed did not carry
/// it. `upc` may also be empty; such records are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Digits only, e.g. `"190340661600"`.
    pub upc: String,
    pub description: String,
    /// Shoe size token as it appeared in the feed (`"7"`, `"7.5"`).
    pub size: String,
    /// Width code (`"D"`, `"2E"`, `"B"`).
    pub width: String,
    pub model_name: String,
    pub brand: String,
    pub image_url: String,
    /// The raw feed record this product came from, kept for traceability.
    pub metadata: serde_json::Value,
}

impl CanonicalProduct {
    /// Returns `true` when the record carries a UPC and can be persisted.
    #[must_use]
    pub fn has_upc(&self) -> bool {
        !self.upc.is_empty()
    }

    /// Projects the record onto the fields written to the catalog.
    ///
    /// Empty strings become `None` so an update leaves the stored value in
    /// place instead of blanking it.
    #[must_use]
    pub fn catalog_fields(&self) -> CatalogFields {
        CatalogFields {
            description: non_empty(&self.description),
            size: non_empty(&self.size),
            width: non_empty(&self.width),
            model_name: non_empty(&self.model_name),
            brand: non_empty(&self.brand),
            image_url: non_empty(&self.image_url),
            metadata: self.metadata.clone(),
        }
    }
}

/// Field values sent to a [`crate::CatalogStore`] for one UPC.
///
/// `None` means "keep whatever the catalog already has".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFields {
    pub description: Option<String>,
    pub size: Option<String>,
    pub width: Option<String>,
    pub model_name: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// Always replaces the stored metadata.
    pub metadata: serde_json::Value,
}

/// Strips every non-digit character from a UPC-ish string.
///
/// `"0-12345 67890-5"` becomes `"012345678905"`. Only ASCII digits are kept.
#[must_use]
pub fn normalize_upc(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
