//! The UPC catalog contract the feed importer writes through.
//!
//! The importer only ever needs two operations: upsert one product keyed by
//! UPC, and read one back. Storage engines implement [`CatalogStore`]; the
//! importer receives the store as an argument, so tests substitute an
//! in-memory double.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::products::CatalogFields;

/// A persisted catalog row, keyed uniquely by `upc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub upc: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub width: Option<String>,
    pub model_name: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert inserted a new UPC or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "created"),
            UpsertOutcome::Updated => write!(f, "updated"),
        }
    }
}

/// Key-value persistence for catalog entries, keyed by UPC.
///
/// Implementations must make each `upsert` atomic for its row: a created
/// entry takes every `Some` field, an updated entry overwrites only the
/// `Some` fields and always replaces `metadata`.
pub trait CatalogStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates the entry for `upc` or updates it in place.
    fn upsert(
        &self,
        upc: &str,
        fields: &CatalogFields,
    ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send;

    /// Returns the entry for `upc`, if one exists.
    fn get(
        &self,
        upc: &str,
    ) -> impl Future<Output = Result<Option<CatalogEntry>, Self::Error>> + Send;
}
