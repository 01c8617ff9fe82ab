//! Database operations for the `product_upcs` catalog table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fitdb_core::{CatalogEntry, CatalogFields, CatalogStore, UpsertOutcome};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `product_upcs` table.
///
/// Descriptive columns are nullable: a UPC first seen in a sparse feed only
/// carries what that feed knew.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductUpcRow {
    pub id: i64,
    pub upc: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub width: Option<String>,
    pub model_name: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// The raw feed record last written for this UPC.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductUpcRow> for CatalogEntry {
    fn from(row: ProductUpcRow) -> Self {
        CatalogEntry {
            id: row.id,
            upc: row.upc,
            description: row.description,
            size: row.size,
            width: row.width,
            model_name: row.model_name,
            brand: row.brand,
            image_url: row.image_url,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// product_upcs operations
// ---------------------------------------------------------------------------

/// Upserts the catalog row for `upc`.
///
/// Conflicts on `upc` overwrite each descriptive column only when the new
/// value is non-null, always replace `metadata`, and bump `updated_at`.
/// Postgres reports `xmax = 0` for a freshly inserted tuple, which tells a
/// create apart from an update in the same statement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product_upc(
    pool: &PgPool,
    upc: &str,
    fields: &CatalogFields,
) -> Result<UpsertOutcome, DbError> {
    let inserted: bool = sqlx::query_scalar::<_, bool>(
        "INSERT INTO product_upcs \
             (upc, description, size, width, model_name, brand, image_url, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8::jsonb) \
         ON CONFLICT (upc) DO UPDATE SET \
             description = COALESCE(EXCLUDED.description, product_upcs.description), \
             size        = COALESCE(EXCLUDED.size,        product_upcs.size), \
             width       = COALESCE(EXCLUDED.width,       product_upcs.width), \
             model_name  = COALESCE(EXCLUDED.model_name,  product_upcs.model_name), \
             brand       = COALESCE(EXCLUDED.brand,       product_upcs.brand), \
             image_url   = COALESCE(EXCLUDED.image_url,   product_upcs.image_url), \
             metadata    = EXCLUDED.metadata, \
             updated_at  = NOW() \
         RETURNING (xmax = 0) AS inserted",
    )
    .bind(upc)
    .bind(&fields.description)
    .bind(&fields.size)
    .bind(&fields.width)
    .bind(&fields.model_name)
    .bind(&fields.brand)
    .bind(&fields.image_url)
    .bind(&fields.metadata)
    .fetch_one(pool)
    .await?;

    let outcome = if inserted {
        UpsertOutcome::Created
    } else {
        UpsertOutcome::Updated
    };
    tracing::debug!(upc, %outcome, "upserted product_upcs row");
    Ok(outcome)
}

/// Returns the catalog row for `upc`, or `None` if it has never been stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_upc(pool: &PgPool, upc: &str) -> Result<Option<ProductUpcRow>, DbError> {
    let row = sqlx::query_as::<_, ProductUpcRow>(
        "SELECT id, upc, description, size, width, model_name, brand, image_url, \
                metadata, created_at, updated_at \
         FROM product_upcs \
         WHERE upc = $1",
    )
    .bind(upc)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// CatalogStore implementation
// ---------------------------------------------------------------------------

/// [`CatalogStore`] backed by the `product_upcs` table.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CatalogStore for PgCatalogStore {
    type Error = DbError;

    async fn upsert(&self, upc: &str, fields: &CatalogFields) -> Result<UpsertOutcome, DbError> {
        upsert_product_upc(&self.pool, upc, fields).await
    }

    async fn get(&self, upc: &str) -> Result<Option<CatalogEntry>, DbError> {
        Ok(get_product_upc(&self.pool, upc)
            .await?
            .map(CatalogEntry::from))
    }
}
