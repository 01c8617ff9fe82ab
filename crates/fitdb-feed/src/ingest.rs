//! Feed import pipeline: fetch → detect → normalize → upsert.
//!
//! Rows are processed one at a time in feed order. Only the fetch can fail
//! the run; a row that cannot be stored is logged, counted as skipped, and
//! the loop moves on.

use std::collections::VecDeque;

use fitdb_core::{CanonicalProduct, CatalogEntry, CatalogStore, UpsertOutcome};
use thiserror::Error;

use crate::client::FeedClient;
use crate::detect::{detect_format, DetectionThresholds};
use crate::error::FeedError;
use crate::normalize::normalize_record;
use crate::types::DetectedFormat;

/// Errors that abort an import before any catalog write.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] FeedError),
}

/// Knobs for one import run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    pub thresholds: DetectionThresholds,
    /// Log a progress line every this many rows. `0` disables progress logs.
    pub progress_every: usize,
    /// Maximum number of recently touched entries read back for the summary.
    pub summary_sample: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            thresholds: DetectionThresholds::default(),
            progress_every: 500,
            summary_sample: 5,
        }
    }
}

/// A feed body after format detection and per-row normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeed {
    pub format: DetectedFormat,
    pub products: Vec<CanonicalProduct>,
}

impl NormalizedFeed {
    /// Number of products that carry a UPC and would reach the store.
    #[must_use]
    pub fn upc_count(&self) -> usize {
        self.products.iter().filter(|p| p.has_upc()).count()
    }
}

/// Result of upserting a single product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
    Skipped,
}

impl From<UpsertOutcome> for RowOutcome {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created => RowOutcome::Created,
            UpsertOutcome::Updated => RowOutcome::Updated,
        }
    }
}

/// Outcome counters for one run, plus a few entries read back afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Most recently touched entries first.
    pub sample: Vec<CatalogEntry>,
}

impl RunSummary {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Created => self.created += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Rows that resulted in a catalog write.
    #[must_use]
    pub fn touched(&self) -> usize {
        self.created + self.updated
    }
}

/// Everything an import run reports back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub format: DetectedFormat,
    pub rows_parsed: usize,
    pub summary: RunSummary,
}

/// Detects the feed format and normalizes every record.
///
/// Line records that no strategy recognizes are dropped here; object records
/// are always kept, even without a UPC, so they are counted as skipped later.
#[must_use]
pub fn parse_feed(text: &str, thresholds: &DetectionThresholds) -> NormalizedFeed {
    let parsed = detect_format(text, thresholds);
    let products = parsed
        .records
        .iter()
        .filter_map(normalize_record)
        .collect();
    NormalizedFeed {
        format: parsed.format,
        products,
    }
}

/// Writes one product to the store.
///
/// Products without a UPC never reach the store. Store errors are logged
/// with the UPC and reported as [`RowOutcome::Skipped`].
pub async fn upsert_product<S: CatalogStore>(store: &S, product: &CanonicalProduct) -> RowOutcome {
    if !product.has_upc() {
        return RowOutcome::Skipped;
    }

    match store.upsert(&product.upc, &product.catalog_fields()).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            tracing::error!(upc = %product.upc, error = %e, "failed to upsert catalog entry");
            RowOutcome::Skipped
        }
    }
}

/// Upserts `products` in order and tallies the outcomes.
///
/// When at least one row was written, up to `options.summary_sample` of the
/// most recently touched UPCs are read back into [`RunSummary::sample`].
pub async fn upsert_products<S: CatalogStore>(
    store: &S,
    products: &[CanonicalProduct],
    options: &ImportOptions,
) -> RunSummary {
    let total = products.len();
    let mut summary = RunSummary::default();
    let mut recent: VecDeque<&str> = VecDeque::with_capacity(options.summary_sample);

    for (idx, product) in products.iter().enumerate() {
        let outcome = upsert_product(store, product).await;
        if outcome != RowOutcome::Skipped {
            remember(&mut recent, &product.upc, options.summary_sample);
        }
        summary.record(outcome);

        let processed = idx + 1;
        if options.progress_every > 0 && processed % options.progress_every == 0 {
            tracing::info!(processed, total, "import progress");
        }
    }

    if summary.touched() > 0 {
        summary.sample = read_back(store, &recent).await;
    }
    summary
}

/// Runs a full import of the feed at `url` into `store`.
///
/// # Errors
///
/// Returns [`ImportError::Fetch`] when the feed cannot be downloaded, answers
/// with a non-2xx status, or is empty. No catalog write has happened then.
pub async fn import_feed<S: CatalogStore>(
    client: &FeedClient,
    url: &str,
    store: &S,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    tracing::info!(url, "fetching feed");
    let body = client.fetch_text(url).await?;

    let feed = parse_feed(&body, &options.thresholds);
    let rows_parsed = feed.products.len();
    tracing::info!(
        parser = %feed.format,
        rows = rows_parsed,
        "parsed feed; processing rows"
    );

    let summary = upsert_products(store, &feed.products, options).await;
    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "import complete"
    );
    for entry in &summary.sample {
        tracing::info!(
            id = entry.id,
            upc = %entry.upc,
            description = entry.description.as_deref().unwrap_or(""),
            size = entry.size.as_deref().unwrap_or(""),
            width = entry.width.as_deref().unwrap_or(""),
            model_name = entry.model_name.as_deref().unwrap_or(""),
            brand = entry.brand.as_deref().unwrap_or(""),
            "sample catalog entry"
        );
    }

    Ok(ImportReport {
        format: feed.format,
        rows_parsed,
        summary,
    })
}

/// Moves `upc` to the front of `recent`, keeping at most `cap` distinct UPCs.
fn remember<'a>(recent: &mut VecDeque<&'a str>, upc: &'a str, cap: usize) {
    if cap == 0 {
        return;
    }
    recent.retain(|existing| *existing != upc);
    recent.push_front(upc);
    recent.truncate(cap);
}

async fn read_back<S: CatalogStore>(store: &S, upcs: &VecDeque<&str>) -> Vec<CatalogEntry> {
    let mut entries = Vec::with_capacity(upcs.len());
    for upc in upcs {
        match store.get(upc).await {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => tracing::warn!(upc, "touched catalog entry not found on read-back"),
            Err(e) => tracing::warn!(upc, error = %e, "failed to read back catalog entry"),
        }
    }
    entries
}
