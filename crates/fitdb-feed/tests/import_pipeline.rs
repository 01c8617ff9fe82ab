//! Pipeline tests against an in-memory `CatalogStore`.
//!
//! The store double keeps entries in a `BTreeMap`, can be told to fail for
//! specific UPCs, and records every UPC it was asked to write so tests can
//! assert what reached it.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fitdb_core::{CanonicalProduct, CatalogEntry, CatalogFields, CatalogStore, UpsertOutcome};
use fitdb_feed::{
    import_feed, parse_feed, upsert_product, upsert_products, DetectedFormat, DetectionThresholds,
    FeedClient, FeedError, ImportError, ImportOptions, RowOutcome,
};

// ---------------------------------------------------------------------------
// In-memory store double
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("simulated storage failure for UPC {0}")]
struct SimulatedFailure(String);

#[derive(Default)]
struct MemoryStore {
    entries: Mutex<BTreeMap<String, CatalogEntry>>,
    failing: HashSet<String>,
    writes: Mutex<Vec<String>>,
}

impl MemoryStore {
    fn failing_on(upcs: &[&str]) -> Self {
        Self {
            failing: upcs.iter().map(|u| (*u).to_string()).collect(),
            ..Self::default()
        }
    }

    fn upcs(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    fn entry(&self, upc: &str) -> Option<CatalogEntry> {
        self.entries.lock().unwrap().get(upc).cloned()
    }

    fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

fn merge(slot: &mut Option<String>, incoming: Option<&String>) {
    if let Some(value) = incoming {
        *slot = Some(value.clone());
    }
}

impl CatalogStore for MemoryStore {
    type Error = SimulatedFailure;

    async fn upsert(
        &self,
        upc: &str,
        fields: &CatalogFields,
    ) -> Result<UpsertOutcome, SimulatedFailure> {
        self.writes.lock().unwrap().push(upc.to_string());
        if self.failing.contains(upc) {
            return Err(SimulatedFailure(upc.to_string()));
        }

        let mut entries = self.entries.lock().unwrap();
        let now = Utc::now();
        if let Some(entry) = entries.get_mut(upc) {
            merge(&mut entry.description, fields.description.as_ref());
            merge(&mut entry.size, fields.size.as_ref());
            merge(&mut entry.width, fields.width.as_ref());
            merge(&mut entry.model_name, fields.model_name.as_ref());
            merge(&mut entry.brand, fields.brand.as_ref());
            merge(&mut entry.image_url, fields.image_url.as_ref());
            entry.metadata = fields.metadata.clone();
            entry.updated_at = now;
            return Ok(UpsertOutcome::Updated);
        }

        let id = i64::try_from(entries.len()).unwrap() + 1;
        entries.insert(
            upc.to_string(),
            CatalogEntry {
                id,
                upc: upc.to_string(),
                description: fields.description.clone(),
                size: fields.size.clone(),
                width: fields.width.clone(),
                model_name: fields.model_name.clone(),
                brand: fields.brand.clone(),
                image_url: fields.image_url.clone(),
                metadata: fields.metadata.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(UpsertOutcome::Created)
    }

    async fn get(&self, upc: &str) -> Result<Option<CatalogEntry>, SimulatedFailure> {
        Ok(self.entry(upc))
    }
}

fn product(upc: &str, description: &str) -> CanonicalProduct {
    CanonicalProduct {
        upc: upc.to_string(),
        description: description.to_string(),
        size: "7".to_string(),
        width: "D".to_string(),
        metadata: json!({ "raw_line": format!("{upc} {description} 7 D") }),
        ..CanonicalProduct::default()
    }
}

const OPTIO_FEED: &str = "\
190340661600    M QW-K v4 081 Black/Grey/Nightlife 7 D
190340661617    M QW-K v4 081 Black/Grey/Nightlife 7.5 D
not a product line
190340661624    W Fresh Foam 1080 White 8 B
";

// ---------------------------------------------------------------------------
// Upserter properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_upc_twice_creates_then_updates() {
    let store = MemoryStore::default();
    let products = vec![
        product("190340661600", "QW-K v4"),
        product("190340661600", "QW-K v4 Nightlife"),
    ];

    let summary = upsert_products(&store, &products, &ImportOptions::default()).await;

    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(store.upcs(), vec!["190340661600".to_string()]);
    let entry = store.entry("190340661600").unwrap();
    assert_eq!(entry.description.as_deref(), Some("QW-K v4 Nightlife"));
}

#[tokio::test]
async fn empty_upc_never_reaches_the_store() {
    let store = MemoryStore::default();

    let outcome = upsert_product(&store, &product("", "Gift card")).await;

    assert_eq!(outcome, RowOutcome::Skipped);
    assert!(store.writes().is_empty());

    let summary = upsert_products(
        &store,
        &[product("", "Gift card")],
        &ImportOptions::default(),
    )
    .await;
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.touched(), 0);
    assert!(summary.sample.is_empty());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn store_failure_is_skipped_and_processing_continues() {
    let store = MemoryStore::failing_on(&["190340661617"]);
    let products = vec![
        product("190340661600", "QW-K v4"),
        product("190340661617", "QW-K v4"),
        product("190340661624", "Fresh Foam 1080"),
    ];

    let summary = upsert_products(&store, &products, &ImportOptions::default()).await;

    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        store.writes(),
        vec!["190340661600", "190340661617", "190340661624"]
    );
    assert!(store.entry("190340661624").is_some());
    assert!(store.entry("190340661617").is_none());
}

#[tokio::test]
async fn empty_fields_leave_existing_values_in_place() {
    let store = MemoryStore::default();
    let mut first = product("190340661600", "QW-K v4");
    first.brand = "New Balance".to_string();
    let mut second = product("190340661600", "");
    second.size = "7.5".to_string();
    second.metadata = json!({ "raw_line": "second" });

    upsert_products(&store, &[first, second], &ImportOptions::default()).await;

    let entry = store.entry("190340661600").unwrap();
    assert_eq!(entry.description.as_deref(), Some("QW-K v4"));
    assert_eq!(entry.brand.as_deref(), Some("New Balance"));
    assert_eq!(entry.size.as_deref(), Some("7.5"));
    assert_eq!(entry.metadata, json!({ "raw_line": "second" }));
}

#[tokio::test]
async fn summary_sample_is_bounded_and_most_recent_first() {
    let store = MemoryStore::default();
    let products: Vec<CanonicalProduct> = (0..8)
        .map(|i| product(&format!("19034066160{i}"), "QW-K v4"))
        .collect();
    let options = ImportOptions {
        summary_sample: 3,
        ..ImportOptions::default()
    };

    let summary = upsert_products(&store, &products, &options).await;

    let sampled: Vec<&str> = summary.sample.iter().map(|e| e.upc.as_str()).collect();
    assert_eq!(sampled, vec!["190340661607", "190340661606", "190340661605"]);
}

// ---------------------------------------------------------------------------
// Whole-pipeline properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn json_feed_counts_recoverable_upcs() {
    let text = json!([
        { "UPC": "190340661600", "Description": "QW-K v4" },
        { "gtin": "0-19034-06616-17", "name": "QW-K v4" },
        { "name": "Gift card", "price": "25.00" },
        { "Style": "M1080", "Ref": "190340661624" }
    ])
    .to_string();

    let feed = parse_feed(&text, &DetectionThresholds::default());
    assert_eq!(feed.format, DetectedFormat::Json);
    assert_eq!(feed.upc_count(), 3);

    let store = MemoryStore::default();
    let summary = upsert_products(&store, &feed.products, &ImportOptions::default()).await;
    assert_eq!(summary.created, 3);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn rerunning_the_same_feed_creates_nothing_new() {
    let store = MemoryStore::default();
    let feed = parse_feed(OPTIO_FEED, &DetectionThresholds::default());
    assert_eq!(feed.format, DetectedFormat::Line);

    let first = upsert_products(&store, &feed.products, &ImportOptions::default()).await;
    let upcs_after_first = store.upcs();
    let second = upsert_products(&store, &feed.products, &ImportOptions::default()).await;

    assert_eq!(first.created, 3);
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 3);
    assert_eq!(store.upcs(), upcs_after_first);
}

#[tokio::test]
async fn import_feed_end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OPTIO_FEED))
        .mount(&server)
        .await;

    let client = FeedClient::new(Some(5), "fitdb-test/0.1").unwrap();
    let store = MemoryStore::default();
    let url = format!("{}/app/api.php?p=udswksyt", server.uri());

    let report = import_feed(&client, &url, &store, &ImportOptions::default())
        .await
        .expect("import should succeed");

    assert_eq!(report.format, DetectedFormat::Line);
    assert_eq!(report.rows_parsed, 3);
    assert_eq!(report.summary.created, 3);
    assert_eq!(report.summary.sample.len(), 3);
    assert_eq!(report.summary.sample[0].upc, "190340661624");

    let entry = store.entry("190340661600").unwrap();
    assert_eq!(
        entry.description.as_deref(),
        Some("QW-K v4 081 Black/Grey/Nightlife")
    );
    assert_eq!(entry.size.as_deref(), Some("7"));
    assert_eq!(entry.width.as_deref(), Some("D"));
    assert_eq!(
        entry.metadata,
        json!({ "raw_line": "190340661600    M QW-K v4 081 Black/Grey/Nightlife 7 D" })
    );
}

#[tokio::test]
async fn import_feed_failed_fetch_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = FeedClient::new(Some(5), "fitdb-test/0.1").unwrap();
    let store = MemoryStore::default();

    let err = import_feed(
        &client,
        &format!("{}/feed", server.uri()),
        &store,
        &ImportOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(
            err,
            ImportError::Fetch(FeedError::UnexpectedStatus { status: 500, .. })
        ),
        "expected fatal status error, got: {err:?}"
    );
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn import_feed_empty_body_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let client = FeedClient::new(Some(5), "fitdb-test/0.1").unwrap();
    let store = MemoryStore::default();

    let err = import_feed(
        &client,
        &format!("{}/feed", server.uri()),
        &store,
        &ImportOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ImportError::Fetch(FeedError::EmptyBody { .. })));
    assert!(store.writes().is_empty());
}
