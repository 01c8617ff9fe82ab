pub mod client;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod line;
pub mod normalize;
pub mod types;

pub use client::FeedClient;
pub use detect::{detect_format, DetectionThresholds, ParsedFeed};
pub use error::FeedError;
pub use ingest::{
    import_feed, parse_feed, upsert_product, upsert_products, ImportError, ImportOptions,
    ImportReport, NormalizedFeed, RowOutcome, RunSummary,
};
pub use normalize::{normalize_object, normalize_record};
pub use types::{DetectedFormat, ObjectRecord, RawRecord};
