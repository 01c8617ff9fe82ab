//! Feed import command handlers for the CLI.
//!
//! A fetch failure surfaces as [`ImportError`] so `main` can give it its own
//! exit status. Per-row storage failures never reach this layer; the
//! pipeline logs and skips them.

use anyhow::Context;
use clap::Subcommand;
use fitdb_core::AppConfig;
use fitdb_db::PgCatalogStore;
use fitdb_feed::{
    import_feed, parse_feed, DetectionThresholds, FeedClient, ImportError, ImportOptions,
};

/// Sub-commands available under `import`.
#[derive(Debug, Subcommand)]
pub enum ImportCommands {
    /// Import the Optio product feed
    Optio {
        /// Feed URL (defaults to `OPTIO_FEED_URL`)
        #[arg(long)]
        url: Option<String>,

        /// Fetch and parse the feed without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run_import(command: ImportCommands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        ImportCommands::Optio { url, dry_run } => {
            let url = url.as_deref().unwrap_or(&config.optio_feed_url);
            run_optio_import(config, url, dry_run).await
        }
    }
}

/// Builds pipeline options from the loaded configuration.
pub(crate) fn import_options(config: &AppConfig) -> ImportOptions {
    ImportOptions {
        thresholds: DetectionThresholds {
            sample_size: config.import_sample_size,
            missing_upc_ratio: config.import_missing_upc_ratio,
            upc_prefixed_line_threshold: config.import_upc_line_threshold,
        },
        progress_every: config.import_progress_every,
        summary_sample: config.import_summary_sample,
    }
}

/// Runs the Optio import against `url`.
///
/// When `dry_run` is `true` the feed is fetched and parsed, the counts are
/// printed, and the database is never contacted.
///
/// # Errors
///
/// Returns [`ImportError`] (wrapped in `anyhow`) when the feed cannot be
/// fetched, and other errors when the HTTP client cannot be built or the
/// database is unreachable.
async fn run_optio_import(config: &AppConfig, url: &str, dry_run: bool) -> anyhow::Result<()> {
    let client = FeedClient::new(config.feed_request_timeout_secs, &config.feed_user_agent)
        .context("failed to build feed client")?;
    let options = import_options(config);

    if dry_run {
        tracing::info!(url, "dry run: fetching feed");
        let body = client.fetch_text(url).await.map_err(ImportError::from)?;
        let feed = parse_feed(&body, &options.thresholds);
        tracing::info!(
            parser = %feed.format,
            rows = feed.products.len(),
            with_upc = feed.upc_count(),
            "dry run: parsed feed; no catalog writes"
        );
        println!(
            "dry-run: {} rows parsed as {} ({} with a UPC)",
            feed.products.len(),
            feed.format,
            feed.upc_count()
        );
        return Ok(());
    }

    let pool = crate::connect(config).await?;
    let store = PgCatalogStore::new(pool);
    let report = import_feed(&client, url, &store, &options).await?;

    println!(
        "import complete ({}): {} rows, {} created, {} updated, {} skipped",
        report.format,
        report.rows_parsed,
        report.summary.created,
        report.summary.updated,
        report.summary.skipped
    );
    Ok(())
}
