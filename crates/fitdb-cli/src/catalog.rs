//! Catalog query command handlers for the CLI.

use clap::Subcommand;
use fitdb_core::{normalize_upc, AppConfig, CatalogStore};
use fitdb_db::PgCatalogStore;

/// Sub-commands available under `catalog`.
#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// Print the catalog entry for a UPC as JSON
    Lookup {
        /// UPC to look up; non-digit characters are ignored
        upc: String,
    },
}

pub(crate) async fn run_catalog(command: CatalogCommands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        CatalogCommands::Lookup { upc } => run_lookup(config, &upc).await,
    }
}

/// Reduces a user-supplied UPC to its digits.
pub(crate) fn parse_lookup_upc(raw: &str) -> anyhow::Result<String> {
    let upc = normalize_upc(raw);
    if upc.is_empty() {
        anyhow::bail!("'{raw}' contains no digits; expected a UPC");
    }
    Ok(upc)
}

async fn run_lookup(config: &AppConfig, raw: &str) -> anyhow::Result<()> {
    let upc = parse_lookup_upc(raw)?;
    let store = PgCatalogStore::new(crate::connect(config).await?);

    let entry = store
        .get(&upc)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no catalog entry for UPC {upc}"))?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}
