mod catalog;
mod import;

use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use fitdb_core::AppConfig;
use fitdb_feed::ImportError;
use tracing_subscriber::EnvFilter;

use crate::catalog::CatalogCommands;
use crate::import::ImportCommands;

/// Exit status for an import whose feed could not be fetched.
const EXIT_IMPORT_FAILED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "fitdb-cli")]
#[command(about = "Fitting catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import product feeds into the UPC catalog
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Query the UPC catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = fitdb_core::load_app_config()?;
    init_tracing(&config)?;
    tracing::debug!(env = %config.env, ?config, "configuration loaded");

    match command {
        Commands::Db { command } => run_db(command, &config).await,
        Commands::Import { command } => import::run_import(command, &config).await,
        Commands::Catalog { command } => catalog::run_catalog(command, &config).await,
    }
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

/// Fetch failures during an import exit with status 2, everything else with 1.
fn exit_code_for(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<ImportError>().is_some() {
        EXIT_IMPORT_FAILED
    } else {
        1
    }
}

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = fitdb_db::PoolConfig::from_app_config(config);
    let pool = fitdb_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

async fn run_db(command: DbCommands, config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    match command {
        DbCommands::Ping => {
            fitdb_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = fitdb_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}
