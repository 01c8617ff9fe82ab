pub mod app_config;
pub mod catalog;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, Environment, DEFAULT_OPTIO_FEED_URL};
pub use catalog::{CatalogEntry, CatalogStore, UpsertOutcome};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{normalize_upc, CanonicalProduct, CatalogFields};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
