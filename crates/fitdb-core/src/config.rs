use crate::app_config::{AppConfig, Environment, DEFAULT_OPTIO_FEED_URL};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("FITDB_ENV", "development"))?;
    let log_level = or_default("FITDB_LOG_LEVEL", "info");

    let optio_feed_url = or_default("OPTIO_FEED_URL", DEFAULT_OPTIO_FEED_URL);
    if optio_feed_url.trim().is_empty() {
        return Err(invalid("OPTIO_FEED_URL", "must not be empty".to_string()));
    }
    let feed_user_agent = or_default("FITDB_FEED_USER_AGENT", "fitdb/0.1 (optio-import)");
    let feed_request_timeout_secs = match lookup("FITDB_FEED_REQUEST_TIMEOUT_SECS") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("FITDB_FEED_REQUEST_TIMEOUT_SECS", e.to_string()))?,
        ),
        Err(_) => None,
    };

    let db_max_connections = parse_u32("FITDB_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("FITDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FITDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let import_sample_size = parse_usize("FITDB_IMPORT_SAMPLE_SIZE", "20")?;
    let import_missing_upc_ratio = parse_ratio(&or_default("FITDB_IMPORT_MISSING_UPC_RATIO", "0.6"))
        .map_err(|reason| invalid("FITDB_IMPORT_MISSING_UPC_RATIO", reason))?;
    let import_upc_line_threshold = parse_usize("FITDB_IMPORT_UPC_LINE_THRESHOLD", "3")?;
    let import_progress_every = parse_usize("FITDB_IMPORT_PROGRESS_EVERY", "500")?;
    if import_progress_every == 0 {
        return Err(invalid(
            "FITDB_IMPORT_PROGRESS_EVERY",
            "must be greater than zero".to_string(),
        ));
    }
    let import_summary_sample = parse_usize("FITDB_IMPORT_SUMMARY_SAMPLE", "5")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        optio_feed_url,
        feed_user_agent,
        feed_request_timeout_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        import_sample_size,
        import_missing_upc_ratio,
        import_upc_line_threshold,
        import_progress_every,
        import_summary_sample,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FITDB_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Parses a fraction in `[0, 1]`.
fn parse_ratio(raw: &str) -> Result<f64, String> {
    let value = raw.parse::<f64>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside the range 0..=1"))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
