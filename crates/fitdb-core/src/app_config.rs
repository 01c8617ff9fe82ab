/// Feed endpoint used when `OPTIO_FEED_URL` is not set.
pub const DEFAULT_OPTIO_FEED_URL: &str = "https://app.getopt.io/app/api.php?p=udswksyt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub optio_feed_url: String,
    pub feed_user_agent: String,
    /// `None` leaves the feed request without a caller-imposed deadline.
    pub feed_request_timeout_secs: Option<u64>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Number of leading rows (and text lines) the format detector inspects.
    pub import_sample_size: usize,
    /// Share of sampled delimited rows without a UPC that forces line parsing.
    pub import_missing_upc_ratio: f64,
    /// Number of UPC-prefixed text lines in the sample that forces line parsing.
    pub import_upc_line_threshold: usize,
    pub import_progress_every: usize,
    pub import_summary_sample: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("optio_feed_url", &self.optio_feed_url)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("feed_request_timeout_secs", &self.feed_request_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("import_sample_size", &self.import_sample_size)
            .field("import_missing_upc_ratio", &self.import_missing_upc_ratio)
            .field("import_upc_line_threshold", &self.import_upc_line_threshold)
            .field("import_progress_every", &self.import_progress_every)
            .field("import_summary_sample", &self.import_summary_sample)
            .finish()
    }
}
