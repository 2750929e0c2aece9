use url::Url;

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

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub graphql_endpoint: Url,
    pub env: Environment,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Retries for idempotent queries only; crawl mutations are never retried.
    pub query_max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound on a single triggered operation. `None` leaves it to the
    /// HTTP timeout.
    pub operation_timeout_secs: Option<u64>,
    pub page_size: usize,
}
