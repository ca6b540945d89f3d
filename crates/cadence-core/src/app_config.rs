use std::net::SocketAddr;
use std::path::PathBuf;

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

/// Where orchestrator state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Postgres,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub brands_path: PathBuf,
    pub signals_path: Option<PathBuf>,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub dispatch_timeout_secs: u64,
    pub max_concurrent_platforms: usize,
    pub engagement_threshold: f64,
    pub retention_days: u32,
    pub daily_cron: String,
    pub cleanup_cron: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub linkedin_access_token: Option<String>,
    pub linkedin_author_urn: Option<String>,
    pub facebook_access_token: Option<String>,
    pub facebook_page_id: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub api_keys: Vec<String>,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[redacted]")
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("bind_addr", &self.bind_addr)
            .field("store_backend", &self.store_backend)
            .field("data_dir", &self.data_dir)
            .field("database_url", &redact(self.database_url.as_ref()))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("brands_path", &self.brands_path)
            .field("signals_path", &self.signals_path)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("dispatch_timeout_secs", &self.dispatch_timeout_secs)
            .field("max_concurrent_platforms", &self.max_concurrent_platforms)
            .field("engagement_threshold", &self.engagement_threshold)
            .field("retention_days", &self.retention_days)
            .field("daily_cron", &self.daily_cron)
            .field("cleanup_cron", &self.cleanup_cron)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("llm_api_key", &redact(self.llm_api_key.as_ref()))
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field(
                "linkedin_access_token",
                &redact(self.linkedin_access_token.as_ref()),
            )
            .field("linkedin_author_urn", &self.linkedin_author_urn)
            .field(
                "facebook_access_token",
                &redact(self.facebook_access_token.as_ref()),
            )
            .field("facebook_page_id", &self.facebook_page_id)
            .field(
                "twitter_bearer_token",
                &redact(self.twitter_bearer_token.as_ref()),
            )
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
