use crate::app_config::{AppConfig, Environment, StoreBackend};
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
/// Decoupled from the process environment so it can be driven by a plain
/// `HashMap` in tests.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::str::FromStr;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
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

    let env = parse_environment(&or_default("CADENCE_ENV", "development"));
    let log_level = or_default("CADENCE_LOG_LEVEL", "info");

    let bind_addr = SocketAddr::from_str(&or_default("CADENCE_BIND_ADDR", "0.0.0.0:3000"))
        .map_err(|e| invalid("CADENCE_BIND_ADDR", e.to_string()))?;

    let store_backend = parse_store_backend(&or_default("CADENCE_STORE_BACKEND", "file"))
        .ok_or_else(|| {
            invalid(
                "CADENCE_STORE_BACKEND",
                "expected 'file' or 'postgres'".to_string(),
            )
        })?;
    let data_dir = PathBuf::from(or_default("CADENCE_DATA_DIR", "./data/orchestrator"));

    let database_url = optional("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
        return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }
    let db_max_connections = parse_u32("CADENCE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CADENCE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CADENCE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let brands_path = PathBuf::from(or_default("CADENCE_BRANDS_PATH", "./config/brands.yaml"));
    let signals_path = optional("CADENCE_SIGNALS_PATH").map(PathBuf::from);

    let max_retries = parse_u32("CADENCE_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("CADENCE_RETRY_BACKOFF_BASE_MS", "1000")?;
    let dispatch_timeout_secs = parse_u64("CADENCE_DISPATCH_TIMEOUT_SECS", "120")?;
    if dispatch_timeout_secs == 0 {
        return Err(invalid(
            "CADENCE_DISPATCH_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let max_concurrent_platforms = or_default("CADENCE_MAX_CONCURRENT_PLATFORMS", "1")
        .parse::<usize>()
        .map_err(|e| invalid("CADENCE_MAX_CONCURRENT_PLATFORMS", e.to_string()))?;

    let engagement_threshold = or_default("CADENCE_ENGAGEMENT_THRESHOLD", "5.0")
        .parse::<f64>()
        .map_err(|e| invalid("CADENCE_ENGAGEMENT_THRESHOLD", e.to_string()))?;
    if !engagement_threshold.is_finite() || engagement_threshold < 0.0 {
        return Err(invalid(
            "CADENCE_ENGAGEMENT_THRESHOLD",
            "must be a non-negative number".to_string(),
        ));
    }

    let retention_days = parse_u32("CADENCE_RETENTION_DAYS", "90")?;
    let daily_cron = or_default("CADENCE_DAILY_CRON", "0 0 8 * * *");
    let cleanup_cron = or_default("CADENCE_CLEANUP_CRON", "0 30 3 * * SUN");

    let http_timeout_secs = parse_u64("CADENCE_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CADENCE_USER_AGENT", "cadence/0.1 (content-orchestrator)");

    let api_keys = optional("CADENCE_API_KEYS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(AppConfig {
        env,
        log_level,
        bind_addr,
        store_backend,
        data_dir,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        brands_path,
        signals_path,
        max_retries,
        retry_backoff_base_ms,
        dispatch_timeout_secs,
        max_concurrent_platforms,
        engagement_threshold,
        retention_days,
        daily_cron,
        cleanup_cron,
        http_timeout_secs,
        user_agent,
        llm_api_key: optional("LLM_API_KEY"),
        llm_base_url: or_default("LLM_BASE_URL", "https://api.openai.com/v1"),
        llm_model: or_default("LLM_MODEL", "gpt-4o-mini"),
        linkedin_access_token: optional("LINKEDIN_ACCESS_TOKEN"),
        linkedin_author_urn: optional("LINKEDIN_AUTHOR_URN"),
        facebook_access_token: optional("FACEBOOK_ACCESS_TOKEN"),
        facebook_page_id: optional("FACEBOOK_PAGE_ID"),
        twitter_bearer_token: optional("TWITTER_BEARER_TOKEN"),
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_store_backend(s: &str) -> Option<StoreBackend> {
    match s.to_ascii_lowercase().as_str() {
        "file" | "json" => Some(StoreBackend::File),
        "postgres" | "postgresql" => Some(StoreBackend::Postgres),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
