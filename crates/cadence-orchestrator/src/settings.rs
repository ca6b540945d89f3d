use std::time::Duration;

use cadence_core::AppConfig;

/// Knobs for the daily engine, normally taken from [`AppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Re-attempts after the first dispatch of a post.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound on a single dispatch attempt.
    pub dispatch_timeout: Duration,
    /// Platforms dispatched concurrently. `1` keeps strict calendar order.
    pub max_concurrent_platforms: usize,
    /// Yesterday's average engagement rate (percent) above which continuity
    /// framing is applied.
    pub engagement_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_base_ms: 1_000,
            dispatch_timeout: Duration::from_secs(120),
            max_concurrent_platforms: 1,
            engagement_threshold: 5.0,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            dispatch_timeout: Duration::from_secs(config.dispatch_timeout_secs),
            max_concurrent_platforms: config.max_concurrent_platforms.max(1),
            engagement_threshold: config.engagement_threshold,
        }
    }
}
