pub mod app_config;
pub mod brands;
pub mod config;
pub mod hashing;
pub mod performance;
pub mod plan;
pub mod platform;
pub mod posting;
pub mod run;
pub mod signals_feed;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, StoreBackend};
pub use brands::{load_brands, BrandProfile, BrandsFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use hashing::content_hash;
pub use performance::summarize_performance;
pub use plan::{
    Adaptation, Calendar, DailyPost, EditorialGuidelines, MonthlyPlan, PostVariation, StoredPlan,
};
pub use platform::{ContentPillar, CtaType, Platform, PostFormat};
pub use posting::{
    ContentPackage, GeneratedPost, PerformanceMetrics, PerformanceSummary, PlatformPerformance,
    PostRecord, PostingResult, Signals,
};
pub use run::{CleanupStats, FailedPost, FailureStatus, OrchestratorState, RunPhase, RunRecord};
pub use signals_feed::{load_signal_feed, SignalFeed};
pub use store::{StorageError, Store};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
