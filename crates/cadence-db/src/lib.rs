use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cadence_core::{AppConfig, StorageError, Store, StoreBackend};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod file_store;
pub mod metrics;
pub mod pg_store;
pub mod plans;
pub mod posts;
pub mod runs;

pub use file_store::FileStore;
pub use pg_store::PgStore;
pub use plans::PlanRow;
pub use posts::PostRecordRow;
pub use runs::RunRow;

// Resolves to <workspace-root>/migrations/.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Postgres pool sizing, taken from the `CADENCE_DB_*` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections.min(config.db_max_connections),
            acquire_timeout: Duration::from_secs(config.db_acquire_timeout_secs),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<DbError> for StorageError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Corrupt { table, reason } => StorageError::Corrupt {
                key: table.to_string(),
                reason,
            },
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// Open a pool against `database_url`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if no connection can be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
}

async fn successful_migrations(pool: &PgPool) -> i64 {
    // Missing on a fresh database, which counts as zero.
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Apply pending migrations and report how many ran.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = successful_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = successful_migrations(pool).await;
    Ok(usize::try_from(after.saturating_sub(before)).unwrap_or(0))
}

/// Round-trip a trivial query through the pool.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the database does not answer.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// The configured store plus, for Postgres, the pool behind it.
pub struct OpenedStore {
    pub store: Arc<dyn Store>,
    pub pool: Option<PgPool>,
}

/// Open the store selected by `config.store_backend`.
///
/// Postgres stores run pending migrations before they are returned.
///
/// # Errors
///
/// Returns [`DbError`] if the pool cannot connect or migrations fail.
pub async fn open_store(config: &AppConfig) -> Result<OpenedStore, DbError> {
    match config.store_backend {
        StoreBackend::File => {
            tracing::info!(data_dir = %config.data_dir.display(), "using file store");
            Ok(OpenedStore {
                store: Arc::new(FileStore::new(PathBuf::from(&config.data_dir))),
                pool: None,
            })
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(DbError::MissingDatabaseUrl)?;
            let pool = connect_pool(url, PoolConfig::from_app_config(config)).await?;
            let applied = run_migrations(&pool).await?;
            tracing::info!(applied, "using postgres store");
            Ok(OpenedStore {
                store: Arc::new(PgStore::new(pool.clone())),
                pool: Some(pool),
            })
        }
    }
}
