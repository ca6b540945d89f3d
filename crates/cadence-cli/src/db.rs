//! `db` and `cleanup` command handlers.

use clap::Subcommand;

use cadence_core::AppConfig;

use crate::context::open_store;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check the database connection
    Ping,
}

pub(crate) async fn run_db_command(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let url = config.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is not set; db commands need the Postgres backend")
    })?;
    let pool_config = cadence_db::PoolConfig::from_app_config(config);
    let pool = cadence_db::connect_pool(url, pool_config).await?;

    match command {
        DbCommands::Migrate => {
            let applied = cadence_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
        }
        DbCommands::Ping => {
            cadence_db::health_check(&pool).await?;
            println!("database ok");
        }
    }
    Ok(())
}

/// Delete records older than `days` (or the configured retention window).
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the deletion fails.
pub(crate) async fn run_cleanup(config: &AppConfig, days: Option<u32>) -> anyhow::Result<()> {
    let days = days.unwrap_or(config.retention_days);
    let store = open_store(config).await?;
    let stats = store.cleanup(days).await?;
    tracing::info!(
        days,
        posts_deleted = stats.posts_deleted,
        metrics_deleted = stats.metrics_deleted,
        files_deleted = stats.files_deleted,
        "cleanup complete"
    );
    println!(
        "cleanup (keep {days} days): {} posts, {} metrics, {} files deleted",
        stats.posts_deleted, stats.metrics_deleted, stats.files_deleted
    );
    Ok(())
}
