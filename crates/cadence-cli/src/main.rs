mod context;
mod db;
mod metrics;
mod plan;
mod run;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cadence_core::Platform;

use crate::db::DbCommands;
use crate::metrics::{MetricsCommands, PerfCommands};
use crate::plan::PlanCommands;

#[derive(Debug, Parser)]
#[command(name = "cadence-cli")]
#[command(about = "Plan, publish and track a brand's social media calendar")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate and inspect monthly content plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Execute the daily posting run
    Run {
        /// Brand name (defaults to the scheduled brand in brands.yaml)
        #[arg(long)]
        brand: Option<String>,
        /// Run date as YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Re-run even if the date was already executed
        #[arg(long)]
        force: bool,
        /// Walk every step without generating, publishing or writing
        #[arg(long)]
        dry_run: bool,
        /// Only post to these platforms (repeatable)
        #[arg(long = "platform")]
        platforms: Vec<Platform>,
    },
    /// Re-dispatch one failed post
    Retry {
        /// Date of the failed post (YYYY-MM-DD)
        date: NaiveDate,
        /// Platform of the failed post
        platform: Platform,
        /// Brand name (defaults to the scheduled brand in brands.yaml)
        #[arg(long)]
        brand: Option<String>,
    },
    /// Show the stored execution status for a day
    Status {
        /// Brand name (defaults to the scheduled brand in brands.yaml)
        #[arg(long)]
        brand: Option<String>,
        /// Date as YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record engagement metrics for published posts
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },
    /// Summarise recent performance
    Perf {
        #[command(subcommand)]
        command: PerfCommands,
    },
    /// Delete post records, metrics and state older than the retention window
    Cleanup {
        /// Days to keep (defaults to CADENCE_RETENTION_DAYS)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Database maintenance (Postgres backend)
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("cadence-cli ready; run `cadence-cli --help` for commands");
        return Ok(());
    };

    let config = cadence_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Plan { command } => plan::run_plan_command(&config, command).await,
        Commands::Run {
            brand,
            date,
            force,
            dry_run,
            platforms,
        } => {
            let options = run::RunOptions {
                brand,
                date,
                force,
                dry_run,
                platforms,
            };
            run::run_daily(&config, options).await
        }
        Commands::Retry {
            date,
            platform,
            brand,
        } => run::run_retry(&config, brand.as_deref(), date, platform).await,
        Commands::Status { brand, date } => {
            run::run_status(&config, brand.as_deref(), date).await
        }
        Commands::Metrics { command } => metrics::run_metrics_command(&config, command).await,
        Commands::Perf { command } => metrics::run_perf_command(&config, command).await,
        Commands::Cleanup { days } => db::run_cleanup(&config, days).await,
        Commands::Db { command } => db::run_db_command(&config, command).await,
    }
}
