//! `metrics` and `perf` command handlers.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;

use cadence_core::{performance::engagement_rate, AppConfig, PerformanceMetrics, Platform};

use crate::context::{open_store, resolve_brand_name};

#[derive(Debug, Subcommand)]
pub enum MetricsCommands {
    /// Store one metrics sample for a published post
    Record {
        /// Platform post id as returned at publish time
        #[arg(long)]
        post_id: String,
        #[arg(long)]
        platform: Platform,
        #[arg(long, default_value = "0")]
        impressions: i64,
        #[arg(long, default_value = "0")]
        engagements: i64,
        #[arg(long, default_value = "0")]
        clicks: i64,
        #[arg(long, default_value = "0")]
        shares: i64,
        #[arg(long, default_value = "0")]
        comments: i64,
        #[arg(long, default_value = "0")]
        likes: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum PerfCommands {
    /// Summarise the day before `--date` (defaults to yesterday)
    Yesterday {
        #[arg(long)]
        brand: Option<String>,
        /// Reference date; the summary covers the day before it
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub(crate) async fn run_metrics_command(
    config: &AppConfig,
    command: MetricsCommands,
) -> anyhow::Result<()> {
    match command {
        MetricsCommands::Record {
            post_id,
            platform,
            impressions,
            engagements,
            clicks,
            shares,
            comments,
            likes,
        } => {
            if [impressions, engagements, clicks, shares, comments, likes]
                .iter()
                .any(|v| *v < 0)
            {
                anyhow::bail!("metric counts must be non-negative");
            }
            let metrics = PerformanceMetrics {
                post_id,
                platform,
                impressions,
                engagements,
                clicks,
                shares,
                comments,
                likes,
                engagement_rate: engagement_rate(engagements, impressions),
                measured_at: Utc::now(),
            };

            let store = open_store(config).await?;
            store.save_metrics(&metrics).await?;
            tracing::info!(post_id = %metrics.post_id, platform = %platform, "metrics recorded");
            println!(
                "recorded metrics for {} ({platform}): {:.2}% engagement",
                metrics.post_id, metrics.engagement_rate
            );
            Ok(())
        }
    }
}

pub(crate) async fn run_perf_command(
    config: &AppConfig,
    command: PerfCommands,
) -> anyhow::Result<()> {
    match command {
        PerfCommands::Yesterday { brand, date } => {
            let brand = resolve_brand_name(config, brand.as_deref())?;
            let today = date.unwrap_or_else(|| Utc::now().date_naive());
            let store = open_store(config).await?;
            let summary = store.get_yesterday_performance(&brand, today).await?;

            println!("Brand: {brand}");
            println!("Date: {}", summary.date);
            println!(
                "Posts: {}  Impressions: {}  Engagements: {}  Rate: {:.2}%",
                summary.total_posts,
                summary.total_impressions,
                summary.total_engagements,
                summary.average_engagement_rate
            );
            for (platform, stats) in &summary.platform_breakdown {
                println!(
                    "  {:<10}posts {:<4}impressions {:<8}engagements {:<6}rate {:.2}%",
                    platform.as_str(),
                    stats.posts,
                    stats.impressions,
                    stats.engagements,
                    stats.engagement_rate
                );
            }
            Ok(())
        }
    }
}
