//! `run`, `retry` and `status` command handlers.

use chrono::NaiveDate;

use cadence_core::{AppConfig, Platform};
use cadence_orchestrator::{DailyRunRequest, ExecutionStatus, RunSummary};

use crate::context::{build_orchestrator, open_store, resolve_brand_name};

#[derive(Debug)]
pub(crate) struct RunOptions {
    pub brand: Option<String>,
    pub date: Option<NaiveDate>,
    pub force: bool,
    pub dry_run: bool,
    pub platforms: Vec<Platform>,
}

impl RunOptions {
    fn into_request(self, brand: &str) -> DailyRunRequest {
        let mut request = DailyRunRequest::new(brand)
            .force(self.force)
            .dry_run(self.dry_run);
        if let Some(date) = self.date {
            request = request.on(date);
        }
        if !self.platforms.is_empty() {
            request = request.platforms(self.platforms);
        }
        request
    }
}

/// Execute one brand's posts for a day and print the outcome.
///
/// # Errors
///
/// Returns an error if the run cannot start (no plan, no posts, storage
/// failure) or if any post failed.
pub(crate) async fn run_daily(config: &AppConfig, options: RunOptions) -> anyhow::Result<()> {
    let brand = resolve_brand_name(config, options.brand.as_deref())?;
    let store = open_store(config).await?;
    let orchestrator = build_orchestrator(config, store)?;

    let summary = orchestrator
        .execute_daily(&options.into_request(&brand))
        .await?;
    print_summary(&summary);
    fail_on_errors(&summary)
}

/// Re-dispatch one post outside the run-level gate.
///
/// # Errors
///
/// Returns an error if no such post is scheduled, storage fails, or the post
/// fails again.
pub(crate) async fn run_retry(
    config: &AppConfig,
    brand: Option<&str>,
    date: NaiveDate,
    platform: Platform,
) -> anyhow::Result<()> {
    let brand = resolve_brand_name(config, brand)?;
    let store = open_store(config).await?;
    let orchestrator = build_orchestrator(config, store)?;

    let summary = orchestrator.retry_post(&brand, date, platform).await?;
    if summary.stats.skipped > 0 {
        println!("{platform} was already posted for {date}; nothing to retry");
        return Ok(());
    }
    print_summary(&summary);
    fail_on_errors(&summary)
}

pub(crate) async fn run_status(
    config: &AppConfig,
    brand: Option<&str>,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let brand = resolve_brand_name(config, brand)?;
    let store = open_store(config).await?;
    let orchestrator = build_orchestrator(config, store)?;

    let status = orchestrator.get_execution_status(&brand, date).await?;
    print_status(&brand, &status);
    Ok(())
}

fn fail_on_errors(summary: &RunSummary) -> anyhow::Result<()> {
    if summary.stats.failed > 0 {
        anyhow::bail!(
            "{} of {} posts failed; see `status` and `retry`",
            summary.stats.failed,
            summary.stats.attempted
        );
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let mode = if summary.dry_run { " (dry run)" } else { "" };
    if let Some(message) = &summary.message {
        println!("{} {}{mode}: {message}", summary.brand, summary.date);
        return;
    }

    let stats = summary.stats;
    println!(
        "{} {}{mode}: attempted {}, succeeded {}, failed {}, skipped {}",
        summary.brand, summary.date, stats.attempted, stats.succeeded, stats.failed, stats.skipped
    );
    for result in &summary.results {
        if result.success {
            println!(
                "  ok    {:<10}{}",
                result.platform.as_str(),
                result
                    .post_url
                    .as_deref()
                    .or(result.post_id.as_deref())
                    .unwrap_or_default()
            );
        } else {
            println!(
                "  fail  {:<10}{} (retries: {})",
                result.platform.as_str(),
                result.error_message(),
                result.retry_count
            );
        }
    }
    for platform in &summary.duplicate_content {
        println!("  warn  {:<10}published text was seen before", platform.as_str());
    }
}

fn print_status(brand: &str, status: &ExecutionStatus) {
    println!("Brand: {brand}");
    println!("Date: {}", status.date);
    if !status.has_run {
        println!("Status: not run");
        return;
    }
    println!(
        "Status: {}",
        if status.is_running { "running" } else { "completed" }
    );
    println!("Posts completed: {}", status.posts_completed);
    println!("Posts failed: {}", status.posts_failed);
    if let Some(last) = status.last_execution {
        println!("Last execution: {}", last.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if !status.metrics.is_empty() {
        println!();
        println!(
            "{:<10}{:>12}{:>12}{:>8}",
            "PLATFORM", "IMPRESSIONS", "ENGAGEMENTS", "RATE"
        );
        for (platform, m) in &status.metrics {
            println!(
                "{:<10}{:>12}{:>12}{:>7.2}%",
                platform.as_str(),
                m.impressions,
                m.engagements,
                m.engagement_rate
            );
        }
    }
}
