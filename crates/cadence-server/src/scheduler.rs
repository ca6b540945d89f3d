//! Background job scheduler.
//!
//! Registers the daily posting run for each brand flagged `schedule: true`
//! and the weekly retention cleanup.

use std::sync::Arc;

use cadence_core::{BrandsFile, Store};
use cadence_orchestrator::{DailyRunRequest, Orchestrator};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// What the scheduled jobs run against.
#[derive(Clone)]
pub struct SchedulerContext {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn Store>,
    pub brands: Arc<BrandsFile>,
    pub daily_cron: String,
    pub cleanup_cron: String,
    pub retention_days: u32,
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(ctx: SchedulerContext) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let scheduled: Vec<String> = ctx
        .brands
        .brands
        .iter()
        .filter(|b| b.schedule)
        .map(|b| b.name.clone())
        .collect();
    if scheduled.is_empty() {
        tracing::info!("scheduler: no brand has schedule: true; daily run not registered");
    }
    for brand in scheduled {
        register_daily_job(&scheduler, &ctx, brand).await?;
    }
    register_cleanup_job(&scheduler, &ctx).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_daily_job(
    scheduler: &JobScheduler,
    ctx: &SchedulerContext,
    brand: String,
) -> Result<(), JobSchedulerError> {
    let orchestrator = Arc::clone(&ctx.orchestrator);
    let brand = Arc::new(brand);
    tracing::info!(brand = %brand, cron = %ctx.daily_cron, "scheduler: registering daily run");

    let job = Job::new_async(ctx.daily_cron.as_str(), move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);
        let brand = Arc::clone(&brand);

        Box::pin(async move {
            run_daily_job(&orchestrator, &brand).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn register_cleanup_job(
    scheduler: &JobScheduler,
    ctx: &SchedulerContext,
) -> Result<(), JobSchedulerError> {
    let store = Arc::clone(&ctx.store);
    let days = ctx.retention_days;

    let job = Job::new_async(ctx.cleanup_cron.as_str(), move |_uuid, _lock| {
        let store = Arc::clone(&store);

        Box::pin(async move {
            run_cleanup_job(store.as_ref(), days).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// One scheduled daily run. Failures are logged; the next tick tries again.
pub(crate) async fn run_daily_job(orchestrator: &Orchestrator, brand: &str) {
    tracing::info!(brand, "scheduler: starting daily run");
    match orchestrator
        .execute_daily(&DailyRunRequest::new(brand))
        .await
    {
        Ok(summary) if summary.message.is_some() => {
            tracing::info!(brand, date = %summary.date, "scheduler: day already executed");
        }
        Ok(summary) => {
            tracing::info!(
                brand,
                date = %summary.date,
                succeeded = summary.stats.succeeded,
                failed = summary.stats.failed,
                skipped = summary.stats.skipped,
                "scheduler: daily run complete"
            );
        }
        Err(e) => {
            tracing::error!(brand, error = %e, "scheduler: daily run failed");
        }
    }
}

pub(crate) async fn run_cleanup_job(store: &dyn Store, days: u32) {
    match store.cleanup(days).await {
        Ok(stats) => tracing::info!(
            days,
            posts_deleted = stats.posts_deleted,
            metrics_deleted = stats.metrics_deleted,
            files_deleted = stats.files_deleted,
            "scheduler: retention cleanup complete"
        ),
        Err(e) => tracing::error!(days, error = %e, "scheduler: retention cleanup failed"),
    }
}
