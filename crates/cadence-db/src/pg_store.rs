use async_trait::async_trait;
use cadence_core::store::new_plan_id;
use cadence_core::{
    brands::slugify, CleanupStats, MonthlyPlan, OrchestratorState, PerformanceMetrics, Platform,
    PostRecord, RunRecord, StorageError, Store, StoredPlan,
};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{metrics, plans, posts, runs};

/// [`Store`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn save_plan(&self, plan: &MonthlyPlan) -> Result<String, StorageError> {
        let plan_id = new_plan_id(plan);
        plans::insert_active_plan(&self.pool, &plan_id, plan).await?;
        tracing::info!(brand = %plan.brand_name, plan_id = %plan_id, "saved monthly plan");
        Ok(plan_id)
    }

    async fn get_active_plan(&self, brand: &str) -> Result<Option<StoredPlan>, StorageError> {
        let row = plans::get_active_plan(&self.pool, &slugify(brand)).await?;
        Ok(row.map(StoredPlan::from))
    }

    async fn has_been_posted(
        &self,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<bool, StorageError> {
        Ok(posts::has_successful_post(&self.pool, date, platform).await?)
    }

    async fn is_duplicate_content(
        &self,
        hash: &str,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<bool, StorageError> {
        Ok(posts::hash_exists_elsewhere(&self.pool, hash, date, platform).await?)
    }

    async fn record_post(&self, record: &PostRecord) -> Result<(), StorageError> {
        let inserted = posts::insert_post_record(&self.pool, record).await?;
        if !inserted {
            tracing::debug!(record_id = %record.id, "post record already stored");
        }
        Ok(())
    }

    async fn get_posted_content(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        platform: Option<Platform>,
    ) -> Result<Vec<PostRecord>, StorageError> {
        Ok(posts::list_post_records(&self.pool, start, end, platform).await?)
    }

    async fn save_metrics(&self, sample: &PerformanceMetrics) -> Result<(), StorageError> {
        metrics::insert_metrics(&self.pool, sample).await?;
        Ok(())
    }

    async fn get_metrics(&self, post_id: &str) -> Result<Vec<PerformanceMetrics>, StorageError> {
        Ok(metrics::list_metrics_for_post(&self.pool, post_id).await?)
    }

    async fn save_orchestrator_state(&self, state: &OrchestratorState) -> Result<(), StorageError> {
        Ok(runs::upsert_state(&self.pool, state).await?)
    }

    async fn get_orchestrator_state(
        &self,
        date: NaiveDate,
    ) -> Result<Option<OrchestratorState>, StorageError> {
        Ok(runs::get_state(&self.pool, date).await?)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StorageError> {
        Ok(runs::upsert_run(&self.pool, run).await?)
    }

    async fn get_run(&self, date: NaiveDate) -> Result<Option<RunRecord>, StorageError> {
        Ok(runs::get_run(&self.pool, date).await?)
    }

    async fn cleanup_before(&self, cutoff: NaiveDate) -> Result<CleanupStats, StorageError> {
        let posts_deleted = posts::delete_post_records_before(&self.pool, cutoff).await?;
        let metrics_deleted = metrics::delete_metrics_before(&self.pool, cutoff).await?;
        let states_deleted = runs::delete_states_before(&self.pool, cutoff).await?;
        tracing::info!(
            %cutoff,
            posts_deleted,
            metrics_deleted,
            states_deleted,
            "postgres retention cleanup finished"
        );
        Ok(CleanupStats {
            posts_deleted,
            metrics_deleted,
            files_deleted: 0,
        })
    }
}
