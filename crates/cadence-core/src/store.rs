use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::plan::{MonthlyPlan, StoredPlan};
use crate::platform::Platform;
use crate::posting::{PerformanceMetrics, PerformanceSummary, PostRecord};
use crate::run::{CleanupStats, OrchestratorState, RunRecord};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("corrupt entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Generate a fresh identifier for a plan about to be saved.
#[must_use]
pub fn new_plan_id(plan: &MonthlyPlan) -> String {
    format!(
        "plan_{}_{}_{}",
        plan.brand_slug(),
        plan.calendar.start_date.format("%Y%m%d"),
        Uuid::new_v4().simple()
    )
}

/// Durable state behind the daily execution engine.
///
/// Implementations must make every individual write atomic: a reader sees
/// either the previous value or the new one, never a partial record.
///
/// Plans are keyed by brand, but the gates are not: posts are keyed by date
/// and platform ([`Store::has_been_posted`]) and runs by date alone
/// ([`Store::has_run_today`]). A store serves one scheduled brand; running a
/// second brand against it on the same day is rejected as already executed.
#[async_trait]
pub trait Store: Send + Sync {
    // -- plans ---------------------------------------------------------------

    /// Persist `plan` and make it the only active plan for its brand.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the plan cannot be written.
    async fn save_plan(&self, plan: &MonthlyPlan) -> Result<String, StorageError>;

    /// The most recently saved active plan for `brand` (matched by slug).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn get_active_plan(&self, brand: &str) -> Result<Option<StoredPlan>, StorageError>;

    // -- posts ---------------------------------------------------------------

    /// True iff a successful [`PostRecord`] exists for exactly `(date, platform)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn has_been_posted(
        &self,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<bool, StorageError>;

    fn content_hash(&self, text: &str) -> String {
        crate::hashing::content_hash(text)
    }

    /// True iff a record with `hash` exists under a different `(date, platform)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn is_duplicate_content(
        &self,
        hash: &str,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<bool, StorageError>;

    /// Append `record`. Writing the same record id twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the record cannot be written.
    async fn record_post(&self, record: &PostRecord) -> Result<(), StorageError>;

    /// Records dated within `[start, end]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn get_posted_content(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        platform: Option<Platform>,
    ) -> Result<Vec<PostRecord>, StorageError>;

    // -- metrics -------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`StorageError`] if the sample cannot be written.
    async fn save_metrics(&self, metrics: &PerformanceMetrics) -> Result<(), StorageError>;

    /// All samples for `post_id`, newest `measured_at` first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn get_metrics(&self, post_id: &str) -> Result<Vec<PerformanceMetrics>, StorageError>;

    /// Summarise the day before `today` for `brand`, using the latest sample
    /// of each post.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn get_yesterday_performance(
        &self,
        brand: &str,
        today: NaiveDate,
    ) -> Result<PerformanceSummary, StorageError> {
        let Some(yesterday) = today.pred_opt() else {
            return Ok(PerformanceSummary::empty(today));
        };
        let slug = crate::brands::slugify(brand);

        let posts = self.get_posted_content(yesterday, yesterday, None).await?;
        let mut entries = Vec::with_capacity(posts.len());
        for post in posts
            .into_iter()
            .filter(|p| crate::brands::slugify(&p.brand_name) == slug)
        {
            let latest = self.get_metrics(&post.post_id).await?.into_iter().next();
            entries.push((post.platform, latest));
        }

        Ok(crate::performance::summarize_performance(yesterday, entries))
    }

    // -- orchestrator state and runs -----------------------------------------

    /// Store the snapshot for `state.current_date`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the snapshot cannot be written.
    async fn save_orchestrator_state(&self, state: &OrchestratorState) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn get_orchestrator_state(
        &self,
        date: NaiveDate,
    ) -> Result<Option<OrchestratorState>, StorageError>;

    /// Upsert the run record for `run.run_date`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the record cannot be written.
    async fn record_run(&self, run: &RunRecord) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn get_run(&self, date: NaiveDate) -> Result<Option<RunRecord>, StorageError>;

    /// True iff a run record exists for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on read failure.
    async fn has_run_today(&self, date: NaiveDate) -> Result<bool, StorageError> {
        Ok(self.get_run(date).await?.is_some())
    }

    // -- retention -----------------------------------------------------------

    /// Delete post records and metrics dated strictly before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend rejects the delete.
    async fn cleanup_before(&self, cutoff: NaiveDate) -> Result<CleanupStats, StorageError>;

    /// Keep the last `days_to_keep` days of posts and metrics.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend rejects the delete.
    async fn cleanup(&self, days_to_keep: u32) -> Result<CleanupStats, StorageError> {
        let today = Utc::now().date_naive();
        let cutoff = today
            .checked_sub_days(Days::new(u64::from(days_to_keep)))
            .unwrap_or(NaiveDate::MIN);
        self.cleanup_before(cutoff).await
    }
}
