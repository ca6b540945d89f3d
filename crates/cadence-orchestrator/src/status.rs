use std::collections::BTreeMap;

use cadence_core::{brands::slugify, PerformanceMetrics, Platform};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::engine::Orchestrator;
use crate::OrchestratorError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStatus {
    pub date: NaiveDate,
    pub has_run: bool,
    pub is_running: bool,
    pub posts_completed: usize,
    pub posts_failed: usize,
    /// Latest metrics sample for each platform posted that day.
    pub metrics: BTreeMap<Platform, PerformanceMetrics>,
    pub last_execution: Option<DateTime<Utc>>,
}

impl Orchestrator {
    /// Summarise the stored state of one day's run for `brand`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Storage`] on read failure.
    pub async fn get_execution_status(
        &self,
        brand: &str,
        date: Option<NaiveDate>,
    ) -> Result<ExecutionStatus, OrchestratorError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let slug = slugify(brand);
        let store = self.store();

        let state = store
            .get_orchestrator_state(date)
            .await?
            .filter(|s| slugify(&s.brand_name) == slug);

        let mut metrics = BTreeMap::new();
        for post in store.get_posted_content(date, date, None).await? {
            if slugify(&post.brand_name) != slug || metrics.contains_key(&post.platform) {
                continue;
            }
            if let Some(latest) = store.get_metrics(&post.post_id).await?.into_iter().next() {
                metrics.insert(post.platform, latest);
            }
        }

        Ok(ExecutionStatus {
            date,
            has_run: state.is_some(),
            is_running: state.as_ref().is_some_and(|s| s.is_running),
            posts_completed: state.as_ref().map_or(0, |s| s.posts_completed_today.len()),
            posts_failed: state.as_ref().map_or(0, |s| s.failed_posts.len()),
            metrics,
            last_execution: state.map(|s| s.last_execution),
        })
    }
}
