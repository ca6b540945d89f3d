use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::posting::{ContentPackage, PostRecord};

/// Lifecycle of one daily execution.
///
/// `NotStarted -> Running -> Completed`, or `NotStarted -> Skipped` when the
/// run-level gate rejects the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    Running,
    Completed,
    Skipped,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::NotStarted => write!(f, "not_started"),
            RunPhase::Running => write!(f, "running"),
            RunPhase::Completed => write!(f, "completed"),
            RunPhase::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    /// Retry budget spent. Replay with `retry` once the cause is fixed.
    ManualReview,
    /// No channel serves the platform; retrying cannot help.
    NotRetryable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPost {
    pub platform: Platform,
    pub error: String,
    pub timestamp: DateTime<Utc>,
    pub attempts: u32,
    #[serde(default)]
    pub fallback_actions: Vec<String>,
    pub status: FailureStatus,
}

/// Snapshot of one day's execution; one per date, overwritten by forced re-runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub current_date: NaiveDate,
    pub brand_name: String,
    pub monthly_plan_id: String,
    pub phase: RunPhase,
    pub posts_scheduled_today: Vec<ContentPackage>,
    pub posts_completed_today: Vec<PostRecord>,
    pub failed_posts: Vec<FailedPost>,
    pub last_execution: DateTime<Utc>,
    pub is_running: bool,
}

impl OrchestratorState {
    #[must_use]
    pub fn new(current_date: NaiveDate, brand_name: &str, monthly_plan_id: &str) -> Self {
        Self {
            current_date,
            brand_name: brand_name.to_string(),
            monthly_plan_id: monthly_plan_id.to_string(),
            phase: RunPhase::NotStarted,
            posts_scheduled_today: Vec::new(),
            posts_completed_today: Vec::new(),
            failed_posts: Vec::new(),
            last_execution: Utc::now(),
            is_running: false,
        }
    }
}

/// Aggregate counters for one calendar day, keyed uniquely by `run_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_date: NaiveDate,
    pub brand_name: String,
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStats {
    pub posts_deleted: u64,
    pub metrics_deleted: u64,
    pub files_deleted: u64,
}

impl std::ops::AddAssign for CleanupStats {
    fn add_assign(&mut self, rhs: Self) {
        self.posts_deleted += rhs.posts_deleted;
        self.metrics_deleted += rhs.metrics_deleted;
        self.files_deleted += rhs.files_deleted;
    }
}
