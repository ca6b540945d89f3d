use cadence_core::{Platform, StorageError};
use chrono::NaiveDate;
use thiserror::Error;

/// Fatal conditions that abort a run before or during dispatch.
///
/// Per-post dispatch failures are not errors at this level; they are counted
/// in the run summary.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no active monthly plan for brand {brand}")]
    NoActivePlan { brand: String },

    #[error("no posts scheduled for {date}")]
    NoPostsScheduled { date: NaiveDate },

    #[error("no {platform} post scheduled for {date}")]
    NoPostForPlatform { date: NaiveDate, platform: Platform },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
