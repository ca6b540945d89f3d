//! JSON-file [`Store`] for single-host deployments.
//!
//! Layout under the root directory:
//!
//! ```text
//! plans/{plan_id}.json                      StoredPlan
//! active/{brand_slug}.json                  pointer to the active plan
//! posts/{date}_{platform}_{record_id}.json  PostRecord
//! metrics/{date}_{post_id}_{time}_{n}.json  PerformanceMetrics
//! runs/{date}.json                          RunRecord
//! state/{date}.json                         OrchestratorState
//! ```
//!
//! Every write goes to a temporary sibling first and is renamed into place.
//! Writers are serialised by one in-process lock; readers take no lock.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cadence_core::store::new_plan_id;
use cadence_core::{
    brands::slugify, CleanupStats, MonthlyPlan, OrchestratorState, PerformanceMetrics, Platform,
    PostRecord, RunRecord, StorageError, Store, StoredPlan,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

const PLANS_DIR: &str = "plans";
const ACTIVE_DIR: &str = "active";
const POSTS_DIR: &str = "posts";
const METRICS_DIR: &str = "metrics";
const RUNS_DIR: &str = "runs";
const STATE_DIR: &str = "state";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize)]
struct ActivePointer {
    plan_id: String,
    brand_name: String,
    activated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn plan_path(&self, plan_id: &str) -> PathBuf {
        self.dir(PLANS_DIR)
            .join(format!("{}.json", sanitize(plan_id)))
    }

    fn active_path(&self, slug: &str) -> PathBuf {
        self.dir(ACTIVE_DIR).join(format!("{slug}.json"))
    }

    fn post_path(&self, record: &PostRecord) -> PathBuf {
        self.dir(POSTS_DIR).join(format!(
            "{}_{}_{}.json",
            record.date.format(DATE_FORMAT),
            record.platform,
            sanitize(&record.id)
        ))
    }

    fn dated_path(&self, dir: &str, date: NaiveDate) -> PathBuf {
        self.dir(dir)
            .join(format!("{}.json", date.format(DATE_FORMAT)))
    }

    async fn read_posts(&self) -> Result<Vec<(PathBuf, PostRecord)>, StorageError> {
        let mut out = Vec::new();
        for path in list_json(&self.dir(POSTS_DIR)).await? {
            if let Some(record) = read_json::<PostRecord>(&path).await? {
                out.push((path, record));
            }
        }
        Ok(out)
    }
}

/// Replace anything outside `[A-Za-z0-9-]` so ids are safe as file-name parts.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Date encoded as the leading `_`-separated token of a file stem.
fn file_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let prefix = stem.split('_').next()?;
    NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok()
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension(format!("json.tmp-{}", Uuid::new_v4().simple()));

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: path.display().to_string(),
                reason: e.to_string(),
            }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Sorted `*.json` files directly under `dir`; a missing directory is empty.
async fn list_json(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json")
            && entry.file_type().await?.is_file()
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Delete every file in `dir` whose leading date is before `cutoff`.
/// Files without a parseable date are left alone.
async fn prune_dated_files(dir: &Path, cutoff: NaiveDate) -> Result<u64, StorageError> {
    let mut removed = 0;
    for path in list_json(dir).await? {
        let Some(date) = file_date(&path) else {
            tracing::debug!(path = %path.display(), "skipping file without date prefix");
            continue;
        };
        if date >= cutoff {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to delete expired file");
            }
        }
    }
    Ok(removed)
}

#[async_trait]
impl Store for FileStore {
    async fn save_plan(&self, plan: &MonthlyPlan) -> Result<String, StorageError> {
        let _guard = self.write_lock.lock().await;

        let slug = plan.brand_slug();
        let plan_id = new_plan_id(plan);
        let stored = StoredPlan {
            id: plan_id.clone(),
            is_active: true,
            saved_at: Utc::now(),
            plan: plan.clone(),
        };
        write_json(&self.plan_path(&plan_id), &stored).await?;

        let active_path = self.active_path(&slug);
        let previous = read_json::<ActivePointer>(&active_path).await?;

        // The pointer rename is the activation point.
        let pointer = ActivePointer {
            plan_id: plan_id.clone(),
            brand_name: plan.brand_name.clone(),
            activated_at: stored.saved_at,
        };
        write_json(&active_path, &pointer).await?;

        if let Some(previous) = previous.filter(|p| p.plan_id != plan_id) {
            let old_path = self.plan_path(&previous.plan_id);
            if let Some(mut old) = read_json::<StoredPlan>(&old_path).await? {
                old.is_active = false;
                write_json(&old_path, &old).await?;
            }
        }

        tracing::info!(brand = %plan.brand_name, plan_id = %plan_id, "saved monthly plan");
        Ok(plan_id)
    }

    async fn get_active_plan(&self, brand: &str) -> Result<Option<StoredPlan>, StorageError> {
        let Some(pointer) = read_json::<ActivePointer>(&self.active_path(&slugify(brand))).await?
        else {
            return Ok(None);
        };

        let plan = read_json::<StoredPlan>(&self.plan_path(&pointer.plan_id))
            .await?
            .ok_or_else(|| StorageError::Corrupt {
                key: pointer.plan_id.clone(),
                reason: "active pointer references a missing plan".to_string(),
            })?;
        Ok(Some(plan))
    }

    async fn has_been_posted(
        &self,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<bool, StorageError> {
        let prefix = format!("{}_{}_", date.format(DATE_FORMAT), platform);
        for path in list_json(&self.dir(POSTS_DIR)).await? {
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix));
            if !matches {
                continue;
            }
            if let Some(record) = read_json::<PostRecord>(&path).await? {
                if record.posting_result.success {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn is_duplicate_content(
        &self,
        hash: &str,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<bool, StorageError> {
        Ok(self.read_posts().await?.iter().any(|(_, r)| {
            r.content_hash == hash && !(r.date == date && r.platform == platform)
        }))
    }

    async fn record_post(&self, record: &PostRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let path = self.post_path(record);
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(record_id = %record.id, "post record already stored");
            return Ok(());
        }
        write_json(&path, record).await
    }

    async fn get_posted_content(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        platform: Option<Platform>,
    ) -> Result<Vec<PostRecord>, StorageError> {
        let mut records = Vec::new();
        for path in list_json(&self.dir(POSTS_DIR)).await? {
            let Some(date) = file_date(&path) else {
                continue;
            };
            if date < start || date > end {
                continue;
            }
            if let Some(record) = read_json::<PostRecord>(&path).await? {
                if platform.is_none_or(|p| p == record.platform) {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.recorded_at.cmp(&a.recorded_at))
        });
        Ok(records)
    }

    async fn save_metrics(&self, metrics: &PerformanceMetrics) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let name = format!(
            "{}_{}_{}_{}.json",
            metrics.measured_at.format(DATE_FORMAT),
            sanitize(&metrics.post_id),
            metrics.measured_at.format("%H%M%S%9f"),
            Uuid::new_v4().simple()
        );
        write_json(&self.dir(METRICS_DIR).join(name), metrics).await
    }

    async fn get_metrics(&self, post_id: &str) -> Result<Vec<PerformanceMetrics>, StorageError> {
        let needle = format!("_{}_", sanitize(post_id));
        let mut samples = Vec::new();
        for path in list_json(&self.dir(METRICS_DIR)).await? {
            let candidate = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(&needle));
            if !candidate {
                continue;
            }
            if let Some(sample) = read_json::<PerformanceMetrics>(&path).await? {
                if sample.post_id == post_id {
                    samples.push(sample);
                }
            }
        }
        samples.sort_by(|a, b| b.measured_at.cmp(&a.measured_at));
        Ok(samples)
    }

    async fn save_orchestrator_state(&self, state: &OrchestratorState) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.dated_path(STATE_DIR, state.current_date), state).await
    }

    async fn get_orchestrator_state(
        &self,
        date: NaiveDate,
    ) -> Result<Option<OrchestratorState>, StorageError> {
        read_json(&self.dated_path(STATE_DIR, date)).await
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.dated_path(RUNS_DIR, run.run_date), run).await
    }

    async fn get_run(&self, date: NaiveDate) -> Result<Option<RunRecord>, StorageError> {
        read_json(&self.dated_path(RUNS_DIR, date)).await
    }

    async fn cleanup_before(&self, cutoff: NaiveDate) -> Result<CleanupStats, StorageError> {
        let _guard = self.write_lock.lock().await;

        let posts_deleted = prune_dated_files(&self.dir(POSTS_DIR), cutoff).await?;
        let metrics_deleted = prune_dated_files(&self.dir(METRICS_DIR), cutoff).await?;
        let states_deleted = prune_dated_files(&self.dir(STATE_DIR), cutoff).await?;

        let stats = CleanupStats {
            posts_deleted,
            metrics_deleted,
            files_deleted: posts_deleted + metrics_deleted + states_deleted,
        };
        tracing::info!(
            %cutoff,
            posts_deleted = stats.posts_deleted,
            metrics_deleted = stats.metrics_deleted,
            files_deleted = stats.files_deleted,
            "file retention cleanup finished"
        );
        Ok(stats)
    }
}
