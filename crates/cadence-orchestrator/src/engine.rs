//! Daily execution engine.
//!
//! One call to [`Orchestrator::execute_daily`] takes a brand's posts for a date
//! through two idempotency gates (run-level per date, post-level per
//! `(date, platform)`), adapts them with a single signals snapshot, dispatches
//! them with bounded retries, and records the outcome.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use cadence_channels::{DispatchOutcome, DispatchTable};
use cadence_core::{
    brands::slugify, ContentPackage, DailyPost, FailedPost, FailureStatus, GeneratedPost,
    OrchestratorState, Platform, PostRecord, PostingResult, RunPhase, RunRecord, SignalFeed,
    Signals, Store,
};
use chrono::{NaiveDate, Utc};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

use crate::fallback::{apply_fallback, MANUAL_REVIEW};
use crate::package::{build_package, AdaptationRules};
use crate::retry::backoff_delay;
use crate::settings::EngineSettings;
use crate::signals::SignalAggregator;
use crate::OrchestratorError;

/// Message on a summary rejected by the run-level gate.
pub const ALREADY_EXECUTED: &str = "already executed";

// ---------------------------------------------------------------------------
// Request / summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyRunRequest {
    pub brand: String,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    /// Bypass the run-level gate. Platforms already posted for the date are
    /// still skipped.
    pub force: bool,
    /// Run every step except generation, publishing and persistence.
    pub dry_run: bool,
    /// Restrict the run to these platforms.
    pub platforms: Option<Vec<Platform>>,
}

impl DailyRunRequest {
    #[must_use]
    pub fn new(brand: &str) -> Self {
        Self {
            brand: brand.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = Some(platforms);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// `true` iff no post failed.
    pub success: bool,
    pub brand: String,
    pub date: NaiveDate,
    pub phase: RunPhase,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub stats: RunStats,
    /// `"{platform}: {error}"` for each failed post.
    pub errors: Vec<String>,
    /// Platforms whose published text was already seen on another day or platform.
    pub duplicate_content: Vec<Platform>,
    pub results: Vec<PostingResult>,
    /// Persisted state snapshot; absent for dry runs and skipped runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<OrchestratorState>,
}

impl RunSummary {
    fn skipped(brand: &str, date: NaiveDate, dry_run: bool) -> Self {
        Self {
            success: false,
            brand: brand.to_string(),
            date,
            phase: RunPhase::Skipped,
            dry_run,
            message: Some(ALREADY_EXECUTED.to_string()),
            stats: RunStats::default(),
            errors: Vec::new(),
            duplicate_content: Vec::new(),
            results: Vec::new(),
            state: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-post outcomes
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum PostOutcome {
    /// Already posted for `(date, platform)`.
    Skipped { platform: Platform },
    Succeeded {
        package: Box<ContentPackage>,
        result: PostingResult,
        record: Option<Box<PostRecord>>,
        duplicate: bool,
    },
    Failed {
        package: Box<ContentPackage>,
        result: PostingResult,
        failure: FailedPost,
    },
}

struct Attempt {
    package: ContentPackage,
    outcome: DispatchOutcome,
    fallback_actions: Vec<String>,
}

struct RunContext<'a> {
    brand: &'a str,
    date: NaiveDate,
    dry_run: bool,
    signals: &'a Signals,
}

/// Counters and state accumulated from per-post outcomes, in calendar order.
struct Tally {
    stats: RunStats,
    errors: Vec<String>,
    duplicates: Vec<Platform>,
    results: Vec<PostingResult>,
}

impl Tally {
    fn new() -> Self {
        Self {
            stats: RunStats::default(),
            errors: Vec::new(),
            duplicates: Vec::new(),
            results: Vec::new(),
        }
    }

    fn absorb(&mut self, outcome: PostOutcome, state: &mut OrchestratorState) {
        self.stats.attempted += 1;
        match outcome {
            PostOutcome::Skipped { .. } => self.stats.skipped += 1,
            PostOutcome::Succeeded {
                package,
                result,
                record,
                duplicate,
            } => {
                self.stats.succeeded += 1;
                if duplicate {
                    self.duplicates.push(package.platform);
                }
                state.posts_scheduled_today.push(*package);
                if let Some(record) = record {
                    state.posts_completed_today.push(*record);
                }
                self.results.push(result);
            }
            PostOutcome::Failed {
                package,
                result,
                failure,
            } => {
                self.stats.failed += 1;
                self.errors
                    .push(format!("{}: {}", failure.platform, failure.error));
                state.posts_scheduled_today.push(*package);
                state.failed_posts.push(failure);
                self.results.push(result);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    store: Arc<dyn Store>,
    channels: DispatchTable,
    signals: SignalAggregator,
    rules: AdaptationRules,
    settings: EngineSettings,
    /// `(brand slug, date)` pairs completed as dry runs in this process.
    dry_runs: Mutex<HashSet<(String, NaiveDate)>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        channels: DispatchTable,
        feed: SignalFeed,
        settings: EngineSettings,
    ) -> Self {
        let rules = AdaptationRules {
            engagement_threshold: settings.engagement_threshold,
            competitor_keywords: feed.competitor_keywords.clone(),
        };
        Self {
            store,
            channels,
            signals: SignalAggregator::new(feed),
            rules,
            settings,
            dry_runs: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn dry_run_seen(&self, slug: &str, date: NaiveDate) -> bool {
        self.dry_runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(slug.to_string(), date))
    }

    fn remember_dry_run(&self, slug: String, date: NaiveDate) {
        self.dry_runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((slug, date));
    }

    /// Load the brand's active plan and its posts for `date`.
    async fn due_posts(
        &self,
        brand: &str,
        date: NaiveDate,
    ) -> Result<(String, Vec<DailyPost>), OrchestratorError> {
        let stored = self
            .store
            .get_active_plan(brand)
            .await?
            .ok_or_else(|| OrchestratorError::NoActivePlan {
                brand: brand.to_string(),
            })?;

        let posts: Vec<DailyPost> = stored.plan.posts_for(date).into_iter().cloned().collect();
        if posts.is_empty() {
            return Err(OrchestratorError::NoPostsScheduled { date });
        }
        Ok((stored.id, posts))
    }

    /// Run one brand's posts for one day.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NoActivePlan`] or
    /// [`OrchestratorError::NoPostsScheduled`] (also when the platform filter
    /// leaves nothing due) before any dispatch, and
    /// [`OrchestratorError::Storage`] if the store fails at any point.
    /// Per-post dispatch failures are reported in the summary instead.
    pub async fn execute_daily(
        &self,
        request: &DailyRunRequest,
    ) -> Result<RunSummary, OrchestratorError> {
        let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
        let brand = request.brand.as_str();
        let slug = slugify(brand);

        tracing::info!(
            brand,
            %date,
            force = request.force,
            dry_run = request.dry_run,
            "starting daily execution"
        );

        if !request.force {
            let already = self.store.has_run_today(date).await?
                || (request.dry_run && self.dry_run_seen(&slug, date));
            if already {
                tracing::warn!(brand, %date, "already executed; pass force to override");
                return Ok(RunSummary::skipped(brand, date, request.dry_run));
            }
        }

        let (plan_id, mut posts) = self.due_posts(brand, date).await?;
        if let Some(platforms) = &request.platforms {
            posts.retain(|p| platforms.contains(&p.platform));
            if posts.is_empty() {
                return Err(OrchestratorError::NoPostsScheduled { date });
            }
        }
        tracing::info!(brand, %date, posts = posts.len(), "posts due");

        let signals = self
            .signals
            .gather(self.store.as_ref(), brand, date)
            .await?;

        let mut state = OrchestratorState::new(date, brand, &plan_id);
        state.phase = RunPhase::Running;
        state.is_running = true;

        let ctx = RunContext {
            brand,
            date,
            dry_run: request.dry_run,
            signals: &signals,
        };
        let outcomes = self.process_all(&ctx, &posts).await?;

        let mut tally = Tally::new();
        for outcome in outcomes {
            tally.absorb(outcome, &mut state);
        }

        state.phase = RunPhase::Completed;
        state.is_running = false;
        state.last_execution = Utc::now();

        let persisted = if request.dry_run {
            self.remember_dry_run(slug, date);
            None
        } else {
            self.store.save_orchestrator_state(&state).await?;
            self.store
                .record_run(&RunRecord {
                    run_date: date,
                    brand_name: brand.to_string(),
                    attempted: tally.stats.attempted,
                    succeeded: tally.stats.succeeded,
                    failed: tally.stats.failed,
                    skipped: tally.stats.skipped,
                    errors: tally.errors.clone(),
                    executed_at: state.last_execution,
                })
                .await?;
            Some(state)
        };

        tracing::info!(
            brand,
            %date,
            attempted = tally.stats.attempted,
            succeeded = tally.stats.succeeded,
            failed = tally.stats.failed,
            skipped = tally.stats.skipped,
            dry_run = request.dry_run,
            "daily execution complete"
        );

        Ok(RunSummary {
            success: tally.stats.failed == 0,
            brand: brand.to_string(),
            date,
            phase: RunPhase::Completed,
            dry_run: request.dry_run,
            message: None,
            stats: tally.stats,
            errors: tally.errors,
            duplicate_content: tally.duplicates,
            results: tally.results,
            state: persisted,
        })
    }

    /// Re-run the single `(date, platform)` post of a brand's plan, outside
    /// the run-level gate, and fold the outcome into that day's state. The
    /// run record is updated only when the day has already run, so a retry
    /// never stands in for the daily run. A platform already posted for the
    /// date is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NoActivePlan`],
    /// [`OrchestratorError::NoPostForPlatform`] or
    /// [`OrchestratorError::Storage`].
    pub async fn retry_post(
        &self,
        brand: &str,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<RunSummary, OrchestratorError> {
        let (plan_id, posts) = match self.due_posts(brand, date).await {
            Err(OrchestratorError::NoPostsScheduled { date }) => {
                return Err(OrchestratorError::NoPostForPlatform { date, platform })
            }
            other => other?,
        };
        let post = posts
            .into_iter()
            .find(|p| p.platform == platform)
            .ok_or(OrchestratorError::NoPostForPlatform { date, platform })?;

        tracing::info!(brand, %date, %platform, "retrying post");

        let signals = self
            .signals
            .gather(self.store.as_ref(), brand, date)
            .await?;
        let ctx = RunContext {
            brand,
            date,
            dry_run: false,
            signals: &signals,
        };
        let outcome = self.process_post(&ctx, &post).await?;

        let mut state = self
            .store
            .get_orchestrator_state(date)
            .await?
            .unwrap_or_else(|| OrchestratorState::new(date, brand, &plan_id));
        let previously_failed = state.failed_posts.iter().any(|f| f.platform == platform);
        if !matches!(outcome, PostOutcome::Skipped { .. }) {
            state.failed_posts.retain(|f| f.platform != platform);
            state
                .posts_scheduled_today
                .retain(|p| p.platform != platform);
        }

        let mut tally = Tally::new();
        tally.absorb(outcome, &mut state);
        state.phase = RunPhase::Completed;
        state.is_running = false;
        state.last_execution = Utc::now();
        self.store.save_orchestrator_state(&state).await?;

        // Only fold into a day that has already run; creating the record here
        // would close the run-level gate on the remaining platforms.
        if let Some(mut run) = self.store.get_run(date).await? {
            let prefix = format!("{platform}: ");
            if previously_failed {
                run.failed = run.failed.saturating_sub(1);
                run.errors.retain(|e| !e.starts_with(&prefix));
            } else if tally.stats.skipped == 0 {
                run.attempted += 1;
            }
            run.succeeded += tally.stats.succeeded;
            run.failed += tally.stats.failed;
            run.errors.extend(tally.errors.iter().cloned());
            run.executed_at = state.last_execution;
            self.store.record_run(&run).await?;
        } else {
            tracing::info!(
                brand,
                %date,
                %platform,
                "day has not run yet; leaving the run record to execute_daily"
            );
        }

        Ok(RunSummary {
            success: tally.stats.failed == 0,
            brand: brand.to_string(),
            date,
            phase: RunPhase::Completed,
            dry_run: false,
            message: None,
            stats: tally.stats,
            errors: tally.errors,
            duplicate_content: tally.duplicates,
            results: tally.results,
            state: Some(state),
        })
    }

    /// Process every due post and return outcomes in calendar order.
    ///
    /// With `max_concurrent_platforms > 1`, platforms run concurrently while
    /// each platform's posts stay sequential, so writes for one
    /// `(date, platform)` key never overlap.
    async fn process_all(
        &self,
        ctx: &RunContext<'_>,
        posts: &[DailyPost],
    ) -> Result<Vec<PostOutcome>, OrchestratorError> {
        let concurrency = self.settings.max_concurrent_platforms;
        if concurrency <= 1 {
            let mut outcomes = Vec::with_capacity(posts.len());
            for post in posts {
                outcomes.push(self.process_post(ctx, post).await?);
            }
            return Ok(outcomes);
        }

        let mut groups: BTreeMap<Platform, Vec<(usize, &DailyPost)>> = BTreeMap::new();
        for (index, post) in posts.iter().enumerate() {
            groups.entry(post.platform).or_default().push((index, post));
        }

        let grouped: Vec<Vec<(usize, PostOutcome)>> = futures::stream::iter(groups.into_values())
            .map(|group| async move {
                let mut outcomes = Vec::with_capacity(group.len());
                for (index, post) in group {
                    outcomes.push((index, self.process_post(ctx, post).await?));
                }
                Ok::<_, OrchestratorError>(outcomes)
            })
            .boxed()
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;

        let mut flat: Vec<(usize, PostOutcome)> = grouped.into_iter().flatten().collect();
        flat.sort_by_key(|(index, _)| *index);
        Ok(flat.into_iter().map(|(_, outcome)| outcome).collect())
    }

    async fn process_post(
        &self,
        ctx: &RunContext<'_>,
        post: &DailyPost,
    ) -> Result<PostOutcome, OrchestratorError> {
        let platform = post.platform;

        if self.store.has_been_posted(ctx.date, platform).await? {
            tracing::info!(brand = ctx.brand, date = %ctx.date, %platform, "already posted, skipping");
            return Ok(PostOutcome::Skipped { platform });
        }

        let adapted = self.rules.adapt(post, ctx.signals);
        let package = build_package(
            ctx.brand,
            &adapted,
            ctx.signals,
            ctx.date,
            self.settings.max_retries,
        );
        let Attempt {
            package,
            outcome,
            fallback_actions,
        } = self.dispatch_with_retries(package, ctx.dry_run).await;
        let result = outcome.result;

        if result.success {
            tracing::info!(
                brand = ctx.brand,
                date = %ctx.date,
                %platform,
                post_id = result.post_id.as_deref().unwrap_or_default(),
                dry_run = ctx.dry_run,
                "post succeeded"
            );
            if ctx.dry_run {
                return Ok(PostOutcome::Succeeded {
                    package: Box::new(package),
                    result,
                    record: None,
                    duplicate: false,
                });
            }

            let generated = outcome
                .post
                .unwrap_or_else(|| rendered_from_plan(&package));
            let (record, duplicate) = self
                .record_success(ctx, &package, result.clone(), generated)
                .await?;
            return Ok(PostOutcome::Succeeded {
                package: Box::new(package),
                result,
                record: Some(Box::new(record)),
                duplicate,
            });
        }

        let error = result.error_message().to_string();
        tracing::error!(
            brand = ctx.brand,
            date = %ctx.date,
            %platform,
            error = %error,
            attempts = result.retry_count + 1,
            "post failed"
        );

        let mut actions = fallback_actions;
        actions.push(MANUAL_REVIEW.to_string());
        let failure = FailedPost {
            platform,
            error,
            timestamp: result.timestamp,
            attempts: result.retry_count + 1,
            fallback_actions: actions,
            status: if outcome.retryable {
                FailureStatus::ManualReview
            } else {
                FailureStatus::NotRetryable
            },
        };
        Ok(PostOutcome::Failed {
            package: Box::new(package),
            result,
            failure,
        })
    }

    /// Dispatch with up to `package.max_retries` re-attempts, applying the
    /// fallback before each. Each attempt is bounded by the dispatch timeout.
    async fn dispatch_with_retries(&self, mut package: ContentPackage, dry_run: bool) -> Attempt {
        let mut fallback_actions = Vec::new();
        let mut retries = 0u32;

        loop {
            let mut outcome = match tokio::time::timeout(
                self.settings.dispatch_timeout,
                self.channels.dispatch(&package, dry_run),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => DispatchOutcome {
                    result: PostingResult::failed(
                        package.platform,
                        format!(
                            "dispatch timed out after {}s",
                            self.settings.dispatch_timeout.as_secs()
                        ),
                    ),
                    post: None,
                    retryable: true,
                },
            };
            outcome.result.retry_count = retries;

            if outcome.result.success || !outcome.retryable || retries >= package.max_retries {
                return Attempt {
                    package,
                    outcome,
                    fallback_actions,
                };
            }

            let actions = apply_fallback(&mut package, outcome.result.error_message());
            retries += 1;
            let delay = backoff_delay(retries, self.settings.retry_backoff_base_ms);
            tracing::warn!(
                platform = %package.platform,
                attempt = retries,
                max_retries = package.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = outcome.result.error_message(),
                fallback = ?actions,
                "dispatch failed; retrying after back-off"
            );
            fallback_actions.extend(actions);
            tokio::time::sleep(delay).await;
        }
    }

    async fn record_success(
        &self,
        ctx: &RunContext<'_>,
        package: &ContentPackage,
        result: PostingResult,
        generated: GeneratedPost,
    ) -> Result<(PostRecord, bool), OrchestratorError> {
        let platform = package.platform;
        let hash = self.store.content_hash(&generated.fingerprint_text());
        let duplicate = self
            .store
            .is_duplicate_content(&hash, ctx.date, platform)
            .await?;
        if duplicate {
            tracing::warn!(brand = ctx.brand, date = %ctx.date, %platform, "duplicate content published");
        }

        let now = Utc::now();
        let record = PostRecord {
            id: format!(
                "post_{}_{platform}_{}",
                ctx.date.format("%Y-%m-%d"),
                now.format("%H%M%S%6f")
            ),
            brand_name: ctx.brand.to_string(),
            date: ctx.date,
            platform,
            post_id: result.post_id.clone().unwrap_or_default(),
            content_hash: hash,
            posting_result: result,
            generated_post: generated,
            recorded_at: now,
        };
        self.store.record_post(&record).await?;
        Ok((record, duplicate))
    }
}

/// Plain rendering of the planned post, for channels that report success
/// without returning their text.
fn rendered_from_plan(package: &ContentPackage) -> GeneratedPost {
    let post = &package.base_content;
    GeneratedPost::new(
        package.platform,
        format!("{}\n\n{}", post.topic, post.key_message),
        Vec::new(),
    )
}
