//! Behaviour of `Orchestrator::execute_daily` against an in-memory store.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadence_channels::{Channel, DispatchTable, Publisher, TemplateGenerator};
use cadence_core::{
    content_hash, ContentPillar, FailureStatus, GeneratedPost, PerformanceMetrics, Platform,
    PostRecord, PostingResult, RunPhase, Store,
};
use cadence_orchestrator::{
    DailyRunRequest, EngineSettings, Orchestrator, OrchestratorError, ALREADY_EXECUTED,
};
use chrono::{TimeZone, Utc};
use support::{date, orchestrator, plan, post, table, MemoryStore, ScriptedPublisher};

async fn store_with(posts: Vec<cadence_core::DailyPost>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::default());
    store.save_plan(&plan("Acme", posts)).await.unwrap();
    store
}

fn posted(day: chrono::NaiveDate, platform: Platform) -> PostRecord {
    let text = format!("earlier {platform}");
    PostRecord {
        id: format!("pre_{platform}"),
        brand_name: "Acme".to_string(),
        date: day,
        platform,
        post_id: format!("pre-{platform}"),
        content_hash: content_hash(&text),
        posting_result: PostingResult::succeeded(platform, format!("pre-{platform}"), None),
        generated_post: GeneratedPost::new(platform, text, vec![]),
        recorded_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dry_run_example_then_already_executed() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::LinkedIn, ContentPillar::Product, "AI matching")]).await;
    let linkedin = ScriptedPublisher::ok(Platform::LinkedIn);
    let engine = orchestrator(Arc::clone(&store), table(&[Arc::clone(&linkedin)]));

    let request = DailyRunRequest::new("Acme").on(day).dry_run(true);
    let first = engine.execute_daily(&request).await.unwrap();
    assert!(first.success);
    assert_eq!(first.stats.attempted, 1);
    assert_eq!(first.stats.succeeded, 1);
    assert_eq!(first.stats.failed, 0);
    assert_eq!(
        first.results[0].post_id.as_deref(),
        Some("dry_run_linkedin_2024-01-15")
    );
    assert!(first.state.is_none());

    let second = engine.execute_daily(&request).await.unwrap();
    assert!(!second.success);
    assert_eq!(second.message.as_deref(), Some(ALREADY_EXECUTED));
    assert_eq!(second.phase, RunPhase::Skipped);

    assert_eq!(store.writes(), 0);
    assert_eq!(linkedin.calls(), 0);
}

#[tokio::test]
async fn second_live_run_is_rejected_without_new_records() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "Warm intros"),
        post(day, Platform::Twitter, ContentPillar::Education, "Warm intros"),
    ])
    .await;
    let engine = orchestrator(
        Arc::clone(&store),
        table(&[ScriptedPublisher::ok(Platform::LinkedIn), ScriptedPublisher::ok(Platform::Twitter)]),
    );
    let request = DailyRunRequest::new("Acme").on(day);

    let first = engine.execute_daily(&request).await.unwrap();
    assert!(first.success);
    assert_eq!(store.records().len(), 2);
    let state = first.state.expect("live runs return state");
    assert_eq!(state.phase, RunPhase::Completed);
    assert!(!state.is_running);
    assert_eq!(state.posts_completed_today.len(), 2);

    let second = engine.execute_daily(&request).await.unwrap();
    assert!(!second.success);
    assert_eq!(second.message.as_deref(), Some(ALREADY_EXECUTED));
    assert_eq!(store.records().len(), 2);
    assert_eq!(store.record_post_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn force_rerun_still_skips_posted_platforms() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "Warm intros"),
        post(day, Platform::Twitter, ContentPillar::Education, "Warm intros"),
    ])
    .await;
    store.insert_record(posted(day, Platform::LinkedIn));
    let linkedin = ScriptedPublisher::ok(Platform::LinkedIn);
    let twitter = ScriptedPublisher::ok(Platform::Twitter);
    let engine = orchestrator(
        Arc::clone(&store),
        table(&[Arc::clone(&linkedin), Arc::clone(&twitter)]),
    );

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day).force(true))
        .await
        .unwrap();

    assert_eq!(summary.stats.skipped, 1);
    assert_eq!(summary.stats.succeeded, 1);
    assert_eq!(linkedin.calls(), 0);
    assert_eq!(twitter.calls(), 1);
    let linkedin_records = store
        .records()
        .into_iter()
        .filter(|r| r.date == day && r.platform == Platform::LinkedIn)
        .count();
    assert_eq!(linkedin_records, 1);
}

#[tokio::test]
async fn dry_run_never_writes_or_publishes() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "a"),
        post(day, Platform::Facebook, ContentPillar::Community, "b"),
        post(day, Platform::Twitter, ContentPillar::Product, "c"),
    ])
    .await;
    let publishers = [
        ScriptedPublisher::ok(Platform::LinkedIn),
        ScriptedPublisher::ok(Platform::Facebook),
        ScriptedPublisher::ok(Platform::Twitter),
    ];
    let engine = orchestrator(Arc::clone(&store), table(&publishers));

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day).dry_run(true).force(true))
        .await
        .unwrap();

    assert_eq!(summary.stats.succeeded, 3);
    assert_eq!(store.writes(), 0);
    assert!(publishers.iter().all(|p| p.calls() == 0));
}

#[tokio::test]
async fn dry_run_does_not_gate_a_live_run() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::Twitter, ContentPillar::Education, "a")]).await;
    let engine = orchestrator(Arc::clone(&store), table(&[ScriptedPublisher::ok(Platform::Twitter)]));

    engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day).dry_run(true))
        .await
        .unwrap();
    let live = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();
    assert!(live.success);
    assert_eq!(live.stats.succeeded, 1);
}

// ---------------------------------------------------------------------------
// Fatal preconditions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_plan_is_fatal_and_writes_nothing() {
    let store = Arc::new(MemoryStore::default());
    let engine = orchestrator(Arc::clone(&store), table(&[]));

    let err = engine
        .execute_daily(&DailyRunRequest::new("Nobody").on(date(2024, 1, 15)))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NoActivePlan { .. }));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn date_without_posts_is_fatal() {
    let store = store_with(vec![post(date(2024, 1, 15), Platform::Twitter, ContentPillar::Education, "a")]).await;
    let engine = orchestrator(Arc::clone(&store), table(&[]));

    let err = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(date(2024, 1, 16)))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NoPostsScheduled { .. }));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn storage_failure_propagates() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::Twitter, ContentPillar::Education, "a")]).await;
    store.fail_writes.store(true, Ordering::SeqCst);
    let engine = orchestrator(Arc::clone(&store), table(&[ScriptedPublisher::ok(Platform::Twitter)]));

    let err = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Storage(_)));
}

// ---------------------------------------------------------------------------
// Counting, retries, fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn counters_add_up_across_outcomes() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "a"),
        post(day, Platform::Facebook, ContentPillar::Community, "b"),
        post(day, Platform::Twitter, ContentPillar::Education, "c"),
    ])
    .await;
    store.insert_record(posted(day, Platform::Twitter));
    let facebook = ScriptedPublisher::with_script(
        Platform::Facebook,
        vec![Err("token expired".to_string()); 4],
    );
    let engine = orchestrator(
        Arc::clone(&store),
        table(&[
            ScriptedPublisher::ok(Platform::LinkedIn),
            Arc::clone(&facebook),
            ScriptedPublisher::ok(Platform::Twitter),
        ]),
    );

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();

    let stats = summary.stats;
    assert_eq!(stats.attempted, 3);
    assert_eq!(stats.attempted, stats.succeeded + stats.failed + stats.skipped);
    assert_eq!((stats.succeeded, stats.failed, stats.skipped), (1, 1, 1));
    assert!(!summary.success);
    assert_eq!(summary.errors, vec!["facebook: token expired".to_string()]);
    assert_eq!(facebook.calls(), 4);

    let state = summary.state.unwrap();
    let failure = &state.failed_posts[0];
    assert_eq!(failure.attempts, 4);
    assert_eq!(failure.status, FailureStatus::ManualReview);
    assert_eq!(
        failure.fallback_actions.last().map(String::as_str),
        Some("Scheduled for manual review")
    );

    let run = store.get_run(day).await.unwrap().unwrap();
    assert_eq!((run.attempted, run.succeeded, run.failed, run.skipped), (3, 1, 1, 1));
    assert_eq!(run.errors, summary.errors);
}

#[tokio::test]
async fn transient_failure_recovers_within_the_run() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::Facebook, ContentPillar::Education, "a")]).await;
    let facebook = ScriptedPublisher::with_script(
        Platform::Facebook,
        vec![Err("503".to_string()), Err("503".to_string())],
    );
    let engine = orchestrator(Arc::clone(&store), table(&[Arc::clone(&facebook)]));

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(facebook.calls(), 3);
    assert_eq!(summary.results[0].retry_count, 2);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn product_post_falls_back_to_education_on_retry() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::LinkedIn, ContentPillar::Product, "Launch")]).await;
    let linkedin = ScriptedPublisher::with_script(Platform::LinkedIn, vec![Err("500".to_string())]);
    let engine = orchestrator(Arc::clone(&store), table(&[linkedin]));

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();

    assert!(summary.success);
    let state = summary.state.unwrap();
    assert_eq!(
        state.posts_scheduled_today[0].base_content.pillar,
        ContentPillar::Education
    );
}

#[tokio::test]
async fn unknown_platform_is_a_per_post_failure() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "a"),
        post(day, Platform::Facebook, ContentPillar::Education, "b"),
    ])
    .await;
    let engine = orchestrator(Arc::clone(&store), table(&[ScriptedPublisher::ok(Platform::LinkedIn)]));

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();

    assert_eq!(summary.stats.succeeded, 1);
    assert_eq!(summary.stats.failed, 1);
    let state = summary.state.unwrap();
    assert_eq!(state.failed_posts[0].attempts, 1);
    assert_eq!(state.failed_posts[0].status, FailureStatus::NotRetryable);
}

struct SlowPublisher;

#[async_trait]
impl Publisher for SlowPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&self, _post: &GeneratedPost) -> PostingResult {
        tokio::time::sleep(Duration::from_secs(5)).await;
        PostingResult::succeeded(Platform::Twitter, "late", None)
    }
}

#[tokio::test]
async fn timeout_counts_as_dispatch_failure() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::Twitter, ContentPillar::Education, "a")]).await;
    let mut table = DispatchTable::new();
    table.register(
        Platform::Twitter,
        Channel::new(Arc::new(TemplateGenerator), Arc::new(SlowPublisher)),
    );
    let settings = EngineSettings {
        max_retries: 0,
        dispatch_timeout: Duration::from_millis(50),
        ..support::fast_settings()
    };
    let engine = Orchestrator::new(store, table, support::quiet_feed(), settings);

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();

    assert_eq!(summary.stats.failed, 1);
    assert!(summary.errors[0].contains("timed out"));
}

// ---------------------------------------------------------------------------
// Filters, fan-out, signals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn platform_filter_limits_the_run() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "a"),
        post(day, Platform::Twitter, ContentPillar::Education, "b"),
    ])
    .await;
    let linkedin = ScriptedPublisher::ok(Platform::LinkedIn);
    let engine = orchestrator(
        Arc::clone(&store),
        table(&[Arc::clone(&linkedin), ScriptedPublisher::ok(Platform::Twitter)]),
    );

    let summary = engine
        .execute_daily(
            &DailyRunRequest::new("Acme")
                .on(day)
                .platforms(vec![Platform::Twitter]),
        )
        .await
        .unwrap();

    assert_eq!(summary.stats.attempted, 1);
    assert_eq!(linkedin.calls(), 0);
}

#[tokio::test]
async fn filter_matching_nothing_is_fatal_and_leaves_the_day_open() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::LinkedIn, ContentPillar::Education, "a")]).await;
    let linkedin = ScriptedPublisher::ok(Platform::LinkedIn);
    let engine = orchestrator(Arc::clone(&store), table(&[Arc::clone(&linkedin)]));

    let err = engine
        .execute_daily(
            &DailyRunRequest::new("Acme")
                .on(day)
                .platforms(vec![Platform::Facebook]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NoPostsScheduled { date } if date == day));
    assert_eq!(store.writes(), 0);

    let full = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();
    assert!(full.message.is_none());
    assert_eq!(full.stats.succeeded, 1);
    assert_eq!(linkedin.calls(), 1);
}

#[tokio::test]
async fn concurrent_platforms_keep_calendar_order() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::Twitter, ContentPillar::Education, "a"),
        post(day, Platform::LinkedIn, ContentPillar::Education, "b"),
        post(day, Platform::Facebook, ContentPillar::Education, "c"),
    ])
    .await;
    let settings = EngineSettings {
        max_concurrent_platforms: 3,
        ..support::fast_settings()
    };
    let engine = Orchestrator::new(
        Arc::clone(&store) as Arc<dyn Store>,
        table(&[
            ScriptedPublisher::ok(Platform::LinkedIn),
            ScriptedPublisher::ok(Platform::Facebook),
            ScriptedPublisher::ok(Platform::Twitter),
        ]),
        support::quiet_feed(),
        settings,
    );

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();

    let order: Vec<Platform> = summary.results.iter().map(|r| r.platform).collect();
    assert_eq!(order, vec![Platform::Twitter, Platform::LinkedIn, Platform::Facebook]);
    assert_eq!(store.records().len(), 3);
}

#[tokio::test]
async fn strong_yesterday_adds_continuity_framing() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::LinkedIn, ContentPillar::Education, "a")]).await;
    store.insert_record(posted(date(2024, 1, 14), Platform::Facebook));
    store
        .save_metrics(&PerformanceMetrics {
            post_id: "pre-facebook".to_string(),
            platform: Platform::Facebook,
            impressions: 100,
            engagements: 10,
            clicks: 0,
            shares: 0,
            comments: 0,
            likes: 0,
            engagement_rate: 10.0,
            measured_at: Utc.with_ymd_and_hms(2024, 1, 14, 20, 0, 0).unwrap(),
        })
        .await
        .unwrap();
    let engine = orchestrator(Arc::clone(&store), table(&[ScriptedPublisher::ok(Platform::LinkedIn)]));

    let summary = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();

    let package = &summary.state.unwrap().posts_scheduled_today[0];
    assert!(package
        .base_content
        .key_message
        .starts_with("Building on yesterday's discussion: "));
    assert!((package.signals.yesterday_performance.average_engagement_rate - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_copy_is_flagged_but_posted() {
    let first = date(2024, 1, 15);
    let second = date(2024, 1, 16);
    let store = store_with(vec![
        post(first, Platform::LinkedIn, ContentPillar::Education, "Same words"),
        post(second, Platform::LinkedIn, ContentPillar::Education, "Same words"),
    ])
    .await;
    let engine = orchestrator(Arc::clone(&store), table(&[ScriptedPublisher::ok(Platform::LinkedIn)]));

    let day_one = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(first))
        .await
        .unwrap();
    assert!(day_one.duplicate_content.is_empty());

    let day_two = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(second))
        .await
        .unwrap();
    assert!(day_two.success);
    assert_eq!(day_two.duplicate_content, vec![Platform::LinkedIn]);
    assert_eq!(store.records().len(), 2);
}

// ---------------------------------------------------------------------------
// Status and manual retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_reflects_stored_state_and_latest_metrics() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::LinkedIn, ContentPillar::Education, "a")]).await;
    let engine = orchestrator(Arc::clone(&store), table(&[ScriptedPublisher::ok(Platform::LinkedIn)]));

    let before = engine.get_execution_status("Acme", Some(day)).await.unwrap();
    assert!(!before.has_run);
    assert!(before.last_execution.is_none());

    engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();
    let record = store.records().remove(0);
    for (hour, impressions) in [(10, 50), (18, 500)] {
        store
            .save_metrics(&PerformanceMetrics {
                post_id: record.post_id.clone(),
                platform: Platform::LinkedIn,
                impressions,
                engagements: 5,
                clicks: 0,
                shares: 0,
                comments: 0,
                likes: 0,
                engagement_rate: 1.0,
                measured_at: Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap(),
            })
            .await
            .unwrap();
    }

    let status = engine.get_execution_status("Acme", Some(day)).await.unwrap();
    assert!(status.has_run);
    assert!(!status.is_running);
    assert_eq!(status.posts_completed, 1);
    assert_eq!(status.posts_failed, 0);
    assert_eq!(status.metrics[&Platform::LinkedIn].impressions, 500);
    assert!(status.last_execution.is_some());
}

#[tokio::test]
async fn manual_retry_clears_the_failure() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "a"),
        post(day, Platform::Facebook, ContentPillar::Education, "b"),
    ])
    .await;
    let facebook = ScriptedPublisher::with_script(Platform::Facebook, vec![Err("down".to_string())]);
    let settings = EngineSettings {
        max_retries: 0,
        ..support::fast_settings()
    };
    let engine = Orchestrator::new(
        Arc::clone(&store) as Arc<dyn Store>,
        table(&[ScriptedPublisher::ok(Platform::LinkedIn), Arc::clone(&facebook)]),
        support::quiet_feed(),
        settings,
    );

    let run = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();
    assert_eq!(run.stats.failed, 1);

    let retried = engine.retry_post("Acme", day, Platform::Facebook).await.unwrap();
    assert!(retried.success);
    assert_eq!(retried.stats.succeeded, 1);

    let record = store.get_run(day).await.unwrap().unwrap();
    assert_eq!((record.attempted, record.succeeded, record.failed), (2, 2, 0));
    assert!(record.errors.is_empty());
    let state = store.get_orchestrator_state(day).await.unwrap().unwrap();
    assert!(state.failed_posts.is_empty());
    assert_eq!(state.posts_completed_today.len(), 2);

    let again = engine.retry_post("Acme", day, Platform::Facebook).await.unwrap();
    assert_eq!(again.stats.skipped, 1);
    assert_eq!(facebook.calls(), 2);
}

#[tokio::test]
async fn manual_retry_requires_a_scheduled_post() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![post(day, Platform::LinkedIn, ContentPillar::Education, "a")]).await;
    let engine = orchestrator(Arc::clone(&store), table(&[ScriptedPublisher::ok(Platform::LinkedIn)]));

    let err = engine
        .retry_post("Acme", day, Platform::Twitter)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NoPostForPlatform { .. }));
}

#[tokio::test]
async fn retry_before_the_daily_run_does_not_close_the_day() {
    let day = date(2024, 1, 15);
    let store = store_with(vec![
        post(day, Platform::LinkedIn, ContentPillar::Education, "a"),
        post(day, Platform::Facebook, ContentPillar::Education, "b"),
    ])
    .await;
    let linkedin = ScriptedPublisher::ok(Platform::LinkedIn);
    let facebook = ScriptedPublisher::ok(Platform::Facebook);
    let engine = orchestrator(
        Arc::clone(&store),
        table(&[Arc::clone(&linkedin), Arc::clone(&facebook)]),
    );

    let retried = engine.retry_post("Acme", day, Platform::Facebook).await.unwrap();
    assert_eq!(retried.stats.succeeded, 1);
    assert!(store.get_run(day).await.unwrap().is_none());
    assert!(!store.has_run_today(day).await.unwrap());

    let run = engine
        .execute_daily(&DailyRunRequest::new("Acme").on(day))
        .await
        .unwrap();
    assert!(run.success);
    assert!(run.message.is_none());
    assert_eq!(run.stats.succeeded, 1);
    assert_eq!(run.stats.skipped, 1);
    assert_eq!(linkedin.calls(), 1);
    assert_eq!(facebook.calls(), 1);

    let record = store.get_run(day).await.unwrap().unwrap();
    assert_eq!((record.attempted, record.succeeded, record.skipped), (2, 1, 1));
}
