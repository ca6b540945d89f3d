//! Live integration tests for `PgStore` using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/cadence-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::collections::{BTreeMap, BTreeSet};

use cadence_core::{
    content_hash, Calendar, ContentPillar, CtaType, DailyPost, EditorialGuidelines,
    GeneratedPost, MonthlyPlan, OrchestratorState, PerformanceMetrics, Platform, PostFormat,
    PostRecord, PostVariation, PostingResult, RunRecord, Store,
};
use cadence_db::PgStore;
use chrono::{NaiveDate, TimeZone, Utc};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn plan(brand: &str, start: NaiveDate) -> MonthlyPlan {
    let post = DailyPost {
        date: start,
        platform: Platform::Twitter,
        pillar: ContentPillar::Education,
        topic: "Sponsor outreach basics".to_string(),
        key_message: "Start with warm intros".to_string(),
        variation: PostVariation {
            angle: "educational".to_string(),
            hook_style: "statistic".to_string(),
            cta_type: CtaType::Newsletter,
            format: PostFormat::Text,
        },
        hashtags_count: 3,
        image_required: false,
        dependencies: Vec::new(),
        adaptations: BTreeSet::new(),
    };
    MonthlyPlan {
        campaign_name: "January".to_string(),
        brand_name: brand.to_string(),
        positioning: "p".to_string(),
        target_audience: "a".to_string(),
        value_propositions: vec![],
        content_pillars: vec![ContentPillar::Education],
        editorial_guidelines: EditorialGuidelines {
            tone: "professional".to_string(),
            do_list: vec![],
            dont_list: vec![],
            language: "en-US".to_string(),
            brand_voice_attributes: vec![],
        },
        calendar: Calendar::from_posts(start, start, vec![post]),
        variation_rules: BTreeMap::new(),
        cta_targets: vec![CtaType::Newsletter],
        created_at: Utc::now(),
        version: "1.0".to_string(),
        startup_name: None,
        startup_url: None,
    }
}

fn record(id: &str, day: NaiveDate, platform: Platform, text: &str) -> PostRecord {
    PostRecord {
        id: id.to_string(),
        brand_name: "Acme".to_string(),
        date: day,
        platform,
        post_id: format!("ext-{id}"),
        content_hash: content_hash(text),
        posting_result: PostingResult::succeeded(platform, format!("ext-{id}"), None),
        generated_post: GeneratedPost::new(platform, text.to_string(), vec![]),
        recorded_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn save_plan_keeps_exactly_one_active_plan(pool: sqlx::PgPool) {
    let store = PgStore::new(pool.clone());
    let mut last = String::new();
    for day in 1..=3 {
        last = store
            .save_plan(&plan("Acme", date(2024, 1, day)))
            .await
            .expect("save_plan failed");
    }

    let active_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM monthly_plans WHERE brand_slug = 'acme' AND is_active",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active_count, 1);

    let active = store.get_active_plan("Acme").await.unwrap().unwrap();
    assert_eq!(active.id, last);
    assert_eq!(active.plan.calendar.start_date, date(2024, 1, 3));
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn record_post_is_idempotent_and_gates_the_pair(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let day = date(2024, 1, 15);
    let rec = record("r1", day, Platform::LinkedIn, "copy");

    store.record_post(&rec).await.unwrap();
    store.record_post(&rec).await.unwrap();

    assert!(store.has_been_posted(day, Platform::LinkedIn).await.unwrap());
    assert!(!store.has_been_posted(day, Platform::Twitter).await.unwrap());
    assert_eq!(store.get_posted_content(day, day, None).await.unwrap().len(), 1);

    let hash = content_hash("copy");
    assert!(!store
        .is_duplicate_content(&hash, day, Platform::LinkedIn)
        .await
        .unwrap());
    assert!(store
        .is_duplicate_content(&hash, day, Platform::Twitter)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn yesterday_performance_from_latest_metrics(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    store
        .record_post(&record("1", date(2024, 1, 14), Platform::LinkedIn, "one"))
        .await
        .unwrap();
    for (hour, impressions, engagements) in [(8, 10, 1), (20, 200, 12)] {
        store
            .save_metrics(&PerformanceMetrics {
                post_id: "ext-1".to_string(),
                platform: Platform::LinkedIn,
                impressions,
                engagements,
                clicks: 0,
                shares: 0,
                comments: 0,
                likes: 0,
                engagement_rate: 0.0,
                measured_at: Utc.with_ymd_and_hms(2024, 1, 14, hour, 0, 0).unwrap(),
            })
            .await
            .unwrap();
    }

    let summary = store
        .get_yesterday_performance("Acme", date(2024, 1, 15))
        .await
        .unwrap();
    assert_eq!(summary.total_impressions, 200);
    assert!((summary.average_engagement_rate - 6.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Runs, state, retention
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn run_upsert_overwrites_counts(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let day = date(2024, 1, 15);
    let mut run = RunRecord {
        run_date: day,
        brand_name: "Acme".to_string(),
        attempted: 2,
        succeeded: 1,
        failed: 1,
        skipped: 0,
        errors: vec!["facebook: token expired".to_string()],
        executed_at: Utc::now(),
    };
    store.record_run(&run).await.unwrap();
    assert!(store.has_run_today(day).await.unwrap());

    run.succeeded = 2;
    run.failed = 0;
    run.errors.clear();
    store.record_run(&run).await.unwrap();

    let stored = store.get_run(day).await.unwrap().unwrap();
    assert_eq!(stored.succeeded, 2);
    assert_eq!(stored.failed, 0);
    assert!(stored.errors.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn state_snapshot_round_trips(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let day = date(2024, 1, 15);
    let state = OrchestratorState::new(day, "Acme", "plan_acme");
    store.save_orchestrator_state(&state).await.unwrap();

    let loaded = store.get_orchestrator_state(day).await.unwrap().unwrap();
    assert_eq!(loaded.brand_name, "Acme");
    assert_eq!(loaded.monthly_plan_id, "plan_acme");
}

#[sqlx::test(migrations = "../../migrations")]
async fn cleanup_deletes_rows_before_cutoff(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    store
        .record_post(&record("old", date(2023, 11, 1), Platform::Facebook, "old"))
        .await
        .unwrap();
    store
        .record_post(&record("new", date(2024, 1, 10), Platform::Facebook, "new"))
        .await
        .unwrap();

    let stats = store.cleanup_before(date(2024, 1, 1)).await.unwrap();
    assert_eq!(stats.posts_deleted, 1);
    assert_eq!(stats.files_deleted, 0);
}
