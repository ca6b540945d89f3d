//! Test doubles: an in-memory store that counts writes, and scripted channels.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cadence_channels::{Channel, ContentGenerator, DispatchTable, Publisher, TemplateGenerator};
use cadence_core::{
    brands::slugify, Calendar, CleanupStats, ContentPillar, CtaType, DailyPost,
    EditorialGuidelines, GeneratedPost, MonthlyPlan, OrchestratorState, PerformanceMetrics,
    Platform, PostFormat, PostRecord, PostVariation, PostingResult, RunRecord, SignalFeed,
    StorageError, Store, StoredPlan,
};
use cadence_orchestrator::{EngineSettings, Orchestrator};
use chrono::{NaiveDate, Utc};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn post(day: NaiveDate, platform: Platform, pillar: ContentPillar, topic: &str) -> DailyPost {
    DailyPost {
        date: day,
        platform,
        pillar,
        topic: topic.to_string(),
        key_message: format!("Why {topic} matters"),
        variation: PostVariation {
            angle: "educational".to_string(),
            hook_style: "question".to_string(),
            cta_type: CtaType::Demo,
            format: PostFormat::Text,
        },
        hashtags_count: 3,
        image_required: false,
        dependencies: Vec::new(),
        adaptations: BTreeSet::new(),
    }
}

pub fn plan(brand: &str, posts: Vec<DailyPost>) -> MonthlyPlan {
    let start = posts.iter().map(|p| p.date).min().unwrap();
    let end = posts.iter().map(|p| p.date).max().unwrap();
    MonthlyPlan {
        campaign_name: format!("{brand} campaign"),
        brand_name: brand.to_string(),
        positioning: "p".to_string(),
        target_audience: "a".to_string(),
        value_propositions: vec![],
        content_pillars: ContentPillar::ALL.to_vec(),
        editorial_guidelines: EditorialGuidelines {
            tone: "professional".to_string(),
            do_list: vec![],
            dont_list: vec![],
            language: "en-US".to_string(),
            brand_voice_attributes: vec![],
        },
        calendar: Calendar::from_posts(start, end, posts),
        variation_rules: BTreeMap::new(),
        cta_targets: vec![CtaType::Demo],
        created_at: Utc::now(),
        version: "1.0".to_string(),
        startup_name: None,
        startup_url: None,
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    plans: Vec<StoredPlan>,
    posts: Vec<PostRecord>,
    metrics: Vec<PerformanceMetrics>,
    states: BTreeMap<NaiveDate, OrchestratorState>,
    runs: BTreeMap<NaiveDate, RunRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    pub record_post_calls: AtomicUsize,
    pub save_state_calls: AtomicUsize,
    pub record_run_calls: AtomicUsize,
    /// When set, every write fails.
    pub fail_writes: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn writes(&self) -> usize {
        self.record_post_calls.load(Ordering::SeqCst)
            + self.save_state_calls.load(Ordering::SeqCst)
            + self.record_run_calls.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<PostRecord> {
        self.inner.lock().unwrap().posts.clone()
    }

    pub fn insert_record(&self, record: PostRecord) {
        self.inner.lock().unwrap().posts.push(record);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Backend("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_plan(&self, plan: &MonthlyPlan) -> Result<String, StorageError> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        let slug = plan.brand_slug();
        for stored in &mut inner.plans {
            if stored.plan.brand_slug() == slug {
                stored.is_active = false;
            }
        }
        let id = format!("plan_{slug}_{}", inner.plans.len());
        inner.plans.push(StoredPlan {
            id: id.clone(),
            is_active: true,
            saved_at: Utc::now(),
            plan: plan.clone(),
        });
        Ok(id)
    }

    async fn get_active_plan(&self, brand: &str) -> Result<Option<StoredPlan>, StorageError> {
        let slug = slugify(brand);
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .plans
            .iter()
            .rev()
            .find(|p| p.is_active && p.plan.brand_slug() == slug)
            .cloned())
    }

    async fn has_been_posted(&self, date: NaiveDate, platform: Platform) -> Result<bool, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .posts
            .iter()
            .any(|r| r.date == date && r.platform == platform && r.posting_result.success))
    }

    async fn is_duplicate_content(
        &self,
        hash: &str,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<bool, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .posts
            .iter()
            .any(|r| r.content_hash == hash && (r.date, r.platform) != (date, platform)))
    }

    async fn record_post(&self, record: &PostRecord) -> Result<(), StorageError> {
        self.record_post_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        if !inner.posts.iter().any(|r| r.id == record.id) {
            inner.posts.push(record.clone());
        }
        Ok(())
    }

    async fn get_posted_content(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        platform: Option<Platform>,
    ) -> Result<Vec<PostRecord>, StorageError> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<PostRecord> = inner
            .posts
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .filter(|r| platform.is_none_or(|p| r.platform == p))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(out)
    }

    async fn save_metrics(&self, metrics: &PerformanceMetrics) -> Result<(), StorageError> {
        self.inner.lock().unwrap().metrics.push(metrics.clone());
        Ok(())
    }

    async fn get_metrics(&self, post_id: &str) -> Result<Vec<PerformanceMetrics>, StorageError> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<PerformanceMetrics> = inner
            .metrics
            .iter()
            .filter(|m| m.post_id == post_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.measured_at.cmp(&a.measured_at));
        Ok(out)
    }

    async fn save_orchestrator_state(&self, state: &OrchestratorState) -> Result<(), StorageError> {
        self.save_state_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.inner
            .lock()
            .unwrap()
            .states
            .insert(state.current_date, state.clone());
        Ok(())
    }

    async fn get_orchestrator_state(
        &self,
        date: NaiveDate,
    ) -> Result<Option<OrchestratorState>, StorageError> {
        Ok(self.inner.lock().unwrap().states.get(&date).cloned())
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StorageError> {
        self.record_run_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.inner.lock().unwrap().runs.insert(run.run_date, run.clone());
        Ok(())
    }

    async fn get_run(&self, date: NaiveDate) -> Result<Option<RunRecord>, StorageError> {
        Ok(self.inner.lock().unwrap().runs.get(&date).cloned())
    }

    async fn cleanup_before(&self, cutoff: NaiveDate) -> Result<CleanupStats, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.posts.len();
        inner.posts.retain(|r| r.date >= cutoff);
        Ok(CleanupStats {
            posts_deleted: (before - inner.posts.len()) as u64,
            ..CleanupStats::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted channels
// ---------------------------------------------------------------------------

/// Publisher that replays scripted outcomes, then succeeds.
pub struct ScriptedPublisher {
    platform: Platform,
    script: Mutex<VecDeque<Result<(), String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedPublisher {
    pub fn ok(platform: Platform) -> Arc<Self> {
        Self::with_script(platform, Vec::new())
    }

    pub fn with_script(platform: Platform, script: Vec<Result<(), String>>) -> Arc<Self> {
        Arc::new(Self {
            platform,
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(&self, post: &GeneratedPost) -> PostingResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Err(e)) => PostingResult::failed(self.platform, e),
            _ => PostingResult::succeeded(
                self.platform,
                format!("{}-{n}-{}", self.platform, post.content.len()),
                None,
            ),
        }
    }
}

pub fn table(publishers: &[Arc<ScriptedPublisher>]) -> DispatchTable {
    let generator: Arc<dyn ContentGenerator> = Arc::new(TemplateGenerator);
    let mut table = DispatchTable::new();
    for publisher in publishers {
        table.register(
            publisher.platform,
            Channel::new(Arc::clone(&generator), Arc::clone(publisher) as Arc<dyn Publisher>),
        );
    }
    table
}

pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        retry_backoff_base_ms: 0,
        ..EngineSettings::default()
    }
}

pub fn quiet_feed() -> SignalFeed {
    SignalFeed {
        trending_topics: vec![],
        competitor_activity: vec![],
        news_items: vec![],
        competitor_keywords: vec!["matching".to_string()],
    }
}

pub fn orchestrator(store: Arc<MemoryStore>, table: DispatchTable) -> Orchestrator {
    Orchestrator::new(store, table, SignalFeed::default(), fast_settings())
}
